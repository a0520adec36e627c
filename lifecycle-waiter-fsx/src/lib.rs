//! Amazon FSx lifecycle waiters.
//!
//! Confirms that asynchronous FSx operations have settled: file system creation, update
//! and deletion, Windows DNS alias association and removal, and administrative actions.
//! Polling is done by [`lifecycle_waiter_engine`]; this crate supplies the
//! `DescribeFileSystems` lookup, the state labels, and the pending/target states of each
//! transition.

pub mod aws;
pub mod config;
mod error;
pub mod finder;
pub mod service;
pub mod status;
pub mod waiter;

#[cfg(test)]
mod test_utils;

// Re-exports for a small, focused public API
pub use aws::FileSystemApi;
pub use config::WaiterConfig;
pub use error::{FsxError, FsxResult};
pub use service::FsxWaiterService;
pub use status::ALIAS_NOT_FOUND;
