//! Eventual-consistency polling engine.
//!
//! Control flows waiter -> status probe -> finder -> remote API:
//! - [`finder`]: first-match point lookups over a paginated listing
//! - [`status`]: one fetch-and-classify cycle, normalizing absence and failures
//! - [`waiter`]: the state-change poller with deadline and cancellation
//! - [`batch`]: many independent sessions joined all-or-nothing
//!
//! The engine knows nothing about a particular cloud service; domain crates supply a
//! [`PageSource`] and a label extractor and receive the final snapshot.

pub mod batch;
mod error;
pub mod finder;
pub mod poll;
pub mod status;
pub mod waiter;

// Re-exports for a small, focused public API
pub use batch::{wait_all, BatchFailure, OnFailure};
pub use error::{
    BoxError, FailureKind, FindError, ProbeError, WaitError, WaitFailure, WaitSpecError,
};
pub use finder::{find_first, Lookup, Page, PageSource, PagedLookup};
pub use poll::PollPolicy;
pub use status::{
    classify, nested_label, LabelSet, LookupProbe, Observation, StateLabel, StatusProbe,
    NOT_FOUND, UNKNOWN,
};
pub use tokio_util::sync::CancellationToken;
pub use waiter::{wait_for_state, WaitSpec, WaitSpecBuilder};
