//! Error types for FSx waiters.

use aws_sdk_fsx::types::FileSystem;
use lifecycle_waiter_engine::{BatchFailure, FailureKind, WaitFailure, WaitSpecError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid wait specification: {0}")]
    Spec(#[from] WaitSpecError),

    /// A single waiting session failed.
    #[error(transparent)]
    Wait(Box<WaitFailure<FileSystem>>),

    /// At least one session of a batch (e.g. several aliases) failed.
    #[error(transparent)]
    Batch(Box<BatchFailure<String, FileSystem>>),
}

pub type FsxResult<T> = Result<T, FsxError>;

impl FsxError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Which of the waiter failure kinds ended the session, if a session ran at all.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Config(_) | Self::Spec(_) => None,
            Self::Wait(failure) => Some(failure.kind()),
            Self::Batch(failure) => Some(failure.error().kind()),
        }
    }

    /// The last file system snapshot fetched before the failure.
    pub fn last_file_system(&self) -> Option<&FileSystem> {
        match self {
            Self::Config(_) | Self::Spec(_) => None,
            Self::Wait(failure) => failure.last.as_ref(),
            Self::Batch(failure) => failure.failure.last.as_ref(),
        }
    }
}

impl From<WaitFailure<FileSystem>> for FsxError {
    fn from(failure: WaitFailure<FileSystem>) -> Self {
        Self::Wait(Box::new(failure))
    }
}

impl From<BatchFailure<String, FileSystem>> for FsxError {
    fn from(failure: BatchFailure<String, FileSystem>) -> Self {
        Self::Batch(Box::new(failure))
    }
}
