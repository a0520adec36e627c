//! Error types for lookups, status probes, and waiting sessions.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::status::{LabelSet, StateLabel};

/// Opaque error raised by a remote API client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while looking a resource up by identifier.
#[derive(Debug, Error)]
pub enum FindError {
    /// The listing was exhausted without a match, or the API reported a classified absence.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Any other failure talking to the remote API.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
}

impl FindError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A probe that could not classify the resource. Its implied state label is `Unknown`.
#[derive(Debug, Error)]
#[error("status probe failed: {source}")]
pub struct ProbeError {
    #[source]
    source: BoxError,
}

impl ProbeError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The label a failed probe reports.
    pub fn label(&self) -> StateLabel {
        StateLabel::unknown()
    }

    pub fn into_source(self) -> BoxError {
        self.source
    }
}

/// Rejected [`WaitSpec`](crate::WaitSpec) configurations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaitSpecError {
    #[error("states '{0}' are configured as both pending and target")]
    OverlappingStates(LabelSet),

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("poll delay must be greater than zero")]
    ZeroPollDelay,

    #[error("target_occurrences must be at least 1")]
    ZeroTargetOccurrences,

    #[error("absence states '{0}' cannot be pending while absence is treated as success")]
    PendingAbsence(LabelSet),

    #[error("an empty target needs at least one absence state to succeed on")]
    NoAbsenceLabels,
}

/// Coarse classification of a failed waiting session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Transport,
    UnexpectedState,
    Timeout,
    Cancelled,
}

/// Why a waiting session ended without reaching its target.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The probe failed; polling stopped after the first failure.
    #[error("error while waiting for state to become '{target}': {source}")]
    Transport {
        target: LabelSet,
        #[source]
        source: BoxError,
    },

    /// The probe reported a state in neither the pending nor the target set.
    #[error("unexpected state '{state}', wanted target '{target}'")]
    UnexpectedState { state: StateLabel, target: LabelSet },

    /// The deadline elapsed while the resource was still pending.
    #[error(
        "timeout while waiting for state to become '{target}' (last state: '{last_state}', timeout: {timeout:?})"
    )]
    Timeout {
        target: LabelSet,
        last_state: StateLabel,
        timeout: Duration,
    },

    /// The caller cancelled the session.
    #[error("cancelled while waiting for state to become '{target}' (last state: '{last_state}')")]
    Cancelled {
        target: LabelSet,
        last_state: StateLabel,
    },
}

impl WaitError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transport,
            Self::UnexpectedState { .. } => FailureKind::UnexpectedState,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Cancelled { .. } => FailureKind::Cancelled,
        }
    }

    /// Last state label observed before the session ended.
    pub fn last_state(&self) -> StateLabel {
        match self {
            Self::Transport { .. } => StateLabel::unknown(),
            Self::UnexpectedState { state, .. } => state.clone(),
            Self::Timeout { last_state, .. } | Self::Cancelled { last_state, .. } => {
                last_state.clone()
            }
        }
    }
}

/// A failed waiting session together with the last snapshot it fetched.
///
/// The snapshot is kept for diagnostics: on timeout it is the most recent
/// representation of a resource that never settled.
#[derive(Debug)]
pub struct WaitFailure<T> {
    pub error: WaitError,
    pub last: Option<T>,
}

impl<T> WaitFailure<T> {
    pub fn new(error: WaitError, last: Option<T>) -> Self {
        Self { error, last }
    }

    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }

    /// Drop the snapshot and keep only the error.
    pub fn into_error(self) -> WaitError {
        self.error
    }

    pub fn map_last<U>(self, f: impl FnOnce(T) -> U) -> WaitFailure<U> {
        WaitFailure {
            error: self.error,
            last: self.last.map(f),
        }
    }
}

impl<T> fmt::Display for WaitFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T: fmt::Debug> std::error::Error for WaitFailure<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}
