//! Concurrent waiting sessions joined all-or-nothing.

use std::fmt;
use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use log::warn;
use tokio_util::sync::CancellationToken;

use crate::error::{WaitError, WaitFailure};

/// What to do with the remaining sessions once one of them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnFailure {
    /// Cancel the rest; they end with [`WaitError::Cancelled`].
    #[default]
    CancelRemaining,
    /// Let the rest run to completion.
    LetFinish,
}

/// The first failure of a batch, plus how the other sessions ended.
#[derive(Debug)]
pub struct BatchFailure<K, T> {
    pub key: K,
    pub failure: WaitFailure<T>,
    pub succeeded: usize,
    pub failed: usize,
}

impl<K, T> BatchFailure<K, T> {
    pub fn error(&self) -> &WaitError {
        &self.failure.error
    }
}

impl<K: fmt::Debug, T> fmt::Display for BatchFailure<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} waits failed; first failure for {:?}: {}",
            self.failed,
            self.failed + self.succeeded,
            self.key,
            self.failure.error
        )
    }
}

impl<K: fmt::Debug, T: fmt::Debug> std::error::Error for BatchFailure<K, T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.failure.error)
    }
}

/// Run one waiting session per key concurrently and join all of them.
///
/// Every session receives a child of `parent`, so cancelling the parent aborts the
/// whole batch. Sessions are always drained before returning. On success the
/// outcomes are returned in key order; otherwise the first failure observed wins.
pub async fn wait_all<K, T, I, F, Fut>(
    keys: I,
    parent: &CancellationToken,
    on_failure: OnFailure,
    session: F,
) -> Result<Vec<(K, Option<T>)>, BatchFailure<K, T>>
where
    K: Clone + fmt::Debug,
    I: IntoIterator<Item = K>,
    F: Fn(K, CancellationToken) -> Fut,
    Fut: Future<Output = Result<Option<T>, WaitFailure<T>>>,
{
    let batch = parent.child_token();
    let mut sessions: FuturesUnordered<_> = keys
        .into_iter()
        .enumerate()
        .map(|(index, key)| {
            let running = session(key.clone(), batch.child_token());
            async move { (index, key, running.await) }
        })
        .collect();

    let mut settled = Vec::new();
    let mut first_failure: Option<(K, WaitFailure<T>)> = None;
    let mut failed = 0_usize;

    while let Some((index, key, outcome)) = sessions.next().await {
        match outcome {
            Ok(snapshot) => settled.push((index, key, snapshot)),
            Err(failure) => {
                failed += 1;
                if first_failure.is_none() {
                    warn!("wait for {key:?} failed: {failure}");
                    if on_failure == OnFailure::CancelRemaining {
                        batch.cancel();
                    }
                    first_failure = Some((key, failure));
                }
            }
        }
    }

    if let Some((key, failure)) = first_failure {
        return Err(BatchFailure {
            key,
            failure,
            succeeded: settled.len(),
            failed,
        });
    }

    settled.sort_by_key(|(index, _, _)| *index);
    Ok(settled
        .into_iter()
        .map(|(_, key, snapshot)| (key, snapshot))
        .collect())
}
