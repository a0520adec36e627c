//! State-change waiter: drives a [`StatusProbe`] until the resource settles.
//!
//! Each session evaluates one transition per probe:
//!
//! - probe error: fail with [`WaitError::Transport`];
//! - label in `target`: succeed with the returned snapshot;
//! - label in `pending`: sleep per the [`PollPolicy`] and probe again;
//! - absence label while `target` is empty and absence is treated as success: succeed;
//! - anything else: fail with [`WaitError::UnexpectedState`].
//!
//! The deadline is measured from session start, so slow probes count against it.
//! Cancellation is raced against every probe and every sleep.

use std::time::Duration;

use log::{debug, trace, warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{WaitError, WaitFailure, WaitSpecError};
use crate::poll::PollPolicy;
use crate::status::{LabelSet, StateLabel, StatusProbe};

/// Immutable configuration for one polling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    pending: LabelSet,
    target: LabelSet,
    timeout: Duration,
    poll: PollPolicy,
    treat_absence_as_success: bool,
    absence_labels: LabelSet,
    target_occurrences: u32,
}

impl WaitSpec {
    pub fn builder() -> WaitSpecBuilder {
        WaitSpecBuilder::default()
    }

    pub fn pending(&self) -> &LabelSet {
        &self.pending
    }

    pub fn target(&self) -> &LabelSet {
        &self.target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll(&self) -> PollPolicy {
        self.poll
    }

    pub fn treat_absence_as_success(&self) -> bool {
        self.treat_absence_as_success
    }

    pub fn absence_labels(&self) -> &LabelSet {
        &self.absence_labels
    }

    pub fn target_occurrences(&self) -> u32 {
        self.target_occurrences
    }

    /// Copy of this spec with a different deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Result<Self, WaitSpecError> {
        if timeout.is_zero() {
            return Err(WaitSpecError::ZeroTimeout);
        }
        Ok(Self {
            timeout,
            ..self.clone()
        })
    }

    fn transition(&self, label: &StateLabel) -> Transition {
        if self.target.contains(label) {
            Transition::Target
        } else if self.pending.contains(label) {
            Transition::Pending
        } else if self.target.is_empty()
            && self.treat_absence_as_success
            && self.absence_labels.contains(label)
        {
            Transition::Gone
        } else {
            Transition::Unexpected
        }
    }

    fn timed_out<T>(&self, last_state: StateLabel, last: Option<T>) -> WaitFailure<T> {
        warn!(
            "timed out after {:?} waiting for '{}' (last state '{last_state}')",
            self.timeout, self.target
        );
        WaitFailure::new(
            WaitError::Timeout {
                target: self.target.clone(),
                last_state,
                timeout: self.timeout,
            },
            last,
        )
    }

    fn cancelled<T>(&self, last_state: StateLabel, last: Option<T>) -> WaitFailure<T> {
        debug!("wait for '{}' cancelled (last state '{last_state}')", self.target);
        WaitFailure::new(
            WaitError::Cancelled {
                target: self.target.clone(),
                last_state,
            },
            last,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Target,
    Pending,
    Gone,
    Unexpected,
}

/// Builder for [`WaitSpec`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct WaitSpecBuilder {
    pending: LabelSet,
    target: LabelSet,
    timeout: Duration,
    poll: PollPolicy,
    treat_absence_as_success: bool,
    absence_labels: LabelSet,
    target_occurrences: u32,
}

impl Default for WaitSpecBuilder {
    fn default() -> Self {
        Self {
            pending: LabelSet::new(),
            target: LabelSet::new(),
            timeout: Duration::ZERO,
            poll: PollPolicy::default(),
            treat_absence_as_success: true,
            absence_labels: [StateLabel::not_found()].into_iter().collect(),
            target_occurrences: 1,
        }
    }
}

impl WaitSpecBuilder {
    pub fn pending<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<StateLabel>,
    {
        self.pending = labels.into_iter().collect();
        self
    }

    /// States that signal success. Leave empty to wait for the resource to disappear.
    pub fn target<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<StateLabel>,
    {
        self.target = labels.into_iter().collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Shorthand for a fixed delay between probes.
    pub fn poll_delay(self, delay: Duration) -> Self {
        self.poll(PollPolicy::fixed(delay))
    }

    /// Whether an absence label counts as success when `target` is empty (default `true`).
    pub fn treat_absence_as_success(mut self, enabled: bool) -> Self {
        self.treat_absence_as_success = enabled;
        self
    }

    /// Labels that mean "the resource is gone" (default: `NotFound`).
    pub fn absence_labels<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<StateLabel>,
    {
        self.absence_labels = labels.into_iter().collect();
        self
    }

    /// Consecutive target observations required before succeeding (default 1).
    pub fn target_occurrences(mut self, occurrences: u32) -> Self {
        self.target_occurrences = occurrences;
        self
    }

    pub fn build(self) -> Result<WaitSpec, WaitSpecError> {
        let overlap = self.pending.intersection(&self.target);
        if !overlap.is_empty() {
            return Err(WaitSpecError::OverlappingStates(overlap));
        }
        if self.timeout.is_zero() {
            return Err(WaitSpecError::ZeroTimeout);
        }
        if self.poll.delay_for(1).is_zero() {
            return Err(WaitSpecError::ZeroPollDelay);
        }
        if self.target_occurrences == 0 {
            return Err(WaitSpecError::ZeroTargetOccurrences);
        }
        if self.target.is_empty() && self.treat_absence_as_success {
            if self.absence_labels.is_empty() {
                return Err(WaitSpecError::NoAbsenceLabels);
            }
            let pending_absence = self.pending.intersection(&self.absence_labels);
            if !pending_absence.is_empty() {
                return Err(WaitSpecError::PendingAbsence(pending_absence));
            }
        }

        Ok(WaitSpec {
            pending: self.pending,
            target: self.target,
            timeout: self.timeout,
            poll: self.poll,
            treat_absence_as_success: self.treat_absence_as_success,
            absence_labels: self.absence_labels,
            target_occurrences: self.target_occurrences,
        })
    }
}

/// Poll `probe` until it reports a target state, the resource disappears (for
/// deletion waits), or the session fails.
///
/// Returns the snapshot that accompanied the settling observation; deletion waits
/// usually settle with `None`. Every failure carries the last fetched snapshot.
pub async fn wait_for_state<P>(
    probe: &P,
    spec: &WaitSpec,
    cancel: &CancellationToken,
) -> Result<Option<P::Snapshot>, WaitFailure<P::Snapshot>>
where
    P: StatusProbe + ?Sized,
{
    let deadline = Instant::now() + spec.timeout;
    let mut last: Option<P::Snapshot> = None;
    let mut last_state = StateLabel::unknown();
    let mut target_seen = 0_u32;
    let mut completed = 0_u32;

    debug!(
        "waiting up to {:?} for '{}' (pending '{}')",
        spec.timeout, spec.target, spec.pending
    );

    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(spec.cancelled(last_state, last)),
            outcome = tokio::time::timeout_at(deadline, probe.probe()) => outcome,
        };

        let observation = match outcome {
            Err(_elapsed) => return Err(spec.timed_out(last_state, last)),
            Ok(Err(probe_error)) => {
                warn!("probe failed while waiting for '{}': {probe_error}", spec.target);
                return Err(WaitFailure::new(
                    WaitError::Transport {
                        target: spec.target.clone(),
                        source: probe_error.into_source(),
                    },
                    last,
                ));
            }
            Ok(Ok(observation)) => observation,
        };

        completed += 1;
        last = observation.snapshot;
        last_state = observation.label;
        debug!("probe {completed}: state '{last_state}'");

        match spec.transition(&last_state) {
            Transition::Target => {
                target_seen += 1;
                if target_seen >= spec.target_occurrences {
                    return Ok(last);
                }
            }
            Transition::Gone => return Ok(last),
            Transition::Pending => target_seen = 0,
            Transition::Unexpected => {
                warn!(
                    "unexpected state '{last_state}' while waiting for '{}'",
                    spec.target
                );
                return Err(WaitFailure::new(
                    WaitError::UnexpectedState {
                        state: last_state,
                        target: spec.target.clone(),
                    },
                    last,
                ));
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(spec.timed_out(last_state, last));
        }
        let delay = spec.poll.delay_for(completed);
        let wake = (now + delay).min(deadline);
        trace!("sleeping {:?} before status check {}", wake - now, completed + 1);

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(spec.cancelled(last_state, last)),
            () = tokio::time::sleep_until(wake) => {}
        }

        if Instant::now() >= deadline {
            return Err(spec.timed_out(last_state, last));
        }
    }
}
