//! Poll cadence between consecutive probes.

use std::time::Duration;

/// How long to sleep between probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPolicy {
    /// The same delay after every probe.
    Fixed(Duration),
    /// Doubling delay starting at `initial`, capped at `max`.
    Backoff { initial: Duration, max: Duration },
}

impl PollPolicy {
    pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);
    pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(10);

    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed(delay)
    }

    pub fn backoff(initial: Duration, max: Duration) -> Self {
        Self::Backoff { initial, max }
    }

    /// Delay to wait after the `completed`-th probe (1-based) before probing again.
    pub fn delay_for(&self, completed: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Backoff { initial, max } => {
                let doublings = completed.saturating_sub(1).min(31);
                initial
                    .checked_mul(1_u32 << doublings)
                    .map_or(max, |delay| delay.min(max))
            }
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::Backoff {
            initial: Self::DEFAULT_INITIAL_BACKOFF,
            max: Self::DEFAULT_MAX_BACKOFF,
        }
    }
}
