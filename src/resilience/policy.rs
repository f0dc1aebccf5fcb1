use tokio::time::Duration;

/// How a scheduler reacts when a node's job fails.
///
/// Only job failures are retried. Cancellations and argument errors are
/// always returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Return the first failure
    Never,

    /// Resubmit right away, up to `max_attempts` submissions in total
    Immediate { max_attempts: usize },

    /// Exponential backoff between submissions
    Exponential {
        base_ms: u64,
        max_ms: u64,
        max_attempts: usize,
    },
}

impl RetryPolicy {
    /// Delay before the next attempt after `attempts` failed ones, or `None`
    /// when the policy is exhausted.
    pub fn delay_before(&self, attempts: usize) -> Option<Duration> {
        match *self {
            Self::Never => None,
            Self::Immediate { max_attempts } => (attempts < max_attempts).then_some(Duration::ZERO),
            Self::Exponential {
                base_ms,
                max_ms,
                max_attempts,
            } => {
                if attempts >= max_attempts {
                    return None;
                }
                let exponent = attempts.saturating_sub(1).min(32) as u32;
                let delay = base_ms.saturating_mul(1u64 << exponent).min(max_ms);
                Some(Duration::from_millis(delay))
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::Never
    }
}
