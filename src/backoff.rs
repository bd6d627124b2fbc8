//! # Restart backoff policy.
//!
//! [`BackoffPolicy`] computes the delay before the next spawn after a child
//! exit. The delay starts at `first`, doubles after every announcement and
//! saturates at `max`. A run that stayed up for at least `cooloff` counts as
//! a recovery: the ladder starts over at `first`.
//!
//! The returned delay is the pre-doubling value, so the first restart after
//! a recovery waits `first` and the one after that waits `2 * first`.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use procvisor::BackoffPolicy;
//!
//! let mut backoff = BackoffPolicy::new(
//!     Duration::from_secs(1),      // first
//!     Duration::from_secs(15 * 60), // cooloff
//!     Duration::from_secs(3600),   // max
//! );
//!
//! // Short-lived runs climb the ladder.
//! assert_eq!(backoff.next(Duration::from_millis(500)), Duration::from_secs(1));
//! assert_eq!(backoff.next(Duration::from_millis(500)), Duration::from_secs(2));
//! assert_eq!(backoff.next(Duration::from_millis(500)), Duration::from_secs(4));
//!
//! // A long run resets it.
//! assert_eq!(backoff.next(Duration::from_secs(20 * 60)), Duration::from_secs(1));
//! ```

use std::time::Duration;

/// Exponential backoff with a recovery threshold.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay, also the post-recovery delay.
    first: Duration,
    /// Uptime at which a run counts as recovered.
    cooloff: Duration,
    /// Saturation point for the doubling.
    max: Duration,
    /// Delay the next exit will be charged.
    current: Duration,
}

impl BackoffPolicy {
    pub fn new(first: Duration, cooloff: Duration, max: Duration) -> Self {
        Self {
            first,
            cooloff,
            max,
            current: first,
        }
    }

    /// Charges one child exit and returns the delay to apply before the next
    /// spawn. `uptime` is how long the exiting run lasted.
    pub fn next(&mut self, uptime: Duration) -> Duration {
        if uptime >= self.cooloff {
            self.current = self.first;
        }
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }
}
