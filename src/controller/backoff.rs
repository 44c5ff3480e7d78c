//! # Fibonacci Backoff
//!
//! Progressive retry delays for failed reconciliations.
//!
//! The sequence grows more slowly than exponential backoff, so a Wordpress
//! object whose store keeps failing is retried often at first without
//! hammering the API server later on.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use wordpress_operator::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(30));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(3));
//! ```

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, capped at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// First delay, restored by `reset`
    min_ms: u64,
    prev_ms: u64,
    current_ms: u64,
    max_ms: u64,
}

impl FibonacciBackoff {
    /// Create a backoff starting at `min` and never exceeding `max`
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let min_ms = duration_ms(min).max(1);
        Self {
            min_ms,
            prev_ms: 0,
            current_ms: min_ms,
            max_ms: duration_ms(max).max(min_ms),
        }
    }

    /// Get the next delay and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current_ms;

        let next = self.prev_ms.saturating_add(self.current_ms);
        self.prev_ms = self.current_ms;
        self.current_ms = next.min(self.max_ms);

        Duration::from_millis(result)
    }

    /// Restart the sequence, called after a successful reconciliation
    pub fn reset(&mut self) {
        self.prev_ms = 0;
        self.current_ms = self.min_ms;
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(backoff: &mut FibonacciBackoff) -> u64 {
        backoff.next_backoff().as_secs()
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(30));

        // 1s, 1s, 2s, 3s, 5s, 8s, 13s, 21s, 30s (max)
        let sequence: Vec<u64> = (0..9).map(|_| secs(&mut backoff)).collect();
        assert_eq!(sequence, vec![1, 1, 2, 3, 5, 8, 13, 21, 30]);
        // Stays at max
        assert_eq!(secs(&mut backoff), 30);
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(30));
        for _ in 0..5 {
            backoff.next_backoff();
        }

        backoff.reset();

        assert_eq!(secs(&mut backoff), 1);
        assert_eq!(secs(&mut backoff), 1);
        assert_eq!(secs(&mut backoff), 2);
    }

    #[test]
    fn test_sub_second_start() {
        let mut backoff =
            FibonacciBackoff::new(Duration::from_millis(250), Duration::from_millis(600));
        assert_eq!(backoff.next_backoff(), Duration::from_millis(250));
        assert_eq!(backoff.next_backoff(), Duration::from_millis(250));
        assert_eq!(backoff.next_backoff(), Duration::from_millis(500));
        assert_eq!(backoff.next_backoff(), Duration::from_millis(600));
    }

    #[test]
    fn test_max_below_min_is_raised() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(secs(&mut backoff), 5);
        assert_eq!(secs(&mut backoff), 5);
        assert_eq!(secs(&mut backoff), 5);
    }

    #[test]
    fn test_per_resource_state_is_independent() {
        let mut first = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(30));
        let mut second = first.clone();

        for _ in 0..4 {
            first.next_backoff();
        }
        assert_eq!(secs(&mut second), 1);
        assert_eq!(secs(&mut first), 5);
    }
}
