//! # Fibonacci Backoff
//!
//! Progressive retry delays for transient reconciliation failures.
//! Grows more slowly than exponential backoff, so a secret that appears a
//! few seconds late is picked up quickly while a broken store is not hammered.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use xds_snapshot_controller::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(30));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(3));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
//! ```

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, starting at `min` and capped
/// at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min: Duration,
    prev: Duration,
    current: Duration,
    max: Duration,
}

impl FibonacciBackoff {
    /// Create a backoff starting at `min` and never exceeding `max`
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use xds_snapshot_controller::controller::backoff::FibonacciBackoff;
    ///
    /// let backoff = FibonacciBackoff::new(Duration::from_millis(500), Duration::from_secs(60));
    /// ```
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let min = min.min(max);
        Self {
            min,
            prev: Duration::ZERO,
            current: min,
            max,
        }
    }

    /// Get the next delay and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;
        let next = self.prev.saturating_add(self.current);
        self.prev = self.current;
        self.current = next.min(self.max);
        result
    }

    /// Restart the sequence at `min`
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use xds_snapshot_controller::controller::backoff::FibonacciBackoff;
    ///
    /// let mut backoff = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(30));
    /// backoff.next_backoff();
    /// backoff.next_backoff();
    /// backoff.reset();
    /// assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
    /// ```
    pub fn reset(&mut self) {
        self.prev = Duration::ZERO;
        self.current = self.min;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(secs(1), secs(30));
        let sequence: Vec<Duration> = (0..9).map(|_| backoff.next_backoff()).collect();
        assert_eq!(
            sequence,
            vec![secs(1), secs(1), secs(2), secs(3), secs(5), secs(8), secs(13), secs(21), secs(30)]
        );
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = FibonacciBackoff::new(secs(1), secs(10));
        for _ in 0..6 {
            backoff.next_backoff();
        }
        // 8 + 5 would be 13
        assert_eq!(backoff.next_backoff(), secs(10));
        assert_eq!(backoff.next_backoff(), secs(10));
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::new(secs(1), secs(30));
        backoff.next_backoff();
        backoff.next_backoff();
        backoff.next_backoff();

        backoff.reset();

        assert_eq!(backoff.next_backoff(), secs(1));
        assert_eq!(backoff.next_backoff(), secs(1));
        assert_eq!(backoff.next_backoff(), secs(2));
    }

    #[test]
    fn test_min_above_max_is_clamped() {
        let mut backoff = FibonacciBackoff::new(secs(60), secs(5));
        assert_eq!(backoff.next_backoff(), secs(5));
        assert_eq!(backoff.next_backoff(), secs(5));
    }

    #[test]
    fn test_fibonacci_backoff_per_resource_state() {
        let mut backoff1 = FibonacciBackoff::new(secs(1), secs(30));
        let mut backoff2 = FibonacciBackoff::new(secs(1), secs(30));

        backoff1.next_backoff();
        backoff1.next_backoff();
        assert_eq!(backoff1.next_backoff(), secs(2));

        assert_eq!(backoff2.next_backoff(), secs(1));

        backoff1.reset();
        assert_eq!(backoff1.next_backoff(), secs(1));
        assert_eq!(backoff2.next_backoff(), secs(1));
        assert_eq!(backoff2.next_backoff(), secs(2));
    }
}
