// ABOUTME: Exponential backoff schedule for retrying transient platform failures.
// ABOUTME: Pure function of base delay and attempt number, saturating on overflow.

use std::time::Duration;

/// Delay before retrying after the `attempt`-th failed call (1-based).
///
/// Doubles per attempt: base, 2×base, 4×base, ...
pub(crate) fn delay_for_attempt(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_waits_the_base_delay() {
        let base = Duration::from_secs(1);
        assert_eq!(delay_for_attempt(base, 1), Duration::from_secs(1));
    }

    #[test]
    fn delays_double_per_attempt() {
        let base = Duration::from_secs(1);
        assert_eq!(delay_for_attempt(base, 2), Duration::from_secs(2));
        assert_eq!(delay_for_attempt(base, 3), Duration::from_secs(4));
        assert_eq!(delay_for_attempt(base, 4), Duration::from_secs(8));
    }

    #[test]
    fn schedule_is_strictly_increasing() {
        let base = Duration::from_millis(250);
        let mut prev = Duration::ZERO;
        for attempt in 1..=10 {
            let delay = delay_for_attempt(base, attempt);
            assert!(delay > prev, "attempt {attempt} did not increase");
            prev = delay;
        }
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let base = Duration::from_secs(1);
        let huge = delay_for_attempt(base, 500);
        assert!(huge >= delay_for_attempt(base, 499));
    }
}
