//! Server response freshness (replay prevention).

use crate::clock::Clock;
use crate::GateError;

/// Maximum allowed distance between server and local time (5 minutes).
pub const MAX_RESPONSE_SKEW_SECONDS: i64 = 5 * 60;

/// Check that a server timestamp (unix seconds) is within the skew window.
///
/// The window is symmetric: responses too old (replays) and too far in the
/// future (clock tampering) are both rejected.
///
/// # Errors
/// * `StaleResponse` - `|now - server_timestamp|` exceeds the window
pub fn check_timestamp_freshness<C: Clock + ?Sized>(
    server_timestamp: i64,
    max_skew_seconds: i64,
    clock: &C,
) -> Result<(), GateError> {
    let skew_seconds = clock.now_unix_seconds().saturating_sub(server_timestamp).saturating_abs();

    if skew_seconds > max_skew_seconds {
        return Err(GateError::StaleResponse { skew_seconds });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    // 2021-06-09T16:08:15Z
    const SERVER_TS: i64 = 1_623_254_895;

    #[test]
    fn test_freshness_valid() {
        let clock = MockClock::from_rfc3339("2021-06-09T16:10:00Z");
        assert!(check_timestamp_freshness(SERVER_TS, MAX_RESPONSE_SKEW_SECONDS, &clock).is_ok());
    }

    #[test]
    fn test_freshness_stale() {
        let clock = MockClock::from_rfc3339("2021-06-09T16:20:00Z");
        let result = check_timestamp_freshness(SERVER_TS, MAX_RESPONSE_SKEW_SECONDS, &clock);
        assert!(matches!(
            result,
            Err(GateError::StaleResponse { skew_seconds: 705 })
        ));
    }

    #[test]
    fn test_freshness_exactly_5_minutes() {
        let clock = MockClock::from_rfc3339("2021-06-09T16:13:15Z");
        assert!(check_timestamp_freshness(SERVER_TS, MAX_RESPONSE_SKEW_SECONDS, &clock).is_ok());
    }

    #[test]
    fn test_freshness_just_over_5_minutes() {
        let clock = MockClock::from_rfc3339("2021-06-09T16:13:16Z");
        let result = check_timestamp_freshness(SERVER_TS, MAX_RESPONSE_SKEW_SECONDS, &clock);
        assert!(matches!(result, Err(GateError::StaleResponse { .. })));
    }

    #[test]
    fn test_freshness_future_rejected() {
        let clock = MockClock::from_rfc3339("2021-06-09T16:02:00Z");
        let result = check_timestamp_freshness(SERVER_TS, MAX_RESPONSE_SKEW_SECONDS, &clock);
        assert!(matches!(
            result,
            Err(GateError::StaleResponse { skew_seconds: 375 })
        ));
    }

    #[test]
    fn test_freshness_extreme_values() {
        let clock = MockClock::from_rfc3339("2021-06-09T16:08:15Z");
        assert!(check_timestamp_freshness(i64::MIN, MAX_RESPONSE_SKEW_SECONDS, &clock).is_err());
        assert!(check_timestamp_freshness(i64::MAX, MAX_RESPONSE_SKEW_SECONDS, &clock).is_err());
    }
}
