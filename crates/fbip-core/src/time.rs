//! Wall-clock helpers
//!
//! Events carry their creation time as f64 seconds since the Unix epoch.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current time as seconds since the Unix epoch
pub fn unix_seconds() -> f64 {
    since_epoch().as_secs_f64()
}

/// Current time as milliseconds since the Unix epoch
pub fn unix_millis() -> u64 {
    since_epoch().as_millis() as u64
}

fn since_epoch() -> Duration {
    // A clock set before 1970 reads as the epoch itself
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_sane() {
        // 2020-01-01
        assert!(unix_seconds() > 1_577_836_800.0);
        let millis = unix_millis();
        let secs = unix_seconds();
        assert!((millis as f64 / 1000.0 - secs).abs() < 5.0);
    }
}
