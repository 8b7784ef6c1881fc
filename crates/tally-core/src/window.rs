//! Trailing time windows

use thiserror_no_std::Error;

/// Rejected window request.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum WindowError {
    /// Requested duration is zero, negative or not finite
    #[error("time duration must be positive, got {0}s")]
    InvalidDuration(f64),
}

/// Half-open window `[start, end)` in seconds since the Unix epoch.
///
/// `end` is "now" at the time the window was resolved; readings captured
/// after that are never included retroactively. The requested duration may
/// be fractional; capture times are whole seconds, so `start` is the first
/// whole second at or after `now - duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: i64,
    end: i64,
    requested_duration_secs: f64,
}

impl TimeWindow {
    /// Resolves the trailing window ending at `now`.
    pub fn resolve(now: i64, requested_duration_secs: f64) -> Result<Self, WindowError> {
        if !requested_duration_secs.is_finite() || requested_duration_secs <= 0.0 {
            return Err(WindowError::InvalidDuration(requested_duration_secs));
        }

        // ceil(now - d) == now - floor(d) for integral `now`; the cast
        // truncates (floor for d > 0) and saturates on huge durations.
        let whole_secs = requested_duration_secs as i64;

        Ok(Self {
            start: now.saturating_sub(whole_secs),
            end: now,
            requested_duration_secs,
        })
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Duration as requested by the caller (always finite and > 0).
    pub fn requested_duration_secs(&self) -> f64 {
        self.requested_duration_secs
    }

    /// Returns true if `timestamp` falls in `[start, end)`.
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_trailing_window() {
        let window = TimeWindow::resolve(10_000, 6_000.0).unwrap();
        assert_eq!(window.start(), 4_000);
        assert_eq!(window.end(), 10_000);
        assert_eq!(window.requested_duration_secs(), 6_000.0);
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        assert_eq!(
            TimeWindow::resolve(10_000, 0.0),
            Err(WindowError::InvalidDuration(0.0))
        );
        assert_eq!(
            TimeWindow::resolve(10_000, -5.0),
            Err(WindowError::InvalidDuration(-5.0))
        );
        assert_eq!(
            TimeWindow::resolve(10_000, -0.5),
            Err(WindowError::InvalidDuration(-0.5))
        );
    }

    #[test]
    fn test_rejects_non_finite_duration() {
        assert!(TimeWindow::resolve(10_000, f64::INFINITY).is_err());
        assert!(TimeWindow::resolve(10_000, f64::NAN).is_err());
    }

    #[test]
    fn test_fractional_duration_rounds_start_up() {
        // now - 1.5 = 998.5, first whole second inside is 999
        let window = TimeWindow::resolve(1_000, 1.5).unwrap();
        assert_eq!(window.start(), 999);
        assert_eq!(window.requested_duration_secs(), 1.5);
        assert!(window.contains(999));
        assert!(!window.contains(998));

        // A sub-second window holds no whole second
        let window = TimeWindow::resolve(1_000, 0.25).unwrap();
        assert_eq!(window.start(), 1_000);
        assert!(!window.contains(1_000));
    }

    #[test]
    fn test_huge_duration_saturates() {
        let window = TimeWindow::resolve(1_000, 1e300).unwrap();
        assert_eq!(window.start(), 1_000 - i64::MAX);
        assert!(window.contains(0));
    }

    #[test]
    fn test_bounds_are_half_open() {
        let window = TimeWindow::resolve(1_000, 100.0).unwrap();
        assert!(window.contains(900));
        assert!(window.contains(999));
        assert!(!window.contains(1_000));
        assert!(!window.contains(899));
    }
}
