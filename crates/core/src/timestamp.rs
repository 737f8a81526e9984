//! Real-time instants used for probe timing and wire transmission

use std::time::{SystemTime, UNIX_EPOCH};

/// A nanosecond-precision instant, independent of any particular clock API
///
/// Stored as seconds + nanoseconds rather than a single float so the wire
/// encoding in [`crate::wire`] is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp {
    pub sec: i64,
    pub nsec: i64,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { sec: 0, nsec: 0 };

    pub fn new(sec: i64, nsec: i64) -> Self {
        Self { sec, nsec }
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        let dur = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            sec: dur.as_secs() as i64,
            nsec: dur.subsec_nanos() as i64,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.sec == 0 && self.nsec == 0
    }

    /// Elapsed seconds as a float, `self` assumed later than `earlier`
    pub fn diff_seconds(&self, earlier: Timestamp) -> f64 {
        (self.sec - earlier.sec) as f64 + (self.nsec - earlier.nsec) as f64 / 1_000_000_000.0
    }

    pub fn as_seconds_f64(&self) -> f64 {
        self.sec as f64 + self.nsec as f64 / 1_000_000_000.0
    }
}
