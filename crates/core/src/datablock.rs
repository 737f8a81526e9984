//! Per-second latency summaries and the fold that produces them
//!
//! Each [`Datablock`] covers one publisher tick's worth of probe samples,
//! expressed as log-milliseconds so the heavy-tailed latency distribution
//! is statistically well-behaved. `sumx`/`sumxx` carry enough information
//! to recover mean and standard deviation without keeping the raw samples.

use crate::timestamp::Timestamp;

/// ~31 years in seconds; used as the sentinel minimum for an "empty"
/// datablock so it never wins a min/max comparison against real samples.
pub const EXTREME_BIG_INTERVAL: f64 = 1_000_000_000.0;

/// Number of historical datablocks carried in one wire message.
pub const DATABLOCKARRAY_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datablock {
    pub measurementcount: u64,
    pub starttime: Timestamp,
    pub endtime: Timestamp,
    pub min: f64,
    pub max: f64,
    pub sumx: f64,
    pub sumxx: f64,
}

impl Datablock {
    /// The sentinel datablock published when a tick folded zero samples.
    pub fn empty() -> Self {
        Self {
            measurementcount: 0,
            starttime: Timestamp::ZERO,
            endtime: Timestamp::ZERO,
            min: EXTREME_BIG_INTERVAL,
            max: 0.0,
            sumx: 0.0,
            sumxx: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.measurementcount == 0
    }

    pub fn mean(&self) -> Option<f64> {
        if self.measurementcount == 0 {
            None
        } else {
            Some(self.sumx / self.measurementcount as f64)
        }
    }

    /// Sample standard deviation; `None` below two measurements (matches
    /// the `N - 1` denominator used by the collector's statistical scan).
    pub fn std_dev(&self) -> Option<f64> {
        if self.measurementcount < 2 {
            return None;
        }
        let n = self.measurementcount as f64;
        let variance = (self.sumxx - self.sumx * self.sumx / n) / (n - 1.0);
        Some(variance.max(0.0).sqrt())
    }
}

/// Accumulates raw `(begin, end)` probe samples into a single [`Datablock`],
/// transforming each elapsed duration to `ln(elapsed_ms)` as it folds in.
#[derive(Debug, Default)]
pub struct DatablockFold {
    count: u64,
    starttime: Option<Timestamp>,
    endtime: Option<Timestamp>,
    min: f64,
    max: f64,
    sumx: f64,
    sumxx: f64,
}

impl DatablockFold {
    pub fn new() -> Self {
        Self {
            count: 0,
            starttime: None,
            endtime: None,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sumx: 0.0,
            sumxx: 0.0,
        }
    }

    /// Fold one `(begin, end)` probe sample in.
    pub fn add_sample(&mut self, begin: Timestamp, end: Timestamp) {
        let elapsed_ms = end.diff_seconds(begin) * 1000.0;
        let elapsed_ms = elapsed_ms.max(f64::MIN_POSITIVE);
        let x = elapsed_ms.ln();
        self.min = self.min.min(x);
        self.max = self.max.max(x);
        self.sumx += x;
        self.sumxx += x * x;
        self.count += 1;
        if self.starttime.is_none() {
            self.starttime = Some(begin);
        }
        self.endtime = Some(end);
    }

    /// Finish the fold, producing an empty sentinel if no samples were added.
    pub fn finish(self) -> Datablock {
        if self.count == 0 {
            return Datablock::empty();
        }
        Datablock {
            measurementcount: self.count,
            starttime: self.starttime.unwrap_or(Timestamp::ZERO),
            endtime: self.endtime.unwrap_or(Timestamp::ZERO),
            min: self.min,
            max: self.max,
            sumx: self.sumx,
            sumxx: self.sumxx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fold_yields_sentinel() {
        let db = DatablockFold::new().finish();
        assert!(db.is_empty());
        assert_eq!(db.min, EXTREME_BIG_INTERVAL);
        assert_eq!(db.mean(), None);
    }

    #[test]
    fn mean_and_std_match_closed_form() {
        let mut fold = DatablockFold::new();
        let samples = [0.5_f64, 0.6, 0.55, 0.52];
        for (i, s) in samples.iter().enumerate() {
            let begin = Timestamp::new(i as i64 * 10, 0);
            let end = Timestamp::new(i as i64 * 10, (s * 1_000_000_000.0) as i64);
            fold.add_sample(begin, end);
        }
        let db = fold.finish();
        assert_eq!(db.measurementcount, 4);

        let xs: Vec<f64> = samples.iter().map(|s| (s * 1000.0).ln()).collect();
        let n = xs.len() as f64;
        let expected_mean = xs.iter().sum::<f64>() / n;
        let expected_var =
            xs.iter().map(|x| (x - expected_mean).powi(2)).sum::<f64>() / (n - 1.0);

        assert!((db.mean().unwrap() - expected_mean).abs() < 1e-9);
        assert!((db.std_dev().unwrap() - expected_var.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn single_measurement_has_no_std_dev() {
        let mut fold = DatablockFold::new();
        fold.add_sample(Timestamp::new(0, 0), Timestamp::new(0, 500_000_000));
        let db = fold.finish();
        assert_eq!(db.measurementcount, 1);
        assert_eq!(db.std_dev(), None);
    }
}
