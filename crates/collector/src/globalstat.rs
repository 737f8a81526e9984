//! Cumulative latency aggregate across all clients, refreshed once per
//! statistical scan and read by both reporters and the Graphite sink.

use std::sync::{Mutex, MutexGuard};

use fslatency_core::datablock::EXTREME_BIG_INTERVAL;

#[derive(Debug, Clone, Copy)]
pub struct GlobalStat {
    pub minx: f64,
    pub maxx: f64,
    pub sumx: f64,
    pub sumxx: f64,
    pub mean: f64,
    pub std: f64,
    pub sum_n: u64,
}

impl GlobalStat {
    pub fn zeroed() -> Self {
        Self {
            minx: EXTREME_BIG_INTERVAL,
            maxx: -EXTREME_BIG_INTERVAL,
            sumx: 0.0,
            sumxx: 0.0,
            mean: 0.0,
            std: 0.0,
            sum_n: 0,
        }
    }
}

pub struct GlobalStatCell(Mutex<GlobalStat>);

impl GlobalStatCell {
    pub fn new() -> Self {
        Self(Mutex::new(GlobalStat::zeroed()))
    }

    pub fn get(&self) -> GlobalStat {
        *self.0.lock().unwrap()
    }

    pub fn set(&self, stat: GlobalStat) {
        *self.0.lock().unwrap() = stat;
    }

    pub fn lock(&self) -> MutexGuard<'_, GlobalStat> {
        self.0.lock().unwrap()
    }
}

impl Default for GlobalStatCell {
    fn default() -> Self {
        Self::new()
    }
}
