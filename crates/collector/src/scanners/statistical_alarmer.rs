//! 1Hz scan: per-client statistics, STAT_LOW/STAT_HIGH classification, and
//! the cumulative [`GlobalStat`](crate::globalstat::GlobalStat) refresh.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fslatency_core::datablock::EXTREME_BIG_INTERVAL;

use crate::alarm;
use crate::globalstat::GlobalStat;
use crate::state::CollectorState;

fn standard_deviation(sum_n: u64, sumx: f64, sumxx: f64) -> f64 {
    let n = sum_n as f64;
    ((sumxx - sumx * sumx / n) / (n - 1.0)).max(0.0).sqrt()
}

/// One client's contribution to the global aggregate, and its own
/// high/low classification against its rolling window.
fn score_one(state: &CollectorState, msgid: usize, cumulative: &mut GlobalStat) {
    let mut entry = state.statusdb.lock(msgid);
    if entry.buffer.is_empty() {
        return;
    }

    let mut min = EXTREME_BIG_INTERVAL;
    let mut max = -EXTREME_BIG_INTERVAL;
    let mut sumx = 0.0;
    let mut sumxx = 0.0;
    let mut sum_n = 0u64;

    for db in entry.buffer.iter() {
        if db.min <= EXTREME_BIG_INTERVAL {
            sum_n += db.measurementcount;
            min = min.min(db.min);
            max = max.max(db.max);
            sumx += db.sumx;
            sumxx += db.sumxx;
        } else if state.config.debug > 0 {
            tracing::debug!(msgid, "empty datablock arrived for statistical alarmer");
        }
    }

    cumulative.sum_n += sum_n;
    cumulative.sumx += sumx;
    cumulative.sumxx += sumxx;
    cumulative.minx = cumulative.minx.min(min);
    cumulative.maxx = cumulative.maxx.max(max);

    if sum_n > state.config.minimummeasurementcount {
        let mean = sumx / sum_n as f64;
        let std = standard_deviation(sum_n, sumx, sumxx);
        let newest = entry.buffer.getlast().copied().unwrap();
        if state.config.debug > 1 {
            tracing::trace!(
                msgid,
                sum_n,
                mean,
                std,
                newest_min = newest.min,
                newest_max = newest.max,
                "statistical scan"
            );
        }
        let factor = state.config.latencythresholdfactor;
        if newest.min < mean - factor * std {
            entry.set_alarm(alarm::STAT_LOW, &state.alarmstatus);
        } else {
            entry.unset_alarm(alarm::STAT_LOW);
        }
        if newest.max > mean + factor * std {
            entry.set_alarm(alarm::STAT_HIGH, &state.alarmstatus);
        } else {
            entry.unset_alarm(alarm::STAT_HIGH);
        }
    } else if state.config.debug > 1 {
        tracing::trace!(msgid, sum_n, min, max, "statistical scan, too few samples");
    }
}

pub fn run(state: Arc<CollectorState>) -> ! {
    loop {
        let mut cumulative = GlobalStat::zeroed();
        for msgid in 0..state.statusdb.len() {
            score_one(&state, msgid, &mut cumulative);
        }
        if cumulative.sum_n > 0 {
            cumulative.mean = cumulative.sumx / cumulative.sum_n as f64;
            cumulative.std = standard_deviation(cumulative.sum_n, cumulative.sumx, cumulative.sumxx);
        }
        state.stat.set(cumulative);
        thread::sleep(Duration::from_secs(1));
    }
}
