//! 1Hz scan: the only thread permitted to clear a per-client alarm, and the
//! one that drops the global status back to normal once nothing is left lit.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fslatency_core::Timestamp;

use crate::state::CollectorState;

pub fn run(state: Arc<CollectorState>) -> ! {
    loop {
        let deadline_secs = Timestamp::now().sec - state.config.alarmtimeout;
        let mut some_alarm = false;
        for msgid in 0..state.statusdb.len() {
            let mut entry = state.statusdb.lock(msgid);
            if entry.lastarrival.is_zero() {
                continue;
            }
            if entry.lastalarmtime.sec > deadline_secs {
                some_alarm = true;
                continue;
            }
            if state.config.debug > 1 {
                tracing::debug!(msgid, "alarm status cleared");
            }
            entry.clear_alarm();
        }
        if !some_alarm {
            state.alarmstatus.clear_to_normal();
        }
        thread::sleep(Duration::from_secs(1));
    }
}
