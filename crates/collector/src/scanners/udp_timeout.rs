//! 1Hz scan: flag clients that have stopped sending datagrams.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fslatency_core::Timestamp;

use crate::alarm;
use crate::state::CollectorState;

pub fn run(state: Arc<CollectorState>) -> ! {
    loop {
        let deadline_secs = Timestamp::now().sec - state.config.udptimeout;
        for msgid in 0..state.statusdb.len() {
            let lastarrival = state.statusdb.lock(msgid).lastarrival;
            if lastarrival.is_zero() || lastarrival.sec > deadline_secs {
                continue;
            }
            let mut entry = state.statusdb.lock(msgid);
            let deadline_secs = Timestamp::now().sec - state.config.udptimeout;
            if entry.lastarrival.sec > deadline_secs {
                continue;
            }
            if state.config.debug > 1 {
                tracing::debug!(msgid, "udptimeout");
            }
            entry.set_alarm(alarm::UDP_TIMEOUT, &state.alarmstatus);
        }
        thread::sleep(Duration::from_secs(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CollectorArgs;
    use crate::config::Config;

    fn test_state(udptimeout: i64) -> CollectorState {
        let args = CollectorArgs {
            bind: "0.0.0.0".into(),
            port: 0,
            maxclient: 2,
            timetoforget: 600,
            udptimeout,
            alarmtimeout: 8,
            statusperiod: 300,
            alarmstatusperiod: 1,
            latencythresholdfactor: 15.0,
            rollingwindow: 8,
            minimummeasurementcount: 4,
            graphitebase: None,
            graphiteip: None,
            graphiteport: 2003,
            nomemlock: true,
            debug: None,
        };
        CollectorState::new(Config::from_args(args).unwrap()).unwrap()
    }

    fn scan_once(state: &CollectorState) {
        let deadline_secs = Timestamp::now().sec - state.config.udptimeout;
        for msgid in 0..state.statusdb.len() {
            let mut entry = state.statusdb.lock(msgid);
            if entry.lastarrival.is_zero() || entry.lastarrival.sec > deadline_secs {
                continue;
            }
            entry.set_alarm(alarm::UDP_TIMEOUT, &state.alarmstatus);
        }
    }

    #[test]
    fn vacant_slot_is_never_flagged() {
        let state = test_state(3);
        scan_once(&state);
        assert_eq!(state.statusdb.lock(0).alarm, alarm::NOALARM);
    }

    #[test]
    fn stale_arrival_sets_timeout() {
        let state = test_state(3);
        state.statusdb.lock(0).lastarrival = Timestamp::new(1, 0);
        scan_once(&state);
        assert_eq!(state.statusdb.lock(0).alarm & alarm::UDP_TIMEOUT, alarm::UDP_TIMEOUT);
    }

    #[test]
    fn fresh_arrival_is_not_flagged_and_does_not_clear_an_existing_alarm() {
        // Only the AlarmSilencer clears an alarm bit; this scanner only adds.
        let state = test_state(3);
        {
            let mut entry = state.statusdb.lock(0);
            entry.lastarrival = Timestamp::now();
            entry.alarm = alarm::UDP_TIMEOUT;
        }
        scan_once(&state);
        assert_eq!(state.statusdb.lock(0).alarm & alarm::UDP_TIMEOUT, alarm::UDP_TIMEOUT);
    }
}
