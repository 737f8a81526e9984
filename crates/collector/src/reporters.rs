//! Condvar-gated periodic status lines, one for the normal state and one for
//! the alarmed state, plus the alarm-breakdown tally they share.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Local;

use crate::alarm::AlarmCounts;
use crate::state::CollectorState;

fn tally(state: &CollectorState) -> AlarmCounts {
    let mut counts = AlarmCounts::default();
    for msgid in 0..state.statusdb.len() {
        counts.tally(state.statusdb.lock(msgid).alarm);
    }
    counts
}

/// Runs while the collector is in the Normal state: one status line every
/// `statusperiod` seconds, blocking immediately if an alarm is already in
/// progress so it never reports "normal" mid-alarm.
pub fn run_normal(state: Arc<CollectorState>) -> ! {
    loop {
        thread::sleep(Duration::from_secs(state.config.statusperiod));
        state.alarmstatus.wait_while_alarmed();
        let stat = state.stat.get();
        let timestamp = Local::now().to_rfc3339();
        // Primary output, not a diagnostic: written directly so it isn't
        // subject to EnvFilter dropping it at a quiet log level.
        println!(
            "{timestamp} Status: normal. Clients: {} ln_ltncy:(N:{} min:{:.3} max:{:.3} avg:{:.3} std:{:.3})",
            state.registry.used(),
            stat.sum_n,
            stat.minx,
            stat.maxx,
            stat.mean,
            stat.std,
        );
    }
}

/// Runs while the collector is in the Alarmed state: one line every
/// `alarmstatusperiod` seconds with the per-reason breakdown, blocking
/// while everything is quiet.
pub fn run_alarm(state: Arc<CollectorState>) -> ! {
    loop {
        thread::sleep(Duration::from_secs(state.config.alarmstatusperiod));
        state.alarmstatus.wait_while_normal();
        let counts = tally(&state);
        let stat = state.stat.get();
        let timestamp = Local::now().to_rfc3339();
        // Same rationale as run_normal: this line is the product's primary
        // output and must not be gated behind EnvFilter.
        println!(
            "{timestamp} ALARM Clients: {} w/alarms: {} (ltncy lo:{} ltncy hi:{} stuck:{} lost:{}) ln_ltncy:(N:{} min:{:.3} max:{:.3} avg:{:.3} std:{:.3})",
            state.registry.used(),
            counts.with_any,
            counts.stat_low,
            counts.stat_high,
            counts.empty_datablock,
            counts.udp_timeout,
            stat.sum_n,
            stat.minx,
            stat.maxx,
            stat.mean,
            stat.std,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm;
    use crate::cli::CollectorArgs;
    use crate::config::Config;

    fn test_state() -> CollectorState {
        let args = CollectorArgs {
            bind: "0.0.0.0".into(),
            port: 0,
            maxclient: 4,
            timetoforget: 600,
            udptimeout: 3,
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

    #[test]
    fn tally_reflects_every_slot() {
        let state = test_state();
        state.statusdb.lock(0).alarm = alarm::STAT_LOW;
        state.statusdb.lock(1).alarm = alarm::UDP_TIMEOUT | alarm::STAT_HIGH;
        let counts = tally(&state);
        assert_eq!(counts.with_any, 2);
        assert_eq!(counts.stat_low, 1);
        assert_eq!(counts.stat_high, 1);
        assert_eq!(counts.udp_timeout, 1);
    }
}
