//! Minute-by-minute metric push to a Graphite carbon endpoint (plaintext
//! protocol), falling back to stdout when no endpoint is configured.

use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::alarm::AlarmCounts;
use crate::state::CollectorState;

const PERIOD: Duration = Duration::from_secs(60);

fn tally(state: &CollectorState) -> AlarmCounts {
    let mut counts = AlarmCounts::default();
    for msgid in 0..state.statusdb.len() {
        counts.tally(state.statusdb.lock(msgid).alarm);
    }
    counts
}

fn render(base: &str, state: &CollectorState, curtime: u64) -> String {
    let counts = tally(state);
    let stat = state.stat.get();
    format!(
        "{base}.totalclients {} {curtime}\n\
         {base}.alarmedclients {} {curtime}\n\
         {base}.latencylow {} {curtime}\n\
         {base}.latencyhigh {} {curtime}\n\
         {base}.stuckedclients {} {curtime}\n\
         {base}.lostclients {} {curtime}\n\
         {base}.ln_latency.datapoints {} {curtime}\n\
         {base}.ln_latency.min {} {curtime}\n\
         {base}.ln_latency.max {} {curtime}\n\
         {base}.ln_latency.mean {} {curtime}\n\
         {base}.ln_latency.std {} {curtime}\n",
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
    )
}

pub fn run(state: Arc<CollectorState>) -> ! {
    let Some(base) = state.config.graphitebase.clone() else {
        tracing::warn!("graphite thread started without --graphitebase; this should not happen");
        loop {
            thread::sleep(PERIOD);
        }
    };

    loop {
        thread::sleep(PERIOD);
        let curtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let payload = render(&base, &state, curtime);

        match state.config.graphite_addr {
            Some(addr) => match TcpStream::connect(addr) {
                Ok(mut stream) => {
                    if let Err(e) = stream.write_all(payload.as_bytes()) {
                        tracing::warn!(error = %e, "failed writing to graphite");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, %addr, "cannot connect to graphite");
                }
            },
            None => {
                print!("{payload}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
            graphitebase: Some("fslatency.host1".into()),
            graphiteip: None,
            graphiteport: 2003,
            nomemlock: true,
            debug: None,
        };
        CollectorState::new(Config::from_args(args).unwrap()).unwrap()
    }

    #[test]
    fn render_emits_one_line_per_metric() {
        let state = test_state();
        let rendered = render("fslatency.host1", &state, 1_700_000_000);
        assert_eq!(rendered.lines().count(), 11);
        assert!(rendered.contains("fslatency.host1.totalclients 0 1700000000"));
        assert!(rendered.contains("fslatency.host1.ln_latency.datapoints 0 1700000000"));
    }
}
