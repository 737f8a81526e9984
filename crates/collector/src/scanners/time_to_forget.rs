//! 1Hz scan: evict clients that have been silent past `timetoforget`.
//!
//! The only thread that removes registry entries, so it owns
//! `addremove_lock` for the whole check-and-evict sequence.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fslatency_core::Timestamp;

use crate::state::CollectorState;

pub fn run(state: Arc<CollectorState>) -> ! {
    loop {
        let deadline_secs = Timestamp::now().sec - state.config.timetoforget;
        for msgid in 0..state.statusdb.len() {
            let lastarrival = state.statusdb.lock(msgid).lastarrival;
            if lastarrival.is_zero() || lastarrival.sec > deadline_secs {
                continue;
            }
            evict_if_stale(&state, msgid);
        }
        thread::sleep(Duration::from_secs(1));
    }
}

fn evict_if_stale(state: &CollectorState, msgid: usize) {
    let _guard = state.addremove_lock.lock().unwrap();
    let deadline_secs = Timestamp::now().sec - state.config.timetoforget;
    let mut entry = state.statusdb.lock(msgid);
    if entry.lastarrival.is_zero() || entry.lastarrival.sec > deadline_secs {
        return;
    }

    match state.registry.getbyid(msgid) {
        None => {
            tracing::error!(
                msgid,
                "programming-flow error: registry has no entry for this statusdb slot; clearing orphan"
            );
            entry.clear();
        }
        Some(name) => {
            tracing::info!(
                msgid,
                hostname = %String::from_utf8_lossy(&name[..fslatency_core::wire::HOSTNAME_LEN]),
                text = %String::from_utf8_lossy(&name[fslatency_core::wire::HOSTNAME_LEN..]),
                "timetoforget: client removed"
            );
            entry.clear();
            if state.registry.removebyid(msgid).is_none() {
                tracing::error!(msgid, "programming-flow error: registry inconsistent during removal");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CollectorArgs;
    use crate::config::Config;

    fn test_state(timetoforget: i64) -> CollectorState {
        let args = CollectorArgs {
            bind: "0.0.0.0".into(),
            port: 0,
            maxclient: 4,
            timetoforget,
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

    fn namelen() -> usize {
        fslatency_core::wire::HOSTNAME_LEN + fslatency_core::wire::TEXT_LEN
    }

    #[test]
    fn stale_client_is_removed_from_registry_and_statusdb() {
        let state = test_state(5);
        let name = vec![b'h'; namelen()];
        let id = state.registry.add(&name).unwrap().unwrap();
        state.statusdb.lock(id).lastarrival = Timestamp::new(1, 0);

        evict_if_stale(&state, id);

        assert_eq!(state.registry.used(), 0);
        assert!(state.statusdb.lock(id).is_vacant());
    }

    #[test]
    fn fresh_client_is_kept() {
        let state = test_state(600);
        let name = vec![b'h'; namelen()];
        let id = state.registry.add(&name).unwrap().unwrap();
        state.statusdb.lock(id).lastarrival = Timestamp::now();

        evict_if_stale(&state, id);

        assert_eq!(state.registry.used(), 1);
    }

    #[test]
    fn orphaned_statusdb_entry_self_heals() {
        let state = test_state(5);
        state.statusdb.lock(0).lastarrival = Timestamp::new(1, 0);
        evict_if_stale(&state, 0);
        assert!(state.statusdb.lock(0).is_vacant());
    }
}
