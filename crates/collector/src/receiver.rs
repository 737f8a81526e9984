//! Foreground datagram receiver: validate, resolve identity, fold into the
//! per-client status entry.

use std::net::UdpSocket;
use std::sync::Arc;

use fslatency_core::datablock::EXTREME_BIG_INTERVAL;
use fslatency_core::wire::MESSAGEBLOCK_LEN;
use fslatency_core::{Messageblock, Timestamp};

use crate::alarm;
use crate::state::CollectorState;

/// Never returns; processes datagrams until the socket errors fatally.
pub fn run(socket: UdpSocket, state: Arc<CollectorState>) -> std::io::Result<()> {
    let mut buf = vec![0u8; MESSAGEBLOCK_LEN + 1];
    loop {
        let n = socket.recv(&mut buf)?;
        let mb = match Messageblock::decode(&buf[..n]) {
            Ok(mb) => mb,
            Err(e) => {
                if state.config.debug > 0 {
                    tracing::debug!(error = %e, "dropped malformed datagram");
                }
                continue;
            }
        };
        handle_message(&state, &mb, Timestamp::now());
    }
}

fn handle_message(state: &CollectorState, mb: &Messageblock, rectime: Timestamp) {
    let key = mb.identity_key();

    let _guard = state.addremove_lock.lock().unwrap();
    let existing = state.registry.find(&key).expect("identity key length is fixed");

    let msgid = match existing {
        Some(id) => id,
        None => match state.registry.add(&key).expect("identity key length is fixed") {
            Some(id) => {
                tracing::info!(
                    msgid = id,
                    hostname = %String::from_utf8_lossy(&mb.hostname),
                    text = %String::from_utf8_lossy(&mb.text),
                    "client added"
                );
                let mut entry = state.statusdb.lock(id);
                entry.lastarrival = rectime;
                entry.clear_alarm();
                for db in mb.datablocks.iter().rev() {
                    if !db.is_empty() {
                        entry.buffer.add(*db);
                    }
                }
                drop(entry);
                return;
            }
            None => {
                tracing::warn!(
                    hostname = %String::from_utf8_lossy(&mb.hostname),
                    text = %String::from_utf8_lossy(&mb.text),
                    "dropped datagram: name registry is full"
                );
                return;
            }
        },
    };

    let mut entry = state.statusdb.lock(msgid);
    entry.lastarrival = rectime;

    match entry.buffer.getlast().copied() {
        None => {
            tracing::warn!(msgid, "known client but ring buffer was empty; healing");
            if let Some(newest) = mb.datablocks.iter().find(|d| !d.is_empty()) {
                entry.buffer.add(*newest);
            }
        }
        Some(last) => {
            for db in mb.datablocks.iter().rev() {
                if db.starttime > last.starttime {
                    entry.buffer.add(*db);
                }
            }
            if mb.datablocks[0].min == EXTREME_BIG_INTERVAL {
                entry.set_alarm(alarm::EMPTY_DATABLOCK, &state.alarmstatus);
            } else {
                entry.unset_alarm(alarm::EMPTY_DATABLOCK);
            }
        }
    }
}
