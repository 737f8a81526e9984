//! Publisher thread: once per second, fold the ring buffer and send a datagram

use std::net::UdpSocket;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use fslatency_core::datablock::DATABLOCKARRAY_LEN;
use fslatency_core::{Datablock, DatablockFold, Messageblock, RingBuffer, Timestamp};

use crate::prober::BufferEntry;

pub const PUBLISH_PERIOD: Duration = Duration::from_secs(1);

pub fn run(
    socket: UdpSocket,
    buffer: Arc<Mutex<RingBuffer<BufferEntry>>>,
    hostname: [u8; 64],
    text: [u8; 64],
    precision: Timestamp,
    debug: bool,
) -> ! {
    let mut message = Messageblock::new("", "", precision);
    message.hostname = hostname;
    message.text = text;

    loop {
        thread::sleep(PUBLISH_PERIOD);

        let snapshot = buffer.lock().unwrap().take_snapshot();
        let mut fold = DatablockFold::new();
        for entry in snapshot.iter() {
            fold.add_sample(entry.begin, entry.end);
        }
        let newest = fold.finish();

        shift_history(&mut message.datablocks, newest);

        if debug {
            tracing::debug!(?newest, "folded datablock");
        }

        let bytes = message.encode();
        if let Err(e) = socket.send(&bytes) {
            if debug {
                tracing::debug!(error = %e, "udp send failed");
            }
        }
    }
}

fn shift_history(history: &mut [Datablock; DATABLOCKARRAY_LEN], newest: Datablock) {
    for i in (1..DATABLOCKARRAY_LEN).rev() {
        history[i] = history[i - 1];
    }
    history[0] = newest;
}
