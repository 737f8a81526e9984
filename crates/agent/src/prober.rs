//! Prober thread: timed synchronous write + fsync, one probe every 100ms

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use fslatency_core::{RingBuffer, Timestamp};
use thiserror::Error;

pub const PROBE_PERIOD: Duration = Duration::from_millis(100);
const PROBE_PAYLOAD_LEN: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct BufferEntry {
    pub begin: Timestamp,
    pub end: Timestamp,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("cannot seek probe file: {0}")]
    Seek(std::io::Error),
    #[error("cannot write probe file: {0}")]
    Write(std::io::Error),
    #[error("cannot fsync probe file: {0}")]
    Fsync(std::io::Error),
}

/// Any probe I/O failure is fatal; the caller exits the process on `Err`.
pub fn run(
    mut file: File,
    buffer: Arc<Mutex<RingBuffer<BufferEntry>>>,
    debug: bool,
) -> Result<(), ProbeError> {
    if debug {
        tracing::debug!("prober loop starting");
    }
    loop {
        let begin = Timestamp::now();
        let payload = format!(
            "{:9}.{:08}           \n",
            begin.sec,
            begin.nsec / 10
        );
        let mut bytes = payload.into_bytes();
        bytes.resize(PROBE_PAYLOAD_LEN, b' ');

        file.seek(SeekFrom::Start(0)).map_err(ProbeError::Seek)?;
        file.write_all(&bytes).map_err(ProbeError::Write)?;
        file.sync_all().map_err(ProbeError::Fsync)?;

        let end = Timestamp::now();
        buffer.lock().unwrap().add(BufferEntry { begin, end });

        thread::sleep(PROBE_PERIOD);
    }
}
