//! fslatency-agent: measures local filesystem write latency and publishes
//! per-second summaries to a collector over UDP.

mod cli;
mod config;
mod fs_check;
mod memlock;
mod prober;
mod publisher;

use std::fs::OpenOptions;
use std::net::UdpSocket;
use std::os::unix::fs::OpenOptionsExt;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;
use fslatency_core::{RingBuffer, Timestamp};
use tracing_subscriber::EnvFilter;

use cli::AgentArgs;
use config::{AgentConfig, ConfigError};
use prober::BufferEntry;

/// Prime ring-buffer capacity, matching the original tool's choice.
const RINGBUFFER_CAPACITY: usize = 503;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let args = AgentArgs::parse();
    let config = match AgentConfig::from_args(args) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return exit_for_config_error(&e);
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

fn exit_for_config_error(_e: &ConfigError) -> ExitCode {
    ExitCode::from(2)
}

fn run(config: AgentConfig) -> Result<(), ExitCode> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .custom_flags(libc::O_SYNC | libc::O_DSYNC | libc::O_NOATIME)
        .open(&config.file)
        .map_err(|e| {
            tracing::error!(error = %e, file = %config.file, "cannot open probe file for write");
            ExitCode::from(1)
        })?;

    let metadata = file.metadata().map_err(|_| ExitCode::from(2))?;
    if !metadata.is_file() {
        tracing::error!("probe path is not a regular file");
        return Err(ExitCode::from(2));
    }

    if !config.nocheckfs {
        fs_check::check_local_fs(&file).map_err(|e| {
            tracing::error!(error = %e, "filesystem check failed");
            ExitCode::from(2)
        })?;
    }

    let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| {
        tracing::error!(error = %e, "cannot allocate udp socket");
        ExitCode::from(1)
    })?;
    socket.connect(config.server_addr).map_err(|e| {
        tracing::error!(error = %e, addr = %config.server_addr, "cannot connect to collector");
        ExitCode::from(1)
    })?;

    let buffer: Arc<Mutex<RingBuffer<BufferEntry>>> =
        Arc::new(Mutex::new(RingBuffer::new(RINGBUFFER_CAPACITY)));

    let prober_buffer = Arc::clone(&buffer);
    let prober_file = file.try_clone().map_err(|_| ExitCode::from(2))?;
    let debug = config.debug;
    let prober_handle = thread::spawn(move || prober::run(prober_file, prober_buffer, debug));
    tracing::debug!("prober thread started");

    // clock_getres is not directly exposed on stable std; nanosecond is a
    // reasonable stand-in for the precision field, which is advisory only.
    let precision = Timestamp::new(0, 1);
    tracing::debug!(nsec = precision.nsec, "time precision reported to collector");

    let publisher_buffer = Arc::clone(&buffer);
    let hostname = config.hostname;
    let text = config.text;
    thread::spawn(move || {
        publisher::run(socket, publisher_buffer, hostname, text, precision, debug)
    });
    tracing::debug!("publisher thread started");

    if !config.nomemlock {
        thread::sleep(Duration::from_secs(1));
        if let Err(e) = memlock::lock_current_memory() {
            tracing::error!(error = %e, "cannot mlockall");
            return Err(ExitCode::from(2));
        }
    }

    match prober_handle.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "prober loop exited with an error");
            Err(ExitCode::from(2))
        }
        Err(_) => {
            tracing::error!("prober thread panicked");
            Err(ExitCode::from(2))
        }
    }
}
