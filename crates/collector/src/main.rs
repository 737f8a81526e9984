//! fslatency-collector: aggregates per-client write-latency reports over
//! UDP, classifies anomalies, and reports them on a steady cadence.

use std::net::UdpSocket;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fslatency_collector::cli::CollectorArgs;
use fslatency_collector::config::Config;
use fslatency_collector::state::CollectorState;
use fslatency_collector::{graphite, receiver, reporters, scanners};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let args = CollectorArgs::parse();
    let config = match Config::from_args(args) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

fn run(config: Config) -> Result<(), ExitCode> {
    let bind_addr = config.bind_addr;
    let has_graphite = config.graphitebase.is_some();
    let nomemlock = config.nomemlock;

    let state = Arc::new(CollectorState::new(config).map_err(|e| {
        tracing::error!(error = %e, "cannot initialize client databases");
        ExitCode::from(1)
    })?);
    tracing::debug!(maxclient = state.statusdb.len(), "initialization done");

    let socket = UdpSocket::bind(bind_addr).map_err(|e| {
        tracing::error!(error = %e, addr = %bind_addr, "cannot bind");
        ExitCode::from(1)
    })?;

    macro_rules! spawn_scanner {
        ($name:literal, $module:path) => {{
            let state = Arc::clone(&state);
            thread::spawn(move || $module(state));
            tracing::debug!(concat!("thread start: ", $name));
        }};
    }

    spawn_scanner!("statistical_alarmer", scanners::statistical_alarmer::run);
    spawn_scanner!("timetoforget", scanners::time_to_forget::run);
    spawn_scanner!("alarmsilencer", scanners::alarm_silencer::run);
    spawn_scanner!("udptimeout", scanners::udp_timeout::run);
    spawn_scanner!("alarmstatus", reporters::run_alarm);
    spawn_scanner!("normalstatus", reporters::run_normal);

    if has_graphite {
        spawn_scanner!("graphite", graphite::run);
    }

    if !nomemlock {
        thread::sleep(Duration::from_secs(1));
        let retval = unsafe { libc::mlockall(libc::MCL_CURRENT) };
        if retval < 0 {
            let err = std::io::Error::last_os_error();
            tracing::error!(error = %err, "cannot mlockall");
            return Err(ExitCode::from(2));
        }
    }

    receiver::run(socket, state).map_err(|e| {
        tracing::error!(error = %e, "receiver loop exited with an error");
        ExitCode::from(1)
    })
}
