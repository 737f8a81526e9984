//! Multi-thread scenario tests (S1-S6 from the design notes), run against
//! the real collector threads over loopback UDP rather than against any
//! internal, non-public entry point.

use std::net::UdpSocket;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fslatency_collector::cli::CollectorArgs;
use fslatency_collector::config::Config;
use fslatency_collector::state::CollectorState;
use fslatency_collector::{receiver, scanners};
use fslatency_core::{Datablock, Messageblock, Timestamp};
use fslatency_testing::{run_scenario, SuiteReport};

/// Defaults used by every scenario except S6: `timetoforget` is kept well
/// clear of each scenario's own sleeps so time_to_forget never evicts a
/// client out from under an unrelated assertion.
fn quick_args() -> CollectorArgs {
    CollectorArgs {
        bind: "127.0.0.1".into(),
        port: 0,
        maxclient: 8,
        timetoforget: 600,
        udptimeout: 2,
        alarmtimeout: 2,
        statusperiod: 300,
        alarmstatusperiod: 300,
        latencythresholdfactor: 3.0,
        rollingwindow: 8,
        minimummeasurementcount: 4,
        graphitebase: None,
        graphiteip: None,
        graphiteport: 2003,
        nomemlock: true,
        debug: None,
    }
}

/// S6 exercises time_to_forget itself, so it needs a short `timetoforget`.
fn forget_args() -> CollectorArgs {
    CollectorArgs {
        timetoforget: 3,
        ..quick_args()
    }
}

/// Stands up a collector (receiver + every housekeeping scanner) on an
/// ephemeral loopback port and hands back the shared state plus a client
/// socket already connected to it.
fn spawn_collector(args: CollectorArgs) -> (Arc<CollectorState>, UdpSocket) {
    let config = Config::from_args(args).expect("valid test config");
    let state = Arc::new(CollectorState::new(config).expect("registry within capacity"));

    let server_socket = UdpSocket::bind("127.0.0.1:0").expect("bind collector socket");
    let addr = server_socket.local_addr().unwrap();

    let receiver_state = Arc::clone(&state);
    thread::spawn(move || {
        let _ = receiver::run(server_socket, receiver_state);
    });

    macro_rules! spawn_scanner {
        ($module:path) => {{
            let state = Arc::clone(&state);
            thread::spawn(move || $module(state));
        }};
    }
    spawn_scanner!(scanners::statistical_alarmer::run);
    spawn_scanner!(scanners::udp_timeout::run);
    spawn_scanner!(scanners::time_to_forget::run);
    spawn_scanner!(scanners::alarm_silencer::run);

    let client = UdpSocket::bind("127.0.0.1:0").expect("bind client socket");
    client.connect(addr).expect("connect client socket");
    (state, client)
}

fn send(client: &UdpSocket, mb: &Messageblock) {
    client.send(&mb.encode()).expect("send datagram");
}

fn datablock(start: i64, min: f64, max: f64, n: u64) -> Datablock {
    Datablock {
        measurementcount: n,
        starttime: Timestamp::new(start, 0),
        endtime: Timestamp::new(start, 1),
        min,
        max,
        sumx: min * n as f64,
        sumxx: min * min * n as f64,
    }
}

fn s1_wire_round_trip() -> Result<(), String> {
    let mb = Messageblock::new("h1", "", Timestamp::ZERO);
    let bytes = mb.encode();
    let back = Messageblock::decode(&bytes).map_err(|e| e.to_string())?;
    if mb != back {
        return Err("decoded messageblock did not match the original".into());
    }
    Ok(())
}

fn s2_version_drop() -> Result<(), String> {
    let (state, client) = spawn_collector(quick_args());
    let mut bytes = Messageblock::new("h2", "", Timestamp::ZERO).encode();
    bytes[16] = 9; // corrupt major version
    client.send(&bytes).map_err(|e| e.to_string())?;
    thread::sleep(Duration::from_millis(200));
    if state.registry.used() != 0 {
        return Err(format!("expected 0 clients, got {}", state.registry.used()));
    }
    Ok(())
}

fn s3_new_client() -> Result<(), String> {
    let (state, client) = spawn_collector(quick_args());
    let mut mb = Messageblock::new("h3", "", Timestamp::ZERO);
    mb.datablocks[0] = datablock(10, 0.0, 0.0, 120);
    send(&client, &mb);
    thread::sleep(Duration::from_millis(200));

    if state.registry.used() != 1 {
        return Err(format!("expected 1 client, got {}", state.registry.used()));
    }
    let id = state
        .registry
        .find(&mb.identity_key())
        .map_err(|e| e.to_string())?
        .ok_or("new client not found in registry")?;
    let entry = state.statusdb.lock(id);
    if entry.lastarrival.is_zero() {
        return Err("lastarrival was never stamped".into());
    }
    Ok(())
}

fn s4_statistical_high() -> Result<(), String> {
    let (state, client) = spawn_collector(quick_args());
    let mut priming = Messageblock::new("h4", "", Timestamp::ZERO);
    for (i, slot) in priming.datablocks.iter_mut().enumerate() {
        *slot = datablock(i as i64, 0.0, 0.0, 100);
    }
    send(&client, &priming);
    thread::sleep(Duration::from_millis(1200));

    let mut spike = Messageblock::new("h4", "", Timestamp::ZERO);
    spike.datablocks[0] = datablock(100, 0.0, 10.0, 100);
    send(&client, &spike);
    thread::sleep(Duration::from_millis(1200));

    let id = state
        .registry
        .find(&spike.identity_key())
        .map_err(|e| e.to_string())?
        .ok_or("client missing from registry")?;
    if state.statusdb.lock(id).alarm & fslatency_collector::alarm::STAT_HIGH == 0 {
        return Err("expected STAT_HIGH to be set after the spike".into());
    }

    // The spike stays "newest" (and so keeps re-tripping the alarm) until a
    // calmer datablock arrives behind it; send one and give the statistical
    // scanner a tick to reclassify before checking the bit clears.
    let mut calm = Messageblock::new("h4", "", Timestamp::ZERO);
    calm.datablocks[0] = datablock(101, 0.0, 0.0, 100);
    send(&client, &calm);
    thread::sleep(Duration::from_millis(1500));

    if state.statusdb.lock(id).alarm & fslatency_collector::alarm::STAT_HIGH != 0 {
        return Err("expected STAT_HIGH to clear once a calm datablock became newest".into());
    }
    Ok(())
}

fn s5_udp_timeout() -> Result<(), String> {
    let (state, client) = spawn_collector(quick_args());
    send(&client, &Messageblock::new("h5", "", Timestamp::ZERO));
    thread::sleep(Duration::from_millis(200));
    let id = state
        .registry
        .find(&Messageblock::new("h5", "", Timestamp::ZERO).identity_key())
        .map_err(|e| e.to_string())?
        .ok_or("client missing from registry")?;

    thread::sleep(Duration::from_secs(3));
    if state.statusdb.lock(id).alarm & fslatency_collector::alarm::UDP_TIMEOUT == 0 {
        return Err("expected UDP_TIMEOUT after silence".into());
    }

    // Resuming traffic only stops udp_timeout from re-flagging the client;
    // only the AlarmSilencer clears the bit, once alarmtimeout has passed
    // since it was last (re)stamped.
    send(&client, &Messageblock::new("h5", "", Timestamp::ZERO));
    thread::sleep(Duration::from_secs(4));
    if state.statusdb.lock(id).alarm & fslatency_collector::alarm::UDP_TIMEOUT != 0 {
        return Err("expected the silencer to clear UDP_TIMEOUT after alarmtimeout".into());
    }
    Ok(())
}

fn s6_forget() -> Result<(), String> {
    let (state, client) = spawn_collector(forget_args());
    send(&client, &Messageblock::new("h6", "", Timestamp::ZERO));
    thread::sleep(Duration::from_millis(200));
    let before = state.registry.used();

    thread::sleep(Duration::from_secs(4));
    if state.registry.used() != before - 1 {
        return Err(format!(
            "expected registry.used() to drop by one, was {before} now {}",
            state.registry.used()
        ));
    }

    let mut new_client = Messageblock::new("h6-new", "", Timestamp::ZERO);
    new_client.datablocks[0] = datablock(1, 0.0, 0.0, 1);
    send(&client, &new_client);
    thread::sleep(Duration::from_millis(200));
    if state.registry.used() != before {
        return Err("expected the freed id to be reusable by a new client".into());
    }
    Ok(())
}

#[test]
fn fslatency_scenarios() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut report = SuiteReport::default();
    report.push(run_scenario("S1 wire round trip", s1_wire_round_trip));
    report.push(run_scenario("S2 version drop", s2_version_drop));
    report.push(run_scenario("S3 new client", s3_new_client));
    report.push(run_scenario("S4 statistical high", s4_statistical_high));
    report.push(run_scenario("S5 udp timeout", s5_udp_timeout));
    report.push(run_scenario("S6 forget", s6_forget));

    for failure in report.failures() {
        eprintln!("FAILED {}: {:?}", failure.name, failure.detail);
    }
    assert!(report.all_passed(), "one or more scenario tests failed");
}
