//! Command-line surface, mirroring the original collector's option table

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "fslatency-collector",
    version,
    about = "Aggregate and classify filesystem write-latency reports received over UDP"
)]
pub struct CollectorArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(long, default_value_t = 57005)]
    pub port: u16,

    #[arg(long, default_value_t = 509)]
    pub maxclient: usize,

    #[arg(long, default_value_t = 600)]
    pub timetoforget: i64,

    #[arg(long, default_value_t = 3)]
    pub udptimeout: i64,

    #[arg(long, default_value_t = 8)]
    pub alarmtimeout: i64,

    #[arg(long, default_value_t = 300)]
    pub statusperiod: u64,

    #[arg(long, default_value_t = 1)]
    pub alarmstatusperiod: u64,

    #[arg(long, default_value_t = 15.0)]
    pub latencythresholdfactor: f64,

    #[arg(long, default_value_t = 60)]
    pub rollingwindow: usize,

    #[arg(long, default_value_t = 60)]
    pub minimummeasurementcount: u64,

    /// Graphite metric path prefix; if set without --graphiteip, metrics print to stdout
    #[arg(long)]
    pub graphitebase: Option<String>,

    #[arg(long)]
    pub graphiteip: Option<String>,

    #[arg(long, default_value_t = 2003)]
    pub graphiteport: u16,

    #[arg(long)]
    pub nomemlock: bool,

    /// Verbosity 1-3; bare --debug is equivalent to --debug=1
    #[arg(long, num_args = 0..=1, default_missing_value = "1")]
    pub debug: Option<u8>,
}
