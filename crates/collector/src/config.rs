//! Validated, immutable startup configuration, assembled once from [`CollectorArgs`]

use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

use crate::cli::CollectorArgs;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid --bind {0:?}: {1}")]
    BadBind(String, std::net::AddrParseError),
    #[error("invalid --graphiteip {0:?}: {1}")]
    BadGraphiteIp(String, std::net::AddrParseError),
    #[error("--timetoforget must be >= 3 and greater than --udptimeout")]
    BadTimeToForget,
    #[error("--udptimeout must be >= 2")]
    BadUdpTimeout,
    #[error("--rollingwindow must be >= 8")]
    BadRollingWindow,
    #[error("--minimummeasurementcount is too high or --rollingwindow is too low: (rollingwindow - 1) * 9 must be >= minimummeasurementcount")]
    BadMinimumMeasurementCount,
    #[error("--latencythresholdfactor must be a positive float")]
    BadLatencyThresholdFactor,
    #[error("--maxclient must be non-zero")]
    BadMaxClient,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub maxclient: usize,
    pub timetoforget: i64,
    pub udptimeout: i64,
    pub alarmtimeout: i64,
    pub statusperiod: u64,
    pub alarmstatusperiod: u64,
    pub latencythresholdfactor: f64,
    pub rollingwindow: usize,
    pub minimummeasurementcount: u64,
    pub graphitebase: Option<String>,
    pub graphite_addr: Option<SocketAddr>,
    pub nomemlock: bool,
    pub debug: u8,
}

impl Config {
    pub fn from_args(args: CollectorArgs) -> Result<Self, ConfigError> {
        let bind_ip: IpAddr = args
            .bind
            .parse()
            .map_err(|e| ConfigError::BadBind(args.bind.clone(), e))?;

        if args.maxclient == 0 {
            return Err(ConfigError::BadMaxClient);
        }
        if args.timetoforget < 3 || args.udptimeout >= args.timetoforget {
            return Err(ConfigError::BadTimeToForget);
        }
        if args.udptimeout < 2 {
            return Err(ConfigError::BadUdpTimeout);
        }
        if args.rollingwindow < 8 {
            return Err(ConfigError::BadRollingWindow);
        }
        if (args.rollingwindow as u64 - 1) * 9 < args.minimummeasurementcount {
            return Err(ConfigError::BadMinimumMeasurementCount);
        }
        if args.latencythresholdfactor <= 0.0 {
            return Err(ConfigError::BadLatencyThresholdFactor);
        }

        if args.graphitebase.is_some() && args.graphiteip.is_none() {
            tracing::warn!(
                "--graphitebase given without --graphiteip; printing graphite metrics to stdout"
            );
        }
        if args.graphitebase.is_none() && args.graphiteip.is_some() {
            tracing::warn!("--graphiteip given without --graphitebase; ignoring --graphiteip");
        }

        let graphite_addr = match (&args.graphitebase, &args.graphiteip) {
            (Some(_), Some(ip)) => {
                let addr: IpAddr = ip
                    .parse()
                    .map_err(|e| ConfigError::BadGraphiteIp(ip.clone(), e))?;
                Some(SocketAddr::new(addr, args.graphiteport))
            }
            _ => None,
        };

        Ok(Self {
            bind_addr: SocketAddr::new(bind_ip, args.port),
            maxclient: args.maxclient,
            timetoforget: args.timetoforget,
            udptimeout: args.udptimeout,
            alarmtimeout: args.alarmtimeout,
            statusperiod: args.statusperiod,
            alarmstatusperiod: args.alarmstatusperiod,
            latencythresholdfactor: args.latencythresholdfactor,
            rollingwindow: args.rollingwindow,
            minimummeasurementcount: args.minimummeasurementcount,
            graphitebase: args.graphitebase,
            graphite_addr,
            nomemlock: args.nomemlock,
            debug: args.debug.unwrap_or(0),
        })
    }
}
