//! Validated, immutable startup configuration, assembled once from [`AgentArgs`]

use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

use crate::cli::AgentArgs;
use fslatency_core::wire::{HOSTNAME_LEN, TEXT_LEN};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid --serverip {0:?}: {1}")]
    BadServerIp(String, std::net::AddrParseError),
    #[error("cannot determine local hostname: {0}")]
    Hostname(String),
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub server_addr: SocketAddr,
    pub hostname: [u8; HOSTNAME_LEN],
    pub text: [u8; TEXT_LEN],
    pub file: String,
    pub nocheckfs: bool,
    pub nomemlock: bool,
    pub debug: bool,
}

impl AgentConfig {
    pub fn from_args(args: AgentArgs) -> Result<Self, ConfigError> {
        let ip: IpAddr = args
            .serverip
            .parse()
            .map_err(|e| ConfigError::BadServerIp(args.serverip.clone(), e))?;

        let hostname_os = nix::unistd::gethostname()
            .map_err(|e| ConfigError::Hostname(e.to_string()))?;
        let hostname_str = hostname_os.to_string_lossy();

        if args.text.len() > TEXT_LEN {
            tracing::warn!(
                len = args.text.len(),
                limit = TEXT_LEN,
                "--text exceeds the wire field length, truncating"
            );
        }

        Ok(Self {
            server_addr: SocketAddr::new(ip, args.serverport),
            hostname: fslatency_core::wire::truncate_into(&hostname_str),
            text: fslatency_core::wire::truncate_into(&args.text),
            file: args.file,
            nocheckfs: args.nocheckfs,
            nomemlock: args.nomemlock,
            debug: args.debug,
        })
    }
}
