//! Command-line surface, mirroring the original tool's option table

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "fslatency-agent",
    version,
    about = "Measure local filesystem write latency and publish summaries over UDP"
)]
pub struct AgentArgs {
    /// Collector address, dotted IPv4
    #[arg(long)]
    pub serverip: String,

    /// Collector UDP port
    #[arg(long, default_value_t = 57005)]
    pub serverport: u16,

    /// Free-form identity tag included in every datagram, truncated to 64 bytes
    #[arg(long, default_value = "")]
    pub text: String,

    /// Path to the regular file used for timed writes
    #[arg(long)]
    pub file: String,

    /// Skip the local-filesystem-type check on --file
    #[arg(long)]
    pub nocheckfs: bool,

    /// Skip mlockall(MCL_CURRENT) after startup
    #[arg(long)]
    pub nomemlock: bool,

    /// Verbose diagnostic logging
    #[arg(long)]
    pub debug: bool,
}
