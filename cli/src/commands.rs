use clap::Parser;

use rackscan_common::config::{DEFAULT_MAX_RANGE, DEFAULT_WORKERS, MacReport};

#[derive(Parser)]
#[command(name = "rackscan")]
#[command(about = "Discover management controllers and inventory their hardware.")]
pub struct CommandLine {
    /// Comma-separated list of IP addresses to scan for iDRAC presence.
    /// Ranges are allowed, and must be separated by a hyphen.
    /// IPv4 and IPv6 compatible.
    #[arg(long)]
    pub scan: Option<String>,

    /// Username to try to log in as
    #[arg(short = 'u', long, default_value = "")]
    pub username: String,

    /// Password to try and use
    #[arg(short = 'p', long, default_value = "")]
    pub password: String,

    /// Which MACs a discovered node reports: the boot NIC's only, or all interfaces'
    #[arg(long, default_value = "boot-nic")]
    pub mac_report: MacReport,

    /// Number of concurrent probe workers
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Largest address count a single range token may expand to
    #[arg(long, default_value_t = DEFAULT_MAX_RANGE)]
    pub max_range: u128,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
