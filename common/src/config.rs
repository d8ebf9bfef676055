use std::str::FromStr;
use std::time::Duration;

/// Number of concurrent probe workers when the caller does not override it.
pub const DEFAULT_WORKERS: usize = 100;

/// Largest address count a single range token may expand to by default.
///
/// An unbounded IPv6 span would otherwise keep the producer busy forever;
/// callers that really want a bigger sweep raise the limit explicitly.
pub const DEFAULT_MAX_RANGE: u128 = 65_536;

/// Which MAC addresses a confirmed controller reports.
///
/// Both shapes shipped as product behavior at different times, so the
/// choice is explicit rather than guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacReport {
    /// Only the MAC of the NIC selected for network boot. Selecting the
    /// NIC also ensures it is configured to PXE boot.
    #[default]
    BootNic,
    /// Every interface MAC, lower-cased and sorted. No boot
    /// reconfiguration is attempted in this mode.
    All,
}

impl FromStr for MacReport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boot-nic" | "bootnic" => Ok(MacReport::BootNic),
            "all" => Ok(MacReport::All),
            _ => Err(format!("invalid MAC report mode: {s} (expected boot-nic or all)")),
        }
    }
}

/// Polling policy for asynchronous configuration jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPolicy {
    /// Wall-clock wait between status polls.
    pub interval: Duration,
    /// Polls attempted before the wait is reported as timed out.
    pub max_polls: u32,
}

impl Default for JobPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_polls: 60,
        }
    }
}

/// Scan-wide settings, assembled once from the command line.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Username presented to every probed endpoint.
    pub username: String,
    /// Password presented to every probed endpoint.
    pub password: String,
    /// Size of the probe worker pool.
    pub workers: usize,
    /// MAC reporting mode, see [`MacReport`].
    pub mac_report: MacReport,
    /// Per-token expansion cap, see [`DEFAULT_MAX_RANGE`].
    pub max_range: u128,
    /// Configuration-job polling policy.
    pub job_policy: JobPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            workers: DEFAULT_WORKERS,
            mac_report: MacReport::default(),
            max_range: DEFAULT_MAX_RANGE,
            job_policy: JobPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_report_parses_both_modes() {
        assert_eq!(MacReport::from_str("boot-nic"), Ok(MacReport::BootNic));
        assert_eq!(MacReport::from_str("ALL"), Ok(MacReport::All));
        assert!(MacReport::from_str("some").is_err());
    }
}
