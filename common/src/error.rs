use thiserror::Error;

/// Failures scoped to a single scanned address.
///
/// None of these abort the overall scan. The coordinator collects them per
/// address and the caller decides whether any of them escalate to a nonzero
/// exit once the full pass has finished.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("missing or malformed processor core count: {0}")]
    MalformedCoreCount(String),

    #[error("NIC entry without an FQDD identifier")]
    NicWithoutFqdd,

    #[error("no integrated gigabit NIC is eligible for network boot")]
    NoEligibleNic,
}
