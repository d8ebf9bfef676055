use std::net::IpAddr;

use serde::Serialize;

/// One unit of probe work: a single address plus the credentials to try.
///
/// Moved by value into exactly one worker; never shared.
#[derive(Debug, Clone)]
pub struct ScanTask {
    pub address: IpAddr,
    pub username: String,
    pub password: String,
}

/// Hardware facts for one confirmed management controller.
///
/// Serialized field names match the provisioning document consumed
/// downstream, hence the `pm_*` renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRecord {
    #[serde(rename = "pm_type")]
    pub management_type: String,
    #[serde(rename = "pm_user")]
    pub username: String,
    #[serde(rename = "pm_password")]
    pub password: String,
    #[serde(rename = "pm_addr")]
    pub address: String,
    pub mac: Vec<String>,
    pub cpu: String,
    pub memory: String,
    pub disk: String,
    pub arch: String,
}

/// The top-level output document.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryDocument {
    pub nodes: Vec<InventoryRecord>,
}
