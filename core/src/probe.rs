//! # Management Endpoint Probing
//!
//! One probe per scan task: confirm a supported controller answers at the
//! address, then read its hardware inventory. Individual reads tolerate
//! partial failure with a `"-1"` sentinel; malformed core counts and boot
//! NIC selection failures fail the task, but stay scoped to that one
//! address.

use rackscan_common::config::{MacReport, ScanConfig};
use rackscan_common::error::ScanError;
use rackscan_common::model::{InventoryRecord, ScanTask};
use rackscan_wsman::{ManagementClient, Response, xml};
use tracing::{info, warn};

use crate::bootnic::{self, NicDescriptor};

pub const RESOURCE_SYSTEM_VIEW: &str =
    "http://schemas.dell.com/wbem/wscim/1/cim-schema/2/DCIM_SystemView";
pub const RESOURCE_CPU_VIEW: &str =
    "http://schemas.dell.com/wbem/wscim/1/cim-schema/2/DCIM_CPUView";
pub const RESOURCE_VIRTUAL_DISK_VIEW: &str =
    "http://schemas.dell.com/wbem/wscim/1/cim-schema/2/DCIM_VirtualDiskView";
pub const RESOURCE_NIC_VIEW: &str =
    "http://schemas.dell.com/wbem/wscim/1/cim-schema/2/DCIM_NICView";

const EMBEDDED_SYSTEM: (&str, &str) = ("InstanceID", "System.Embedded.1");
const PRODUCT_NAME: &str = "iDRAC";
/// `pm_type` value consumed by the provisioning pipeline.
const MANAGEMENT_TYPE: &str = "pxe_drac";
/// The controller family only ships on this architecture.
const ARCHITECTURE: &str = "x86_64";
/// Sentinel for a field that could not be read.
const UNKNOWN: &str = "-1";

/// Result of probing one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A confirmed controller with its inventory.
    Record(InventoryRecord),
    /// Nothing answered, or whatever answered is not a supported controller.
    Skipped,
    /// A confirmed controller whose inventory could not be trusted.
    Error(ScanError),
}

/// Probes one address and, when a supported controller is confirmed,
/// assembles its [`InventoryRecord`].
pub async fn probe(
    client: &dyn ManagementClient,
    task: &ScanTask,
    cfg: &ScanConfig,
) -> ScanOutcome {
    if !is_supported_controller(client).await {
        return ScanOutcome::Skipped;
    }
    let memory = read_memory(client).await;
    let cpu = match read_cpu(client).await {
        Ok(cpu) => cpu,
        Err(err) => return ScanOutcome::Error(err),
    };
    let disk = read_disk(client).await;
    let mac = match read_macs(client, cfg).await {
        Ok(mac) => mac,
        Err(err) => return ScanOutcome::Error(err),
    };
    ScanOutcome::Record(InventoryRecord {
        management_type: MANAGEMENT_TYPE.to_string(),
        username: task.username.clone(),
        password: task.password.clone(),
        address: task.address.to_string(),
        mac,
        cpu,
        memory,
        disk,
        arch: ARCHITECTURE.to_string(),
    })
}

async fn is_supported_controller(client: &dyn ManagementClient) -> bool {
    let res = match client.identify().await {
        Ok(res) => res,
        Err(_) => {
            info!("no WS-Management endpoint at {}", client.endpoint());
            return false;
        }
    };
    let product = res
        .body()
        .ok()
        .and_then(|doc| xml::first(doc.root(), "ProductName").map(|n| xml::text(n).to_string()));
    if product.as_deref() == Some(PRODUCT_NAME) {
        info!("found {PRODUCT_NAME} at {}", client.endpoint());
        true
    } else {
        info!(
            "no {PRODUCT_NAME} at WS-Management endpoint {}",
            client.endpoint()
        );
        false
    }
}

async fn read_memory(client: &dyn ManagementClient) -> String {
    let res = match client
        .enumerate(RESOURCE_SYSTEM_VIEW, &[EMBEDDED_SYSTEM])
        .await
    {
        Ok(res) => res,
        Err(err) => {
            warn!("error getting memory: {err}");
            return UNKNOWN.to_string();
        }
    };
    let size = res
        .body()
        .ok()
        .and_then(|doc| xml::first(doc.root(), "SysMemTotalSize").map(|n| xml::text(n).to_string()));
    match size {
        Some(size) if !size.is_empty() => size,
        _ => {
            warn!("could not find total system memory");
            UNKNOWN.to_string()
        }
    }
}

async fn read_disk(client: &dyn ManagementClient) -> String {
    let res = match client
        .enumerate(RESOURCE_VIRTUAL_DISK_VIEW, &[EMBEDDED_SYSTEM])
        .await
    {
        Ok(res) => res,
        Err(err) => {
            warn!("error getting disks: {err}");
            return UNKNOWN.to_string();
        }
    };
    match res.body() {
        Ok(doc) => xml::all(doc.root(), "DCIM_VirtualDiskView").len().to_string(),
        Err(err) => {
            warn!("error reading disk enumeration: {err}");
            UNKNOWN.to_string()
        }
    }
}

/// Sums enabled cores across every processor entry.
///
/// A processor entry without a parseable core count poisons the whole
/// figure, so it fails the task rather than reporting a wrong total.
async fn read_cpu(client: &dyn ManagementClient) -> Result<String, ScanError> {
    let res = match client.enumerate(RESOURCE_CPU_VIEW, &[EMBEDDED_SYSTEM]).await {
        Ok(res) => res,
        Err(err) => {
            warn!("error getting cpus: {err}");
            return Ok(UNKNOWN.to_string());
        }
    };
    let doc = match res.body() {
        Ok(doc) => doc,
        Err(err) => {
            warn!("error reading cpu enumeration: {err}");
            return Ok(UNKNOWN.to_string());
        }
    };
    let mut active_cores: u64 = 0;
    for proc in xml::all(doc.root(), "DCIM_CPUView") {
        let Some(cores) = xml::first(proc, "NumberOfEnabledCores") else {
            return Err(ScanError::MalformedCoreCount(
                "processor entry without NumberOfEnabledCores".to_string(),
            ));
        };
        let text = xml::text(cores);
        let count: u64 = text.parse().map_err(|_| {
            ScanError::MalformedCoreCount(format!("cannot parse {text:?} as an integer"))
        })?;
        active_cores += count;
    }
    Ok(active_cores.to_string())
}

async fn read_macs(
    client: &dyn ManagementClient,
    cfg: &ScanConfig,
) -> Result<Vec<String>, ScanError> {
    let res = match client.enumerate(RESOURCE_NIC_VIEW, &[EMBEDDED_SYSTEM]).await {
        Ok(res) => res,
        Err(err) => {
            warn!("error getting nics: {err}");
            return Ok(Vec::new());
        }
    };
    let nics = parse_nics(&res)?;
    match cfg.mac_report {
        MacReport::All => {
            let mut macs: Vec<String> = nics
                .iter()
                .filter_map(|nic| nic.mac.as_deref())
                .map(str::to_ascii_lowercase)
                .collect();
            macs.sort();
            Ok(macs)
        }
        MacReport::BootNic => {
            let selected = bootnic::select(&nics)?;
            bootnic::ensure_pxe(client, selected, &cfg.job_policy).await;
            match selected.mac.as_deref() {
                Some(mac) => Ok(vec![mac.to_ascii_lowercase()]),
                None => {
                    warn!("{} reports no current MAC address", selected.fqdd);
                    Ok(Vec::new())
                }
            }
        }
    }
}

fn parse_nics(res: &Response) -> Result<Vec<NicDescriptor>, ScanError> {
    let doc = match res.body() {
        Ok(doc) => doc,
        Err(err) => {
            warn!("error reading nic enumeration: {err}");
            return Ok(Vec::new());
        }
    };
    let mut nics = Vec::new();
    for view in xml::all(doc.root(), "DCIM_NICView") {
        let Some(fqdd) = xml::first(view, "FQDD") else {
            return Err(ScanError::NicWithoutFqdd);
        };
        nics.push(NicDescriptor {
            fqdd: xml::text(fqdd).to_string(),
            link_speed: xml::first(view, "LinkSpeed").map(|n| xml::text(n).to_string()),
            mac: xml::first(view, "CurrentMACAddress").map(|n| xml::text(n).to_string()),
        });
    }
    Ok(nics)
}
