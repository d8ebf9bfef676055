//! # Boot NIC Selection
//!
//! Picks exactly one onboard interface for network boot, and best-effort
//! ensures it is configured to PXE. Selection is a pure function of the
//! reported NIC set; the configuration half talks back to the controller
//! and never fails the surrounding scan.

use rackscan_common::config::JobPolicy;
use rackscan_common::error::ScanError;
use rackscan_wsman::{ManagementClient, Response, xml};
use tracing::{debug, warn};

use crate::jobs;

pub const RESOURCE_NIC_ENUMERATION: &str =
    "http://schemas.dell.com/wbem/wscim/1/cim-schema/2/DCIM_NICEnumeration";
pub const RESOURCE_NIC_SERVICE: &str =
    "http://schemas.dell.com/wbem/wscim/1/cim-schema/2/DCIM_NICService";

const INTEGRATED_PREFIX: &str = "NIC.Integrated.";
/// LinkSpeed code for gigabit Ethernet.
const GIGABIT: &str = "3";
const BOOT_PROTO_ATTRIBUTE: &str = "LegacyBootProto";
const NETWORK_BOOT_VALUE: &str = "PXE";
const RETURN_OK: &str = "0";
const RETURN_JOB_QUEUED: &str = "4096";

/// Selectors naming the NIC service singleton, sent with every invocation.
const NIC_SERVICE_SELECTORS: [(&str, &str); 4] = [
    ("SystemCreationClassName", "DCIM_ComputerSystem"),
    ("CreationClassName", "DCIM_NICService"),
    ("SystemName", "DCIM:ComputerSystem"),
    ("Name", "DCIM:NICService"),
];

/// One network interface as reported by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicDescriptor {
    /// FQDD-style identifier, e.g. `NIC.Integrated.1-1`.
    pub fqdd: String,
    /// Link-speed code; controllers too old to report one are also too old
    /// to carry 10-gig ports, so a missing code stays eligible.
    pub link_speed: Option<String>,
    /// Current MAC address as reported.
    pub mac: Option<String>,
}

/// Deterministically picks the boot NIC from `nics`.
///
/// Eligible interfaces are integrated and gigabit (or report no link
/// speed). Ties break to the lexicographically smallest FQDD, so identical
/// NIC sets always select the same interface.
pub fn select(nics: &[NicDescriptor]) -> Result<&NicDescriptor, ScanError> {
    nics.iter()
        .filter(|nic| {
            if !nic.fqdd.starts_with(INTEGRATED_PREFIX) {
                debug!("{} is not integrated, skipping", nic.fqdd);
                return false;
            }
            if let Some(speed) = &nic.link_speed {
                if speed.as_str() != GIGABIT {
                    debug!("{} is not a gigabit Ethernet port", nic.fqdd);
                    return false;
                }
            }
            true
        })
        .min_by(|a, b| a.fqdd.cmp(&b.fqdd))
        .ok_or(ScanError::NoEligibleNic)
}

/// Ensures `nic` boots via PXE, scheduling and waiting on a configuration
/// job when the change only takes effect at next boot.
///
/// Best-effort throughout: any failure is logged and the selection stands
/// unconfirmed.
pub async fn ensure_pxe(client: &dyn ManagementClient, nic: &NicDescriptor, policy: &JobPolicy) {
    let fqdd = nic.fqdd.as_str();
    let instance = format!("{fqdd}:{BOOT_PROTO_ATTRIBUTE}");
    let res = match client
        .get(RESOURCE_NIC_ENUMERATION, &[("InstanceID", instance.as_str())])
        .await
    {
        Ok(res) => res,
        Err(err) => {
            warn!("error checking whether {fqdd} can PXE boot: {err}");
            return;
        }
    };
    let current = res
        .body()
        .ok()
        .and_then(|doc| xml::first(doc.root(), "CurrentValue").map(|n| xml::text(n).to_string()));
    if current.as_deref() == Some(NETWORK_BOOT_VALUE) {
        return;
    }

    let params = [
        ("Target", fqdd),
        ("AttributeName", BOOT_PROTO_ATTRIBUTE),
        ("AttributeValue", NETWORK_BOOT_VALUE),
    ];
    let res = match client
        .invoke(
            RESOURCE_NIC_SERVICE,
            "SetAttribute",
            &NIC_SERVICE_SELECTORS,
            &params,
        )
        .await
    {
        Ok(res) => res,
        Err(err) => {
            warn!("error ensuring {fqdd} can PXE boot: {err}");
            return;
        }
    };
    match needs_reboot(&res, fqdd) {
        Some(true) => {}
        _ => return,
    }

    let params = [
        ("Target", fqdd),
        ("RebootJobType", "1"),
        ("ScheduledStartTime", "TIME_NOW"),
    ];
    let res = match client
        .invoke(
            RESOURCE_NIC_SERVICE,
            "CreateTargetedConfigJob",
            &NIC_SERVICE_SELECTORS,
            &params,
        )
        .await
    {
        Ok(res) => res,
        Err(err) => {
            warn!("error scheduling PXE config job for {fqdd}: {err}");
            return;
        }
    };
    let Some(job_id) = queued_job_id(&res, fqdd) else {
        return;
    };
    jobs::wait(client, &job_id, policy).await;
}

/// Whether the attribute change takes effect only after a reboot. `None`
/// when the invocation result was unusable (already logged).
fn needs_reboot(res: &Response, fqdd: &str) -> Option<bool> {
    let doc = res.body().ok()?;
    let Some(output) = xml::first(doc.root(), "SetAttribute_OUTPUT") else {
        warn!("SetAttribute on {fqdd} returned no output element");
        return None;
    };
    let code = xml::first(output, "ReturnValue")
        .map(xml::text)
        .unwrap_or_default();
    if code != RETURN_OK {
        warn!("error ensuring NIC {fqdd} can PXE boot, return code {code:?}");
        return None;
    }
    let reboot = xml::first(output, "RebootRequired")
        .map(xml::text)
        .unwrap_or_default();
    Some(reboot == "Yes")
}

fn queued_job_id(res: &Response, fqdd: &str) -> Option<String> {
    let doc = res.body().ok()?;
    let Some(output) = xml::first(doc.root(), "CreateTargetedConfigJob_OUTPUT") else {
        warn!("CreateTargetedConfigJob on {fqdd} returned no output element");
        return None;
    };
    let code = xml::first(output, "ReturnValue")
        .map(xml::text)
        .unwrap_or_default();
    if code != RETURN_JOB_QUEUED {
        warn!("error scheduling PXE config job for {fqdd}, return code {code:?}");
        return None;
    }
    let Some(reference) = xml::first(doc.root(), "ReferenceParameters") else {
        warn!("no job reference came back for {fqdd}");
        return None;
    };
    let job_id = xml::first_with_attr(reference, "Name", "InstanceID")
        .map(xml::text)
        .unwrap_or_default();
    if job_id.is_empty() {
        warn!("job reference for {fqdd} carries no instance ID");
        return None;
    }
    Some(job_id.to_string())
}
