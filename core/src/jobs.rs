//! # Configuration Job Monitoring
//!
//! Hardware changes that need a reboot are applied through a server-side
//! job; this module polls such a job to a terminal state. Status
//! transitions are only ever observed, never driven from here.

use rackscan_common::config::JobPolicy;
use rackscan_wsman::{ManagementClient, xml};
use tracing::{info, warn};

pub const RESOURCE_LIFECYCLE_JOB: &str =
    "http://schemas.dell.com/wbem/wscim/1/cim-schema/2/DCIM_LifecycleJob";

const STATUS_COMPLETED: &str = "Completed";
const STATUS_COMPLETED_WITH_ERRORS: &str = "Completed with Errors";
const STATUS_FAILED: &str = "Failed";

/// Terminal result of waiting on one configuration job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job reached `Completed`.
    Succeeded,
    /// The job reached a failed terminal status (carried verbatim).
    Failed(String),
    /// Polling died on a transport error; no terminal status was observed.
    TransportFailed,
    /// The poll budget ran out before a terminal status appeared.
    TimedOut,
}

/// Polls `job_id` once per [`JobPolicy::interval`] until it reaches a
/// terminal status or the budget runs out.
///
/// Any unrecognized status (including the implicit initial running state)
/// means another wait-and-poll cycle. Intermediate statuses are not logged
/// individually; only entry and the terminal outcome are.
pub async fn wait(client: &dyn ManagementClient, job_id: &str, policy: &JobPolicy) -> JobOutcome {
    info!("{}: waiting for job {job_id} to finish", client.endpoint());
    let mut last_status = String::new();
    for _ in 0..policy.max_polls {
        tokio::time::sleep(policy.interval).await;
        let res = match client
            .get(RESOURCE_LIFECYCLE_JOB, &[("InstanceID", job_id)])
            .await
        {
            Ok(res) => res,
            Err(err) => {
                warn!("error monitoring job {job_id}: {err}");
                return JobOutcome::TransportFailed;
            }
        };
        let Ok(doc) = res.body() else {
            warn!("unreadable status for job {job_id}");
            return JobOutcome::TransportFailed;
        };
        let status = xml::first(doc.root(), "JobStatus")
            .map(xml::text)
            .unwrap_or_default()
            .to_string();
        match status.as_str() {
            STATUS_COMPLETED => {
                info!("job {job_id} finished with {status}");
                return JobOutcome::Succeeded;
            }
            STATUS_COMPLETED_WITH_ERRORS | STATUS_FAILED => {
                info!("job {job_id} finished with {status}");
                return JobOutcome::Failed(status);
            }
            _ => last_status = status,
        }
    }
    warn!(
        "job {job_id} still {last_status:?} after {} polls, giving up",
        policy.max_polls
    );
    JobOutcome::TimedOut
}
