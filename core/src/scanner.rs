//! # Scan Coordination
//!
//! Fans the expanded address specification out over a fixed worker pool and
//! fans the results back into one report.
//!
//! The producer feeds a bounded task queue (capacity = pool size), so
//! expansion throttles when workers fall behind. Each worker owns a clone
//! of the results sender; when the last worker exits, the results channel
//! closes, so draining it doubles as the all-workers-finished signal.
//! Joining the pool afterwards is an explicit barrier that also surfaces
//! worker panics.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::warn;

use rackscan_common::config::ScanConfig;
use rackscan_common::error::ScanError;
use rackscan_common::model::{InventoryRecord, ScanTask};
use rackscan_common::network::range;
use rackscan_wsman::{HttpClient, ManagementClient, WsmanError};

use crate::probe::{self, ScanOutcome};

/// Builds one protocol client per scan task.
///
/// The seam that lets tests swap scripted endpoints in for real ones.
pub trait ClientFactory: Send + Sync {
    fn client_for(&self, task: &ScanTask) -> Result<Arc<dyn ManagementClient>, WsmanError>;
}

/// Real HTTPS clients for production scans.
pub struct WsmanFactory;

impl ClientFactory for WsmanFactory {
    fn client_for(&self, task: &ScanTask) -> Result<Arc<dyn ManagementClient>, WsmanError> {
        Ok(Arc::new(HttpClient::new(
            task.address,
            &task.username,
            &task.password,
        )?))
    }
}

/// Aggregate of one scan pass.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Confirmed controllers, in no particular order.
    pub records: Vec<InventoryRecord>,
    /// Task-scoped failures, keyed by the address that produced them.
    pub errors: Vec<(String, ScanError)>,
}

/// Expands `spec` and probes every named address through a pool of
/// `cfg.workers` concurrent workers.
///
/// Per-address failures never abort the pass; they are collected in the
/// report, and escalation is the caller's decision once the pass is done.
pub async fn scan(spec: &str, cfg: &ScanConfig, factory: Arc<dyn ClientFactory>) -> ScanReport {
    let workers = cfg.workers.max(1);
    let (task_tx, task_rx) = mpsc::channel::<ScanTask>(workers);
    let task_rx = Arc::new(Mutex::new(task_rx));
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<(String, ScanOutcome)>();

    let producer = {
        let spec = spec.to_string();
        let cfg = cfg.clone();
        tokio::spawn(async move {
            for address in range::expand(&spec, cfg.max_range) {
                let task = ScanTask {
                    address,
                    username: cfg.username.clone(),
                    password: cfg.password.clone(),
                };
                if task_tx.send(task).await.is_err() {
                    break;
                }
            }
        })
    };

    let mut pool = JoinSet::new();
    for _ in 0..workers {
        let task_rx = task_rx.clone();
        let outcome_tx = outcome_tx.clone();
        let factory = factory.clone();
        let cfg = cfg.clone();
        pool.spawn(async move {
            loop {
                // hold the lock only for the dequeue, not the probe
                let task = { task_rx.lock().await.recv().await };
                let Some(task) = task else { break };
                let client = match factory.client_for(&task) {
                    Ok(client) => client,
                    Err(err) => {
                        warn!("{}: cannot build a client: {err}", task.address);
                        continue;
                    }
                };
                let outcome = probe::probe(client.as_ref(), &task, &cfg).await;
                if outcome_tx.send((task.address.to_string(), outcome)).is_err() {
                    break;
                }
            }
        });
    }
    drop(outcome_tx);

    let mut report = ScanReport::default();
    while let Some((address, outcome)) = outcome_rx.recv().await {
        match outcome {
            ScanOutcome::Record(record) => report.records.push(record),
            ScanOutcome::Skipped => {}
            ScanOutcome::Error(err) => {
                warn!("{address}: {err}");
                report.errors.push((address, err));
            }
        }
    }
    while pool.join_next().await.is_some() {}
    let _ = producer.await;
    report
}
