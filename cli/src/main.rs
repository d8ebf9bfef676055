mod commands;
mod logging;

use std::sync::Arc;

use clap::CommandFactory;
use tracing::error;

use commands::CommandLine;
use rackscan_common::config::ScanConfig;
use rackscan_common::model::InventoryDocument;
use rackscan_core::scanner::{self, WsmanFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CommandLine::parse_args();
    logging::init();

    let Some(spec) = args.scan.as_deref().filter(|s| !s.trim().is_empty()) else {
        CommandLine::command().print_help()?;
        std::process::exit(1);
    };

    let cfg = ScanConfig {
        username: args.username.clone(),
        password: args.password.clone(),
        workers: args.workers,
        mac_report: args.mac_report,
        max_range: args.max_range,
        ..ScanConfig::default()
    };

    let report = scanner::scan(spec, &cfg, Arc::new(WsmanFactory)).await;

    let document = InventoryDocument {
        nodes: report.records,
    };
    println!("{}", serde_json::to_string_pretty(&document)?);

    // Task-scoped failures were logged as they happened; a complete
    // document still went to stdout, but the exit code flags them.
    if !report.errors.is_empty() {
        error!(
            "{} of the scanned addresses failed inventory",
            report.errors.len()
        );
        std::process::exit(1);
    }
    Ok(())
}
