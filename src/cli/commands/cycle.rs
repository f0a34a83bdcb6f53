//! Implementation of the `geodispatch cycle` command.

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use crate::cli::output::{output, table, CommandOutput};
use crate::cli::App;
use crate::services::CycleReport;

#[derive(Args, Debug)]
pub struct CycleArgs {
    /// Run against an in-memory copy of the store and in-memory collaborators
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct CycleOutput {
    pub dry_run: bool,
    pub report: CycleReport,
}

impl CommandOutput for CycleOutput {
    fn to_human(&self) -> String {
        let r = &self.report;
        let mut t = table(&["Areas", "Plugins", "Submitted", "Skipped", "Completed", "Failed tasks", "Unit failures"]);
        t.add_row(vec![
            r.areas.to_string(),
            r.plugins.to_string(),
            r.submitted.to_string(),
            r.skipped.to_string(),
            r.completed.to_string(),
            r.failed_tasks.to_string(),
            r.unit_failures.to_string(),
        ]);
        if self.dry_run {
            format!("Dry run (nothing persisted or sent)\n{t}")
        } else {
            t.to_string()
        }
    }
}

pub async fn execute(args: CycleArgs, app: App, json_mode: bool) -> Result<()> {
    let orchestrator = if args.dry_run {
        app.dry_run_orchestrator().await?
    } else {
        app.orchestrator()?
    };
    let report = orchestrator.run_cycle_at(Utc::now()).await?;
    output(
        &CycleOutput {
            dry_run: args.dry_run,
            report,
        },
        json_mode,
    );
    Ok(())
}
