//! Implementation of the `geodispatch run` command.

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cli::output::{output, CommandOutput};
use crate::cli::App;
use crate::services::{Daemon, DaemonEvent, StopReason};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the configured cycle interval
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
pub struct RunOutput {
    pub cycles: u64,
    pub successful_cycles: u64,
    pub failed_cycles: u64,
    pub reason: String,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        format!(
            "Daemon stopped ({}) after {} cycle(s): {} succeeded, {} failed",
            self.reason, self.cycles, self.successful_cycles, self.failed_cycles
        )
    }
}

pub async fn execute(args: RunArgs, app: App, json_mode: bool) -> Result<()> {
    let mut config = app.config.daemon.clone();
    if let Some(secs) = args.interval_secs {
        config.cycle_interval_secs = secs.max(1);
    }

    let orchestrator = Arc::new(app.orchestrator()?);
    let daemon = Daemon::new(orchestrator, config);
    let handle = daemon.handle();

    let (tx, mut rx) = mpsc::channel(100);
    let runner = tokio::spawn(daemon.run(tx));

    let interrupt = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after the current cycle");
            interrupt.stop();
        }
    });

    while let Some(event) = rx.recv().await {
        match event {
            DaemonEvent::CycleCompleted { cycle, report, duration_ms } => {
                tracing::debug!(cycle, duration_ms, submitted = report.submitted, "cycle event");
            }
            DaemonEvent::Stopped { .. } => break,
            _ => {}
        }
    }

    let reason = runner.await?;
    let status = handle.status().await;
    output(
        &RunOutput {
            cycles: status.total_cycles,
            successful_cycles: status.successful_cycles,
            failed_cycles: status.failed_cycles,
            reason: match reason {
                StopReason::Requested => "requested".to_string(),
                StopReason::TooManyFailures => "too many consecutive failures".to_string(),
            },
        },
        json_mode,
    );

    if reason == StopReason::TooManyFailures {
        anyhow::bail!("daemon gave up after repeated cycle failures");
    }
    Ok(())
}
