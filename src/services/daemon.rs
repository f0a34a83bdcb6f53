//! Cycle daemon.
//!
//! Ticks the orchestrator on a fixed interval until stopped. A cycle fails
//! only when the area listing itself fails; too many of those in a row stop
//! the daemon.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::domain::models::DaemonConfig;
use crate::services::orchestrator::{CycleReport, Orchestrator};

/// Event emitted by the daemon.
#[derive(Debug, Clone)]
pub enum DaemonEvent {
    Started,
    CycleStarted { cycle: u64 },
    CycleCompleted {
        cycle: u64,
        report: CycleReport,
        duration_ms: u64,
    },
    CycleFailed { cycle: u64, error: String },
    Stopped { reason: StopReason },
}

/// Reason the daemon stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    TooManyFailures,
}

#[derive(Debug, Clone, Default)]
pub struct DaemonStatus {
    pub running: bool,
    pub total_cycles: u64,
    pub successful_cycles: u64,
    pub failed_cycles: u64,
    pub last_cycle: Option<Instant>,
    pub last_report: Option<CycleReport>,
}

/// Handle to control a running daemon.
#[derive(Clone)]
pub struct DaemonHandle {
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
    status: Arc<RwLock<DaemonStatus>>,
}

impl DaemonHandle {
    /// Request a stop; a daemon waiting for its next tick wakes at once.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    pub async fn status(&self) -> DaemonStatus {
        self.status.read().await.clone()
    }
}

pub struct Daemon {
    orchestrator: Arc<Orchestrator>,
    config: DaemonConfig,
    status: Arc<RwLock<DaemonStatus>>,
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl Daemon {
    pub fn new(orchestrator: Arc<Orchestrator>, config: DaemonConfig) -> Self {
        Self {
            orchestrator,
            config,
            status: Arc::new(RwLock::new(DaemonStatus::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            stop_flag: self.stop_flag.clone(),
            wake: self.wake.clone(),
            status: self.status.clone(),
        }
    }

    /// Run the loop on the current task until stopped.
    pub async fn run(self, tx: mpsc::Sender<DaemonEvent>) -> StopReason {
        self.status.write().await.running = true;
        let _ = tx.send(DaemonEvent::Started).await;
        tracing::info!(interval_secs = self.config.cycle_interval_secs, "daemon started");

        let mut consecutive_failures = 0u32;
        let mut timer = interval(Duration::from_secs(self.config.cycle_interval_secs.max(1)));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        timer.tick().await;

        if self.config.run_on_startup {
            self.run_one(&tx, &mut consecutive_failures).await;
        }

        let reason = loop {
            if self.stop_flag.load(Ordering::Acquire) {
                break StopReason::Requested;
            }
            if consecutive_failures >= self.config.max_consecutive_failures.max(1) {
                break StopReason::TooManyFailures;
            }
            tokio::select! {
                _ = timer.tick() => {}
                () = self.wake.notified() => {}
            }
            if self.stop_flag.load(Ordering::Acquire) {
                break StopReason::Requested;
            }
            self.run_one(&tx, &mut consecutive_failures).await;
        };

        self.status.write().await.running = false;
        tracing::info!(?reason, "daemon stopped");
        let _ = tx.send(DaemonEvent::Stopped { reason }).await;
        reason
    }

    async fn run_one(&self, tx: &mpsc::Sender<DaemonEvent>, consecutive_failures: &mut u32) {
        let cycle = {
            let mut status = self.status.write().await;
            status.total_cycles += 1;
            status.total_cycles
        };
        let _ = tx.send(DaemonEvent::CycleStarted { cycle }).await;

        let start = Instant::now();
        let result = self.orchestrator.run_cycle_at(Utc::now()).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(report) => {
                *consecutive_failures = 0;
                {
                    let mut status = self.status.write().await;
                    status.successful_cycles += 1;
                    status.last_cycle = Some(Instant::now());
                    status.last_report = Some(report);
                }
                let _ = tx
                    .send(DaemonEvent::CycleCompleted {
                        cycle,
                        report,
                        duration_ms,
                    })
                    .await;
            }
            Err(e) => {
                *consecutive_failures += 1;
                self.status.write().await.failed_cycles += 1;
                tracing::error!(cycle, error = %e, consecutive_failures = *consecutive_failures, "cycle failed");
                let _ = tx
                    .send(DaemonEvent::CycleFailed {
                        cycle,
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Catalog;
    use crate::services::map_engine::testing::Harness;
    use crate::services::plugin::PluginFactory;
    use std::collections::HashMap;

    async fn orchestrator() -> Arc<Orchestrator> {
        let h = Harness::new().await;
        Arc::new(Orchestrator::new(
            h.services.clone(),
            PluginFactory::new(Catalog::builtin(), HashMap::new()),
        ))
    }

    #[test]
    fn test_status_default() {
        let status = DaemonStatus::default();
        assert!(!status.running);
        assert_eq!(status.total_cycles, 0);
        assert!(status.last_report.is_none());
    }

    #[tokio::test]
    async fn test_stop_after_startup_cycle() {
        let config = DaemonConfig {
            cycle_interval_secs: 3600,
            run_on_startup: true,
            max_consecutive_failures: 3,
        };
        let daemon = Daemon::new(orchestrator().await, config);
        let handle = daemon.handle();
        let (tx, mut events) = mpsc::channel(100);
        let task = tokio::spawn(daemon.run(tx));

        assert!(matches!(events.recv().await, Some(DaemonEvent::Started)));
        assert!(matches!(events.recv().await, Some(DaemonEvent::CycleStarted { cycle: 1 })));
        assert!(matches!(events.recv().await, Some(DaemonEvent::CycleCompleted { cycle: 1, .. })));

        handle.stop();
        assert!(matches!(
            events.recv().await,
            Some(DaemonEvent::Stopped { reason: StopReason::Requested })
        ));
        assert_eq!(task.await.unwrap(), StopReason::Requested);

        let status = handle.status().await;
        assert!(!status.running);
        assert_eq!(status.successful_cycles, 1);
        assert_eq!(status.last_report, Some(CycleReport::default()));
    }
}
