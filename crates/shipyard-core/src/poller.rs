//! The outer polling loop.
//!
//! Every cycle re-syncs the tracked branch, runs one orchestrator pass,
//! and sleeps for the configured period. Sync failures are logged and the
//! cycle proceeds on whatever commit state the clone currently holds;
//! pass failures are logged and retried on the next cycle. The loop has no
//! internal termination, the process is killed externally.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::orchestrator::BuildOrchestrator;

/// Periodically re-syncs the branch and drives the orchestrator.
pub struct Poller {
    orchestrator: BuildOrchestrator,
    branch: String,
    period: Duration,
}

impl Poller {
    pub fn new(orchestrator: BuildOrchestrator, branch: String, period: Duration) -> Self {
        Self {
            orchestrator,
            branch,
            period,
        }
    }

    /// One polling cycle: sync, then a single build pass.
    pub async fn cycle(&self) {
        if let Err(e) = self.orchestrator.repo().sync(&self.branch) {
            warn!(branch = %self.branch, error = %e, "branch sync failed, building from current state");
        }
        match self.orchestrator.run_pass().await {
            Ok(summary) if summary.built.is_empty() => debug!("cycle complete, nothing built"),
            Ok(summary) => info!(versions = ?summary.built, "cycle complete"),
            Err(e) => error!(error = %e, "build pass failed, retrying next cycle"),
        }
    }

    /// Run cycles forever.
    pub async fn run(self) {
        info!(branch = %self.branch, period_secs = self.period.as_secs(), "poller started");
        loop {
            self.cycle().await;
            tokio::time::sleep(self.period).await;
        }
    }
}
