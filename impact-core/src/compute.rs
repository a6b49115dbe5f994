//! Push, trigger and poll one resource's impact calculation.
//!
//! ```text
//! CREATED -> push -> trigger -> poll{UNKNOWN|PENDING|ACTIVE}* -> COMPLETED | FAILED
//! ```

use std::sync::Arc;
use std::time::Duration;

use impact_config::PollConfig;
use impact_model::{CalculationStatus, ImpactReport, ResourceId};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::ResourceBackend;
use crate::error::{ImpactError, Result};

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Always terminal.
    pub status: CalculationStatus,
    /// Status reads issued, including the terminal one.
    pub reads: u32,
    pub elapsed: Duration,
}

/// Result of a best-effort history purge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    /// History entries found.
    pub listed: usize,
    pub deleted: usize,
    /// Report ids whose delete failed.
    pub failed: Vec<String>,
}

/// Push, trigger and poll for one resource kind, plus history upkeep.
#[derive(Debug)]
pub struct ComputeOrchestrator<B> {
    backend: Arc<B>,
    poll: PollConfig,
}

impl<B: ResourceBackend> ComputeOrchestrator<B> {
    /// Orchestrator over `backend`; `poll` bounds every poll loop.
    pub fn new(backend: Arc<B>, poll: PollConfig) -> Self {
        Self { backend, poll }
    }

    /// Send the normalized payload for `id`.
    pub async fn push_descriptive_data(
        &self,
        id: &ResourceId,
        payload: &B::Payload,
    ) -> Result<()> {
        self.backend.push(id, payload).await
    }

    /// Fire-and-forget: the reply body is not interpreted.
    pub async fn trigger_compute(&self, id: &ResourceId) -> Result<()> {
        self.backend.trigger(id).await?;
        info!(resource_id = %id, "impact calculation triggered");
        Ok(())
    }

    /// Sleep, read the status, repeat until COMPLETED or FAILED.
    ///
    /// Bounded by `max_attempts` status reads and by the wall-clock
    /// `deadline`; exceeding either yields [`ImpactError::PollTimeout`].
    /// Cancelling `cancel` interrupts a sleep or an in-flight read.
    pub async fn poll_until_terminal(
        &self,
        id: &ResourceId,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        let started = Instant::now();
        let interval = self.poll.interval;
        let mut reads = 0u32;

        loop {
            let out_of_reads = self.poll.max_attempts.is_some_and(|max| reads >= max);
            let out_of_time = self
                .poll
                .deadline
                .is_some_and(|deadline| started.elapsed() + interval > deadline);
            if out_of_reads || out_of_time {
                warn!(resource_id = %id, reads, "gave up waiting for impact calculation");
                return Err(ImpactError::PollTimeout {
                    id: id.clone(),
                    reads,
                    elapsed: started.elapsed(),
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(id)),
                _ = tokio::time::sleep(interval) => {}
            }

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(id)),
                status = self.backend.poll_status(id) => status?,
            };
            reads += 1;
            debug!(resource_id = %id, reads, %status, "calculation status");

            if status.is_terminal() {
                return Ok(PollOutcome {
                    status,
                    reads,
                    elapsed: started.elapsed(),
                });
            }
        }
    }

    /// Push, trigger, poll. A FAILED calculation is
    /// [`ImpactError::ComputeFailed`].
    pub async fn compute(
        &self,
        id: &ResourceId,
        payload: &B::Payload,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        self.push_descriptive_data(id, payload).await?;
        self.trigger_compute(id).await?;
        let outcome = self.poll_until_terminal(id, cancel).await?;
        match outcome.status {
            CalculationStatus::Completed => {
                info!(resource_id = %id, reads = outcome.reads, "impact calculation completed");
                Ok(outcome)
            }
            _ => Err(ImpactError::ComputeFailed { id: id.clone() }),
        }
    }

    /// Delete every stored report. Failures are logged and skipped.
    pub async fn purge_history(&self, id: &ResourceId) -> PurgeSummary {
        let history = match self.backend.list_history(id).await {
            Ok(history) => history,
            Err(error) => {
                warn!(resource_id = %id, error = %error, "could not list report history; skipping cleanup");
                return PurgeSummary::default();
            }
        };

        let mut summary = PurgeSummary {
            listed: history.reports.len(),
            ..PurgeSummary::default()
        };
        if summary.listed > 0 {
            info!(resource_id = %id, reports = summary.listed, "deleting report history");
        }

        for entry in history.reports {
            match self.backend.delete_history_entry(id, &entry.id).await {
                Ok(()) => {
                    debug!(
                        resource_id = %id,
                        report_id = %entry.id,
                        reported_at = ?entry.reported_at(),
                        "deleted report"
                    );
                    summary.deleted += 1;
                }
                Err(error) => {
                    warn!(resource_id = %id, report_id = %entry.id, error = %error, "failed to delete report");
                    summary.failed.push(entry.id);
                }
            }
        }
        summary
    }

    /// The current report, when one is stored and well formed.
    pub async fn existing_report(&self, id: &ResourceId) -> Option<ImpactReport> {
        match self.backend.get_report(id).await {
            Ok(report) if !report.is_failure_shape() => Some(report),
            Ok(_) => {
                debug!(resource_id = %id, "stored report carries an error shape");
                None
            }
            Err(error) => {
                debug!(resource_id = %id, error = %error, "no existing report");
                None
            }
        }
    }
}

fn cancelled(id: &ResourceId) -> ImpactError {
    ImpactError::Cancelled(format!("polling for {id}"))
}
