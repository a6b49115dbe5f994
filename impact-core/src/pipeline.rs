//! The end-to-end report workflow, generic over the resource kind.
//!
//! ```text
//! reconcile -> [short-circuit | purge] -> normalize -> push -> trigger -> poll
//! ```
//!
//! Anything that fails before the resource id is known aborts the run.
//! Once the id exists the resource is durable, so compute-half failures
//! become a `partial` outcome carrying that id.

use std::sync::Arc;

use impact_config::PollConfig;
use impact_model::{ReportOutcome, ResourceId, ResourceKind};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::backend::{ReportPayload, ResourceBackend, ResourceDescriptor};
use crate::compute::ComputeOrchestrator;
use crate::error::{ImpactError, Result};
use crate::normalize::Normalizer;
use crate::reconcile::Reconciler;
use crate::validate::ReportRequest;

/// The report workflow for one resource kind: reconcile, short-circuit
/// or purge, normalize, push, trigger and poll.
#[derive(Debug)]
pub struct ReportPipeline<B> {
    backend: Arc<B>,
    reconciler: Reconciler<B>,
    orchestrator: ComputeOrchestrator<B>,
    normalizer: Normalizer,
}

impl<B: ResourceBackend> ReportPipeline<B> {
    /// Pipeline over `backend`, polling per `poll`.
    pub fn new(backend: Arc<B>, poll: PollConfig, normalizer: Normalizer) -> Self {
        Self {
            reconciler: Reconciler::new(backend.clone()),
            orchestrator: ComputeOrchestrator::new(backend.clone(), poll),
            backend,
            normalizer,
        }
    }

    /// The compute half, for callers that drive it directly.
    pub fn orchestrator(&self) -> &ComputeOrchestrator<B> {
        &self.orchestrator
    }

    /// Run one validated request to completion.
    ///
    /// Errors: reconciliation failures, normalization failures and
    /// cancellation. Every other failure after reconciliation is reported
    /// as a `partial` outcome.
    #[instrument(
        skip_all,
        fields(kind = B::KIND.label(), name = %request.descriptor.name())
    )]
    pub async fn run(
        &self,
        request: ReportRequest<B::Descriptor, B::Payload>,
        cancel: &CancellationToken,
    ) -> Result<ReportOutcome> {
        let ReportRequest {
            descriptor,
            mut payload,
            regenerate,
        } = request;

        let reconciled = self.reconciler.reconcile(&descriptor).await?;
        let id = reconciled.id;

        if regenerate {
            let summary = self.orchestrator.purge_history(&id).await;
            if !summary.failed.is_empty() {
                warn!(resource_id = %id, failed = summary.failed.len(), "some stored reports were not deleted");
            }
        } else if reconciled.pre_existing
            && self.orchestrator.existing_report(&id).await.is_some()
        {
            info!(resource_id = %id, "report already available");
            return Ok(ReportOutcome::success(id, already_exists(B::KIND)));
        }

        let mut suggestions = reconciled.suggestions;
        if suggestions.is_empty() && self.normalizer.config().industry_activity_fallback {
            suggestions = self.backend.fallback_suggestions(&descriptor).await;
        }

        let report = payload.normalize(&suggestions, &self.normalizer)?;
        if !report.is_untouched() {
            info!(
                resource_id = %id,
                synthesized = report.synthesized,
                rewritten = report.rewritten.len(),
                rescaled_from = ?report.rescaled_from,
                "payload normalized"
            );
        }

        match self.orchestrator.compute(&id, &payload, cancel).await {
            Ok(_) => Ok(ReportOutcome::success(id, completed(B::KIND))),
            Err(error) if error.is_cancelled() => Err(error),
            Err(error) => {
                warn!(resource_id = %id, error = %error, "report generation did not complete");
                let message = partial(B::KIND, &id, &error);
                Ok(ReportOutcome::partial(id, message))
            }
        }
    }
}

fn completed(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Asset => "Asset processed and report generated successfully.",
        ResourceKind::Group => "Group processed successfully.",
    }
}

fn already_exists(kind: ResourceKind) -> String {
    format!("{} already exists. Returning existing report.", kind.label())
}

fn partial(kind: ResourceKind, id: &ResourceId, error: &ImpactError) -> String {
    let subject = match kind {
        ResourceKind::Asset => "report",
        ResourceKind::Group => "impact",
    };
    match error {
        ImpactError::PollTimeout { .. } => format!(
            "{} created/found (ID: {id}), but {subject} generation timed out.",
            kind.label()
        ),
        _ => format!(
            "{} created/found (ID: {id}), but {subject} generation failed.",
            kind.label()
        ),
    }
}
