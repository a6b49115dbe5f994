//! Report orchestration core.
//!
//! Drives the remote scoring service through one workflow per resource
//! kind: reconcile the resource id (create, else search), normalize the
//! descriptive payload, push it, trigger a calculation and poll until it
//! settles. The workflow is written once in [`pipeline`] against the
//! [`backend::ResourceBackend`] capability trait; assets and groups are two
//! implementations of it.
//!
//! HTTP goes through [`transport::HttpExchange`], wrapped by
//! [`transport::RetryingExchange`] for linear-backoff retries on a
//! configurable status set.

pub mod backend;
pub mod client;
pub mod compute;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod probe;
pub mod reconcile;
pub mod reference_cache;
pub mod service;
pub mod sources;
pub mod transport;
pub mod validate;

#[cfg(test)]
mod testing;

pub use backend::{
    AssetBackend, AssetPayload, GroupBackend, GroupPayload, ReportPayload,
    ResourceBackend, ResourceDescriptor,
};
pub use client::{
    ApiClient, AssetApi, CreateOutcome, GroupApi, ReferenceApi,
    ReferenceSnapshot,
};
pub use compute::{ComputeOrchestrator, PollOutcome, PurgeSummary};
pub use error::{
    ImpactError, ReconciliationError, Result, TransportError, ValidationError,
};
pub use normalize::{NormalizationReport, Normalizer};
pub use pipeline::ReportPipeline;
pub use probe::{ProbeReport, probe_suggested_activities};
pub use reconcile::{Reconciled, Reconciler};
pub use reference_cache::ActivityCache;
pub use service::ReportService;
pub use sources::{AbacaCohortInputs, AbacaCompanyInputs, AbacaSource};
pub use validate::{
    AssetReportDraft, AssetReportRequest, GroupReportDraft, GroupReportRequest,
    ReportRequest,
};

/// Cancellation handle accepted by the long-running workflows.
pub use tokio_util::sync::CancellationToken;
