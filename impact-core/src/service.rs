//! Caller-facing entry points: one per resource kind.

use std::sync::Arc;

use impact_config::ImpactConfig;
use impact_model::{AssetCreateInput, ReportOutcome};
use tokio_util::sync::CancellationToken;

use crate::backend::{AssetBackend, GroupBackend};
use crate::client::{ApiClient, AssetApi, GroupApi, ReferenceApi};
use crate::error::Result;
use crate::normalize::Normalizer;
use crate::pipeline::ReportPipeline;
use crate::probe::{ProbeReport, probe_suggested_activities};
use crate::reference_cache::ActivityCache;
use crate::validate::{
    AssetReportDraft, AssetReportRequest, GroupReportDraft, GroupReportRequest,
};

/// Asset and group report workflows sharing one client.
///
/// Each service owns its own [`ActivityCache`]; nothing is process-global.
#[derive(Debug)]
pub struct ReportService {
    assets: ReportPipeline<AssetBackend>,
    groups: ReportPipeline<GroupBackend>,
    asset_api: AssetApi,
    reference: ReferenceApi,
    activity_cache: Arc<ActivityCache>,
}

impl ReportService {
    /// Fails with a configuration error when no API key is configured.
    pub fn from_config(config: &ImpactConfig) -> Result<Self> {
        let client = ApiClient::from_config(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Build on an existing client; only the poll and normalization
    /// sections of `config` are read.
    pub fn with_client(client: ApiClient, config: &ImpactConfig) -> Self {
        let normalizer = Normalizer::new(config.normalization);
        let asset_api = AssetApi::new(client.clone());
        let reference = ReferenceApi::new(client.clone());
        let activity_cache = Arc::new(ActivityCache::new());

        let asset_backend = AssetBackend::new(asset_api.clone())
            .with_industry_fallback(reference.clone(), activity_cache.clone());
        let group_backend = GroupBackend::new(GroupApi::new(client));

        Self {
            assets: ReportPipeline::new(Arc::new(asset_backend), config.poll, normalizer),
            groups: ReportPipeline::new(Arc::new(group_backend), config.poll, normalizer),
            asset_api,
            reference,
            activity_cache,
        }
    }

    /// Validate, then run the asset workflow. Validation failures are
    /// returned before any network call.
    pub async fn generate_asset_report(
        &self,
        draft: AssetReportDraft,
        cancel: &CancellationToken,
    ) -> Result<ReportOutcome> {
        let request = draft.validate()?;
        self.run_asset(request, cancel).await
    }

    pub async fn generate_group_report(
        &self,
        draft: GroupReportDraft,
        cancel: &CancellationToken,
    ) -> Result<ReportOutcome> {
        let request = draft.validate()?;
        self.run_group(request, cancel).await
    }

    pub async fn run_asset(
        &self,
        request: AssetReportRequest,
        cancel: &CancellationToken,
    ) -> Result<ReportOutcome> {
        self.assets.run(request, cancel).await
    }

    pub async fn run_group(
        &self,
        request: GroupReportRequest,
        cancel: &CancellationToken,
    ) -> Result<ReportOutcome> {
        self.groups.run(request, cancel).await
    }

    pub async fn probe(&self, descriptor: &AssetCreateInput) -> Result<ProbeReport> {
        probe_suggested_activities(&self.asset_api, descriptor).await
    }

    pub fn reference(&self) -> &ReferenceApi {
        &self.reference
    }

    pub fn activity_cache(&self) -> &Arc<ActivityCache> {
        &self.activity_cache
    }
}
