use std::sync::Arc;

use async_trait::async_trait;
use impact_model::{
    Activity, AssetBasics, AssetCreateInput, BreakdownItem, CalculationStatus,
    ImpactReport, ReportHistory, ResourceId, ResourceKind, SearchHit,
};
use tracing::{debug, warn};

use super::{ReportPayload, ResourceBackend};
use crate::client::{AssetApi, CreateOutcome, ReferenceApi};
use crate::error::{Result, ValidationError};
use crate::normalize::{NormalizationReport, Normalizer};
use crate::reference_cache::ActivityCache;

/// Basics plus breakdown for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPayload {
    pub basics: AssetBasics,
    pub breakdown: Vec<BreakdownItem>,
}

impl ReportPayload for AssetPayload {
    fn normalize(
        &mut self,
        suggestions: &[Activity],
        normalizer: &Normalizer,
    ) -> std::result::Result<NormalizationReport, ValidationError> {
        let items = std::mem::take(&mut self.breakdown);
        let (items, report) = normalizer.normalize_breakdown(
            items,
            suggestions,
            &self.basics.hq_country_code,
        )?;
        self.breakdown = items;
        Ok(report)
    }
}

/// [`ResourceBackend`] over the asset endpoints.
#[derive(Debug, Clone)]
pub struct AssetBackend {
    api: AssetApi,
    activities: Option<(ReferenceApi, Arc<ActivityCache>)>,
}

impl AssetBackend {
    pub fn new(api: AssetApi) -> Self {
        Self {
            api,
            activities: None,
        }
    }

    /// Use the industry's published activities as suggestions whenever
    /// creation returned none.
    pub fn with_industry_fallback(
        mut self,
        reference: ReferenceApi,
        cache: Arc<ActivityCache>,
    ) -> Self {
        self.activities = Some((reference, cache));
        self
    }

    pub fn api(&self) -> &AssetApi {
        &self.api
    }
}

#[async_trait]
impl ResourceBackend for AssetBackend {
    type Descriptor = AssetCreateInput;
    type Payload = AssetPayload;

    const KIND: ResourceKind = ResourceKind::Asset;

    async fn create(&self, descriptor: &AssetCreateInput) -> Result<CreateOutcome> {
        self.api.create(descriptor).await
    }

    async fn search(&self, name: &str) -> Result<Vec<SearchHit>> {
        let results = self.api.search_by_name(name).await?;
        Ok(results.results.into_iter().map(SearchHit::from).collect())
    }

    async fn push(&self, id: &ResourceId, payload: &AssetPayload) -> Result<()> {
        self.api.put_basics(id, &payload.basics).await?;
        debug!(asset_id = %id, "basics stored");
        self.api.put_breakdown(id, &payload.breakdown).await?;
        debug!(asset_id = %id, rows = payload.breakdown.len(), "breakdown stored");
        Ok(())
    }

    async fn trigger(&self, id: &ResourceId) -> Result<()> {
        self.api.calculate(id).await
    }

    async fn poll_status(&self, id: &ResourceId) -> Result<CalculationStatus> {
        self.api.status(id).await
    }

    async fn get_report(&self, id: &ResourceId) -> Result<ImpactReport> {
        self.api.current_report(id).await
    }

    async fn list_history(&self, id: &ResourceId) -> Result<ReportHistory> {
        self.api.history(id).await
    }

    async fn delete_history_entry(
        &self,
        id: &ResourceId,
        report_id: &str,
    ) -> Result<()> {
        self.api.delete_report(id, report_id).await
    }

    async fn fallback_suggestions(&self, descriptor: &AssetCreateInput) -> Vec<Activity> {
        let Some((reference, cache)) = &self.activities else {
            return Vec::new();
        };
        let industry = descriptor.industry.as_str();
        match cache
            .get_or_fetch(industry, || async {
                reference.activities(industry).await.map(|a| a.activities)
            })
            .await
        {
            Ok(activities) => activities,
            Err(error) => {
                warn!(%industry, error = %error, "industry activity lookup failed");
                Vec::new()
            }
        }
    }
}
