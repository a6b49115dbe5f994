use async_trait::async_trait;
use impact_model::{
    Activity, CalculationStatus, GroupCreateInput, HoldingItem, ImpactReport,
    ReportHistory, ResourceId, ResourceKind, SearchHit,
};
use tracing::debug;

use super::{ReportPayload, ResourceBackend};
use crate::client::{CreateOutcome, GroupApi};
use crate::error::{Result, ValidationError};
use crate::normalize::{NormalizationReport, Normalizer};

/// Weighted membership of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPayload {
    pub holdings: Vec<HoldingItem>,
}

impl ReportPayload for GroupPayload {
    fn normalize(
        &mut self,
        _suggestions: &[Activity],
        normalizer: &Normalizer,
    ) -> std::result::Result<NormalizationReport, ValidationError> {
        let (items, report) =
            normalizer.normalize_holdings(std::mem::take(&mut self.holdings))?;
        self.holdings = items;
        Ok(report)
    }
}

/// [`ResourceBackend`] over the group endpoints.
#[derive(Debug, Clone)]
pub struct GroupBackend {
    api: GroupApi,
}

impl GroupBackend {
    pub fn new(api: GroupApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceBackend for GroupBackend {
    type Descriptor = GroupCreateInput;
    type Payload = GroupPayload;

    const KIND: ResourceKind = ResourceKind::Group;

    async fn create(&self, descriptor: &GroupCreateInput) -> Result<CreateOutcome> {
        self.api.create(descriptor).await
    }

    async fn search(&self, name: &str) -> Result<Vec<SearchHit>> {
        let results = self.api.search_by_name(name).await?;
        Ok(results.results.into_iter().map(SearchHit::from).collect())
    }

    async fn push(&self, id: &ResourceId, payload: &GroupPayload) -> Result<()> {
        self.api.put_holdings(id, &payload.holdings).await?;
        debug!(group_id = %id, rows = payload.holdings.len(), "holdings stored");
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
}
