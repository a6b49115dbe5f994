use impact_model::{
    CalculationStatus, Group, GroupCreateInput, GroupSearchHit, HoldingItem,
    ImpactCalculationStatus, ImpactReport, ReportHistory, ResourceId,
    SearchResults,
};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info};

use super::{ApiClient, CreateOutcome, conflict_message, decode, ensure_success};
use crate::error::Result;

const ROOT: &str = "group";
const SEARCH_ATTEMPTS: u32 = 5;

#[derive(Serialize)]
struct HoldingsBody<'a> {
    holdings: &'a [HoldingItem],
}

/// Asset-group endpoints under `{base}/group`.
#[derive(Debug, Clone)]
pub struct GroupApi {
    client: ApiClient,
}

impl GroupApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The service answers a create with the group itself; groups carry no
    /// activity suggestions.
    pub async fn create(&self, input: &GroupCreateInput) -> Result<CreateOutcome> {
        let response = self.client.send_json(Method::POST, &[ROOT], input).await?;
        if let Some(message) = conflict_message(&response) {
            info!(name = %input.name, %message, "group already exists");
            return Ok(CreateOutcome::AlreadyExists { message });
        }
        let response = ensure_success(response)?;
        let group: Group = decode(&response)?;
        debug!(group_id = %group.id, "group created");
        Ok(CreateOutcome::Created {
            id: group.id,
            suggestions: Vec::new(),
        })
    }

    pub async fn get(&self, id: &ResourceId) -> Result<Group> {
        self.client.get_json(&[ROOT, "id", id.as_str()]).await
    }

    pub async fn search_by_name(
        &self,
        name: &str,
    ) -> Result<SearchResults<GroupSearchHit>> {
        let url = self.client.endpoint(&[ROOT, "search", "name", name])?;
        let request = self
            .client
            .request(Method::GET, url)
            .max_attempts(SEARCH_ATTEMPTS);
        let response = self.client.execute_ok(request).await?;
        decode(&response)
    }

    pub async fn delete(&self, id: &ResourceId) -> Result<()> {
        self.client.delete(&[ROOT, "id", id.as_str()]).await
    }

    pub async fn put_holdings(
        &self,
        id: &ResourceId,
        holdings: &[HoldingItem],
    ) -> Result<()> {
        self.client
            .put_json(
                &[ROOT, "id", id.as_str(), "holdings"],
                &HoldingsBody { holdings },
            )
            .await
    }

    pub async fn calculate(&self, id: &ResourceId) -> Result<()> {
        self.client
            .post_empty(&[ROOT, "id", id.as_str(), "impact", "calculate"])
            .await
    }

    pub async fn status(&self, id: &ResourceId) -> Result<CalculationStatus> {
        let status: ImpactCalculationStatus = self
            .client
            .get_json(&[ROOT, "id", id.as_str(), "impact", "status"])
            .await?;
        Ok(status.status)
    }

    pub async fn history(&self, id: &ResourceId) -> Result<ReportHistory> {
        self.client
            .get_json(&[ROOT, "id", id.as_str(), "impact", "history"])
            .await
    }

    pub async fn current_report(&self, id: &ResourceId) -> Result<ImpactReport> {
        self.client
            .get_json(&[ROOT, "id", id.as_str(), "impact", "current"])
            .await
    }

    pub async fn report(
        &self,
        id: &ResourceId,
        report_id: &str,
    ) -> Result<ImpactReport> {
        self.client
            .get_json(&[ROOT, "id", id.as_str(), "impact", "id", report_id])
            .await
    }

    pub async fn delete_report(&self, id: &ResourceId, report_id: &str) -> Result<()> {
        self.client
            .delete(&[ROOT, "id", id.as_str(), "impact", "id", report_id])
            .await
    }
}
