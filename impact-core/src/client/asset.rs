use impact_model::{
    Asset, AssetBasics, AssetCreateInput, AssetCreateResponse, AssetSearchHit,
    BreakdownItem, CalculationStatus, ImpactCalculationStatus, ImpactReport,
    ReportHistory, ResourceId, SearchHit, SearchResults,
};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info};

use super::{ApiClient, CreateOutcome, conflict_message, decode, ensure_success};
use crate::backend::ResourceDescriptor;
use crate::error::Result;

const ROOT: &str = "asset";

/// Search is cheap and read-only; it gets a larger attempt budget.
const SEARCH_ATTEMPTS: u32 = 5;

#[derive(Serialize)]
struct BreakdownBody<'a> {
    breakdown: &'a [BreakdownItem],
}

/// Asset endpoints under `{base}/asset`.
#[derive(Debug, Clone)]
pub struct AssetApi {
    client: ApiClient,
}

impl AssetApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Create an asset unless one with the same name and industry is
    /// already listed. The service accepts duplicate names, so the search
    /// runs first. A listed match, a 409, or an "already exists" body is
    /// reported as [`CreateOutcome::AlreadyExists`]; any other non-2xx is
    /// an error.
    pub async fn create(&self, input: &AssetCreateInput) -> Result<CreateOutcome> {
        let listed = self.search_by_name(&input.name).await?;
        if let Some(hit) = listed
            .results
            .into_iter()
            .map(SearchHit::from)
            .find(|hit| input.matches(hit))
        {
            info!(name = %input.name, asset_id = %hit.id, "asset already listed");
            return Ok(CreateOutcome::AlreadyExists {
                message: "Asset already exists".to_string(),
            });
        }

        let response = self.client.send_json(Method::POST, &[ROOT], input).await?;
        if let Some(message) = conflict_message(&response) {
            info!(name = %input.name, %message, "asset already exists");
            return Ok(CreateOutcome::AlreadyExists { message });
        }
        let response = ensure_success(response)?;
        let created: AssetCreateResponse = decode(&response)?;
        debug!(
            asset_id = %created.asset.id,
            suggestions = created.suggested_activities.len(),
            "asset created"
        );
        Ok(CreateOutcome::Created {
            id: created.asset.id,
            suggestions: created.suggested_activities,
        })
    }

    pub async fn get(&self, id: &ResourceId) -> Result<Asset> {
        self.client.get_json(&[ROOT, "id", id.as_str()]).await
    }

    pub async fn search_by_name(
        &self,
        name: &str,
    ) -> Result<SearchResults<AssetSearchHit>> {
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

    pub async fn put_basics(&self, id: &ResourceId, basics: &AssetBasics) -> Result<()> {
        self.client
            .put_json(&[ROOT, "id", id.as_str(), "basics"], basics)
            .await
    }

    pub async fn put_breakdown(
        &self,
        id: &ResourceId,
        breakdown: &[BreakdownItem],
    ) -> Result<()> {
        self.client
            .put_json(
                &[ROOT, "id", id.as_str(), "breakdown"],
                &BreakdownBody { breakdown },
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

impl From<ApiClient> for AssetApi {
    fn from(client: ApiClient) -> Self {
        Self::new(client)
    }
}
