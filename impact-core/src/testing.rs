//! Scripted in-memory backend shared by the unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use impact_model::{
    Activity, AssetBasics, AssetCreateInput, CalculationStatus, ImpactReport,
    ReportHistory, ReportHistoryEntry, ResourceId, ResourceKind, SearchHit,
};
use reqwest::StatusCode;
use url::Url;

use crate::backend::{AssetPayload, ResourceBackend};
use crate::client::CreateOutcome;
use crate::error::{ImpactError, Result};

pub(crate) fn id(raw: &str) -> ResourceId {
    ResourceId::new(raw).unwrap()
}

pub(crate) fn http_error(status: u16) -> ImpactError {
    ImpactError::HttpStatus {
        status: StatusCode::from_u16(status).unwrap(),
        url: Url::parse("http://fake.local/v2").unwrap(),
        message: format!("scripted {status}"),
    }
}

pub(crate) fn acme() -> AssetCreateInput {
    AssetCreateInput {
        name: "Acme".into(),
        description: "Developer tooling".into(),
        industry: "Software".into(),
        hq_country_code: "US".into(),
        num_employees: 120,
    }
}

pub(crate) fn acme_basics() -> AssetBasics {
    AssetBasics {
        currency: "USD".into(),
        description: "Developer tooling".into(),
        hq_country_code: "US".into(),
        industry: "Software".into(),
        name: "Acme".into(),
        num_employees: 120,
        revenue: 5_000_000.0,
        revenue_growth: 0.12,
    }
}

pub(crate) fn history_entry(report_id: &str) -> ReportHistoryEntry {
    ReportHistoryEntry {
        id: report_id.into(),
        report_date: "2024-05-01T00:00:00Z".into(),
        positive_impact: None,
        negative_impact: None,
        vested_impact_rating: None,
        vested_impact_score: None,
        num_holdings: None,
    }
}

#[derive(Default)]
struct Script {
    creates: VecDeque<Result<CreateOutcome>>,
    searches: VecDeque<Result<Vec<SearchHit>>>,
    statuses: VecDeque<Result<CalculationStatus>>,
    reports: VecDeque<Result<ImpactReport>>,
    history: Option<Result<ReportHistory>>,
    failing_deletes: HashSet<String>,
    push_error: Option<ImpactError>,
    trigger_error: Option<ImpactError>,
    fallback: Vec<Activity>,
    calls: Vec<String>,
    pushed: Vec<AssetPayload>,
}

/// Asset-shaped [`ResourceBackend`] that replays scripted answers and
/// records every call.
#[derive(Default)]
pub(crate) struct FakeBackend {
    script: Mutex<Script>,
}

impl std::fmt::Debug for FakeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FakeBackend")
    }
}

impl FakeBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn activities(ids: &[u32]) -> Vec<Activity> {
        ids.iter()
            .map(|&id| Activity {
                id,
                industry: "Software".into(),
                name: format!("activity {id}"),
            })
            .collect()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        f(&mut self.script.lock().unwrap())
    }

    pub(crate) fn script_create(&self, outcome: Result<CreateOutcome>) {
        self.with(|s| s.creates.push_back(outcome));
    }

    pub(crate) fn script_search(&self, outcome: Result<Vec<SearchHit>>) {
        self.with(|s| s.searches.push_back(outcome));
    }

    pub(crate) fn script_statuses(&self, statuses: &[CalculationStatus]) {
        self.with(|s| s.statuses.extend(statuses.iter().copied().map(Ok)));
    }

    pub(crate) fn script_status_error(&self, error: ImpactError) {
        self.with(|s| s.statuses.push_back(Err(error)));
    }

    pub(crate) fn script_report(&self, outcome: Result<ImpactReport>) {
        self.with(|s| s.reports.push_back(outcome));
    }

    pub(crate) fn script_history(&self, outcome: Result<ReportHistory>) {
        self.with(|s| s.history = Some(outcome));
    }

    pub(crate) fn fail_delete(&self, report_id: &str) {
        self.with(|s| s.failing_deletes.insert(report_id.to_string()));
    }

    pub(crate) fn fail_push(&self, error: ImpactError) {
        self.with(|s| s.push_error = Some(error));
    }

    pub(crate) fn fail_trigger(&self, error: ImpactError) {
        self.with(|s| s.trigger_error = Some(error));
    }

    pub(crate) fn set_fallback(&self, activities: Vec<Activity>) {
        self.with(|s| s.fallback = activities);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub(crate) fn status_reads(&self) -> usize {
        self.with(|s| s.calls.iter().filter(|c| *c == "status").count())
    }

    pub(crate) fn pushed(&self) -> Vec<AssetPayload> {
        self.with(|s| s.pushed.clone())
    }

    fn record(&self, call: impl Into<String>) {
        self.with(|s| s.calls.push(call.into()));
    }
}

#[async_trait]
impl ResourceBackend for FakeBackend {
    type Descriptor = AssetCreateInput;
    type Payload = AssetPayload;

    const KIND: ResourceKind = ResourceKind::Asset;

    async fn create(&self, _descriptor: &AssetCreateInput) -> Result<CreateOutcome> {
        self.record("create");
        self.with(|s| s.creates.pop_front())
            .unwrap_or_else(|| Err(http_error(500)))
    }

    async fn search(&self, name: &str) -> Result<Vec<SearchHit>> {
        self.record(format!("search:{name}"));
        self.with(|s| s.searches.pop_front()).unwrap_or(Ok(Vec::new()))
    }

    async fn push(&self, _id: &ResourceId, payload: &AssetPayload) -> Result<()> {
        self.record("push");
        self.with(|s| match s.push_error.take() {
            Some(error) => Err(error),
            None => {
                s.pushed.push(payload.clone());
                Ok(())
            }
        })
    }

    async fn trigger(&self, _id: &ResourceId) -> Result<()> {
        self.record("trigger");
        self.with(|s| s.trigger_error.take()).map_or(Ok(()), Err)
    }

    async fn poll_status(&self, _id: &ResourceId) -> Result<CalculationStatus> {
        self.record("status");
        self.with(|s| s.statuses.pop_front())
            .unwrap_or(Ok(CalculationStatus::Pending))
    }

    async fn get_report(&self, _id: &ResourceId) -> Result<ImpactReport> {
        self.record("report");
        self.with(|s| s.reports.pop_front())
            .unwrap_or_else(|| Err(http_error(404)))
    }

    async fn list_history(&self, _id: &ResourceId) -> Result<ReportHistory> {
        self.record("history");
        self.with(|s| s.history.take())
            .unwrap_or(Ok(ReportHistory::default()))
    }

    async fn delete_history_entry(
        &self,
        _id: &ResourceId,
        report_id: &str,
    ) -> Result<()> {
        self.record(format!("delete:{report_id}"));
        if self.with(|s| s.failing_deletes.contains(report_id)) {
            Err(http_error(500))
        } else {
            Ok(())
        }
    }

    async fn fallback_suggestions(&self, _descriptor: &AssetCreateInput) -> Vec<Activity> {
        self.with(|s| s.fallback.clone())
    }
}
