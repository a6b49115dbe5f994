//! Abaca platform adapter.
//!
//! Companies become asset requests built from their profile and matching
//! questionnaire answers; company lists become group requests. Upstream
//! data is loosely typed, so every numeric field is coerced leniently and
//! missing values fall back to fixed defaults.

use std::sync::Arc;

use impact_config::{AbacaConfig, ImpactConfig};
use impact_model::{
    AssetBasics, BreakdownItem, GroupCreateInput, HoldingItem,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{AssetPayload, GroupPayload};
use crate::client::ApiClient;
use crate::error::{ImpactError, Result};
use crate::transport::{ReqwestExchange, RetryingExchange};
use crate::validate::{AssetReportRequest, GroupReportRequest, ReportRequest};

const AUTHORIZATION_HEADER: &str = "authorization";

const Q_EMPLOYEES: u64 = 2001;
const Q_CURRENCY: u64 = 2002;
const Q_REVENUE: u64 = 2003;
const Q_REVENUE_GROWTH: u64 = 2004;
const Q_BREAKDOWN: u64 = 2005;

const DEFAULT_INDUSTRY: &str = "General";
const DEFAULT_COUNTRY: &str = "US";
const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_COMPANY_NAME: &str = "Unknown Company";
const DEFAULT_GROUP_NAME: &str = "Default Asset Group";
const DEFAULT_GROUP_OWNER: &str = "Abaca Group Owner";

/// Asset workflow inputs derived from one Abaca company.
#[derive(Debug, Clone, PartialEq)]
pub struct AbacaCompanyInputs {
    pub basics: AssetBasics,
    pub breakdown: Vec<BreakdownItem>,
}

impl AbacaCompanyInputs {
    pub fn into_request(self, regenerate: bool) -> AssetReportRequest {
        ReportRequest {
            descriptor: self.basics.create_input(),
            payload: AssetPayload {
                basics: self.basics,
                breakdown: self.breakdown,
            },
            regenerate,
        }
    }
}

/// Group workflow inputs derived from one Abaca company list.
#[derive(Debug, Clone, PartialEq)]
pub struct AbacaCohortInputs {
    pub group: GroupCreateInput,
    pub holdings: Vec<HoldingItem>,
}

impl AbacaCohortInputs {
    pub fn into_request(self, regenerate: bool) -> GroupReportRequest {
        ReportRequest {
            descriptor: self.group,
            payload: GroupPayload {
                holdings: self.holdings,
            },
            regenerate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbacaSource {
    client: ApiClient,
}

impl AbacaSource {
    /// The client must carry the `authorization` credential.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Source for the `[abaca]` section of `config`, sharing the scoring
    /// service's timeout and retry policy.
    pub fn from_config(config: &ImpactConfig) -> Result<Self> {
        let abaca: &AbacaConfig = config.abaca.as_ref().ok_or_else(|| {
            ImpactError::Configuration(
                "Abaca source is not configured (ABACA_BASE_URL / ABACA_API_TOKEN)"
                    .to_string(),
            )
        })?;

        let raw = ReqwestExchange::new(config.api.request_timeout)?;
        let exchange = RetryingExchange::new(Arc::new(raw), config.retry.clone());
        let client = ApiClient::new(abaca.base_url.clone(), Arc::new(exchange))
            .with_credential(AUTHORIZATION_HEADER, abaca.token.clone())?;
        Ok(Self::new(client))
    }

    /// Fetch the company, its assessments and its questionnaire answers
    /// concurrently. All three reads must succeed.
    pub async fn company_inputs(&self, company_id: &str) -> Result<AbacaCompanyInputs> {
        let company_path = ["companies", company_id, ""];
        let assessments_path = ["companies", company_id, "assessments", ""];
        let questions_path = ["matching", "questions-with-responses", company_id];
        let (company, _assessments, questions) = tokio::try_join!(
            self.client.get_json::<Value, _>(&company_path),
            self.client.get_json::<Value, _>(&assessments_path),
            self.client.get_json::<Value, _>(&questions_path),
        )?;

        let inputs = company_from_parts(&company, &questions);
        debug!(
            company_id,
            name = %inputs.basics.name,
            rows = inputs.breakdown.len(),
            "Abaca company converted"
        );
        Ok(inputs)
    }

    pub async fn cohort_inputs(&self, uid: &str) -> Result<AbacaCohortInputs> {
        let segments = ["user", "company-lists", uid, "companies"];
        let data: Value = self.client.get_json(&segments).await?;
        cohort_from_response(&data).ok_or_else(|| ImpactError::UnexpectedResponse {
            url: self
                .client
                .endpoint(&segments)
                .unwrap_or_else(|_| self.client.base_url().clone()),
            reason: "Invalid cohort response structure".to_string(),
        })
    }
}

fn company_from_parts(company: &Value, questions: &Value) -> AbacaCompanyInputs {
    let value_of = |question: u64| answer(questions, question);

    let industry = non_empty_str(company.pointer("/sectors/0/name"))
        .unwrap_or(DEFAULT_INDUSTRY)
        .to_string();
    let country = non_empty_str(company.pointer("/locations/0/country_code"))
        .unwrap_or(DEFAULT_COUNTRY)
        .to_string();

    let breakdown = value_of(Q_BREAKDOWN)
        .map(|raw| breakdown_from_answer(raw, &country))
        .unwrap_or_default();

    let basics = AssetBasics {
        currency: non_empty_str(value_of(Q_CURRENCY))
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string(),
        revenue: loose_number(value_of(Q_REVENUE)),
        revenue_growth: loose_number(value_of(Q_REVENUE_GROWTH)),
        description: non_empty_str(company.get("about")).unwrap_or_default().to_string(),
        hq_country_code: country,
        industry,
        name: non_empty_str(company.get("name"))
            .unwrap_or(DEFAULT_COMPANY_NAME)
            .to_string(),
        num_employees: employees(loose_number(value_of(Q_EMPLOYEES))),
    };

    AbacaCompanyInputs { basics, breakdown }
}

/// First response value of the question with id `question`.
fn answer(questions: &Value, question: u64) -> Option<&Value> {
    questions
        .as_array()?
        .iter()
        .find(|q| q.get("id").and_then(Value::as_u64) == Some(question))?
        .pointer("/responses/0/value")
}

/// The breakdown answer is a JSON-encoded array. Rows without a usable
/// activity id are dropped; weights that are missing or zero become 1
/// and are rescaled later.
fn breakdown_from_answer(raw: &Value, home_country: &str) -> Vec<BreakdownItem> {
    let parsed = match raw {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(error) => {
                warn!(error = %error, "unparsable breakdown answer ignored");
                return Vec::new();
            }
        },
        other => other.clone(),
    };
    let Value::Array(rows) = parsed else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let activity = loose_number(row.get("activityId"));
            if activity <= 0.0 || activity.fract() != 0.0 || activity > f64::from(u32::MAX) {
                warn!(row = %row, "breakdown row without a usable activity id dropped");
                return None;
            }
            let country = non_empty_str(row.get("countryCode")).unwrap_or(home_country);
            let weight = match loose_number(row.get("weight")) {
                w if w == 0.0 => 1.0,
                w => w,
            };
            Some(BreakdownItem::new(activity as u32, country, weight))
        })
        .collect()
}

fn cohort_from_response(data: &Value) -> Option<AbacaCohortInputs> {
    let group = data.get("group").filter(|g| !g.is_null())?;
    let holdings = data.get("holdings")?.as_array()?;

    let group = GroupCreateInput {
        description: non_empty_str(group.get("description"))
            .unwrap_or_default()
            .to_string(),
        name: non_empty_str(group.get("name"))
            .unwrap_or(DEFAULT_GROUP_NAME)
            .to_string(),
        owner: non_empty_str(group.get("owner"))
            .unwrap_or(DEFAULT_GROUP_OWNER)
            .to_string(),
    };

    let holdings = holdings
        .iter()
        .map(|h| HoldingItem::new(id_string(h.get("id")), loose_number(h.get("weight"))))
        .collect();

    Some(AbacaCohortInputs { group, holdings })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

/// Numbers and numeric strings; anything else, including NaN, is 0.
fn loose_number(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

fn employees(n: f64) -> u64 {
    if n > 0.0 { n.trunc() as u64 } else { 0 }
}

fn id_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
