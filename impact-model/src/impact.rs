//! Impact calculation status, reports and report history.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

/// Remote calculation lifecycle. Only the service moves a calculation
/// between states; clients observe it by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CalculationStatus {
    Pending,
    Active,
    Completed,
    Failed,
    /// Also used for any spelling the service adds later.
    #[default]
    #[cfg_attr(feature = "serde", serde(other))]
    Unknown,
}

impl CalculationStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, CalculationStatus::Completed | CalculationStatus::Failed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CalculationStatus::Unknown => "UNKNOWN",
            CalculationStatus::Pending => "PENDING",
            CalculationStatus::Active => "ACTIVE",
            CalculationStatus::Completed => "COMPLETED",
            CalculationStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for CalculationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalculationStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNKNOWN" => Ok(CalculationStatus::Unknown),
            "PENDING" => Ok(CalculationStatus::Pending),
            "ACTIVE" => Ok(CalculationStatus::Active),
            "COMPLETED" => Ok(CalculationStatus::Completed),
            "FAILED" => Ok(CalculationStatus::Failed),
            _ => Err(ModelError::UnknownVariant {
                kind: "calculation status",
                value: s.to_string(),
            }),
        }
    }
}

/// Body of the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImpactCalculationStatus {
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: CalculationStatus,
}

/// Computed impact report. The structure is large and owned by the
/// service, so it is kept as raw JSON; callers only ask whether it is
/// present and well formed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ImpactReport(Value);

impl ImpactReport {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// True for bodies that are error envelopes rather than reports:
    /// `null`, non-objects, or objects carrying `statusCode` or `error`.
    pub fn is_failure_shape(&self) -> bool {
        match &self.0 {
            Value::Object(map) => {
                map.is_empty()
                    || map.contains_key("statusCode")
                    || map.contains_key("error")
            }
            _ => true,
        }
    }

    pub fn report_date(&self) -> Option<&str> {
        self.0.get("reportDate").and_then(Value::as_str)
    }

    pub fn vested_impact_score(&self) -> Option<f64> {
        self.0.get("vestedImpactScore").and_then(Value::as_f64)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Summary row of a previously computed report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ReportHistoryEntry {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub report_date: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub positive_impact: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub negative_impact: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vested_impact_rating: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vested_impact_score: Option<f64>,
    /// Present on group history only.
    #[cfg_attr(feature = "serde", serde(default))]
    pub num_holdings: Option<u32>,
}

impl ReportHistoryEntry {
    #[cfg(feature = "chrono")]
    pub fn reported_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(&self.report_date)
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc))
    }
}

/// Body of the history endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReportHistory {
    #[cfg_attr(feature = "serde", serde(default))]
    pub reports: Vec<ReportHistoryEntry>,
}
