//! Caller-facing request types and eager validation.
//!
//! Everything here runs before any network call. Presence is checked
//! before typing: a body that is both incomplete and mistyped reports its
//! missing fields first. Each failure lists every offending field.

use impact_model::{
    AssetBasicsDraft, AssetCreateInput, AssetDraft, BreakdownItem,
    GroupCreateInput, GroupDraft, HoldingItem,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::backend::{AssetPayload, GroupPayload};
use crate::error::ValidationError;

/// A validated workflow request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest<D, P> {
    pub descriptor: D,
    pub payload: P,
    /// Purge stored reports and recompute even if a report exists.
    pub regenerate: bool,
}

pub type AssetReportRequest = ReportRequest<AssetCreateInput, AssetPayload>;
pub type GroupReportRequest = ReportRequest<GroupCreateInput, GroupPayload>;

/// Asset request as supplied by a caller; required fields may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetReportDraft {
    #[serde(default)]
    pub asset: AssetDraft,
    #[serde(default)]
    pub basics: AssetBasicsDraft,
    #[serde(default)]
    pub breakdown: Vec<BreakdownItem>,
    #[serde(default, alias = "regenerateReport")]
    pub regenerate: bool,
    /// Numeric fields that arrived with another JSON type; reported by
    /// [`validate`](Self::validate) once presence has passed.
    #[serde(skip)]
    pub not_numeric: Vec<String>,
}

impl AssetReportDraft {
    /// Parse a raw JSON body. Mistyped breakdown rows are rejected here,
    /// all at once. Numeric fields given as strings are set aside for
    /// [`validate`](Self::validate).
    pub fn from_json(raw: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut root) = raw else {
            return Err(ValidationError::Malformed(
                "expected a JSON object".into(),
            ));
        };

        let mut not_numeric = Vec::new();
        if let Some(Value::Object(asset)) = root.get_mut("asset") {
            take_non_numeric(asset, "asset", &["numEmployees"], &mut not_numeric);
        }
        if let Some(Value::Object(basics)) = root.get_mut("basics") {
            take_non_numeric(basics, "basics", &AssetBasicsDraft::NUMERIC, &mut not_numeric);
        }

        let breakdown = unwrap_collection(&mut root, "breakdown")?;
        let mut invalid = Vec::new();
        for (index, item) in breakdown.iter().enumerate() {
            check_breakdown_row(index, item, &mut invalid);
        }
        if !invalid.is_empty() {
            return Err(ValidationError::InvalidItems(invalid));
        }
        root.insert("breakdown".into(), Value::Array(breakdown));

        let mut draft: Self = serde_json::from_value(Value::Object(root))
            .map_err(|err| ValidationError::Malformed(err.to_string()))?;
        draft.not_numeric = not_numeric;
        Ok(draft)
    }

    /// Presence first, then numeric typing, then promotion to a request.
    pub fn validate(self) -> Result<AssetReportRequest, ValidationError> {
        let missing: Vec<String> = self
            .asset
            .missing_fields()
            .into_iter()
            .map(|field| format!("asset.{field}"))
            .chain(
                self.basics
                    .missing_fields()
                    .into_iter()
                    .map(|field| format!("basics.{field}")),
            )
            .filter(|field| !self.not_numeric.contains(field))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        if !self.not_numeric.is_empty() {
            return Err(ValidationError::NotNumeric(self.not_numeric));
        }

        let (Some(descriptor), Some(basics)) =
            (self.asset.complete(), self.basics.complete())
        else {
            return Err(ValidationError::Malformed(
                "asset or basics incomplete".into(),
            ));
        };

        Ok(ReportRequest {
            descriptor,
            payload: AssetPayload {
                basics,
                breakdown: self.breakdown,
            },
            regenerate: self.regenerate,
        })
    }
}

/// Group request as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GroupReportDraft {
    #[serde(default)]
    pub group: GroupDraft,
    #[serde(default)]
    pub holdings: Vec<HoldingItem>,
    #[serde(default, alias = "regenerateReport")]
    pub regenerate: bool,
}

impl GroupReportDraft {
    /// Parse a raw JSON body. `holdings` may be a bare array or wrapped as
    /// `{"holdings": [...]}`.
    pub fn from_json(raw: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut root) = raw else {
            return Err(ValidationError::Malformed(
                "expected a JSON object".into(),
            ));
        };

        let holdings = unwrap_collection(&mut root, "holdings")?;
        let mut invalid = Vec::new();
        for (index, item) in holdings.iter().enumerate() {
            check_holding_row(index, item, &mut invalid);
        }
        if !invalid.is_empty() {
            return Err(ValidationError::InvalidItems(invalid));
        }
        root.insert("holdings".into(), Value::Array(holdings));

        serde_json::from_value(Value::Object(root))
            .map_err(|err| ValidationError::Malformed(err.to_string()))
    }

    pub fn validate(self) -> Result<GroupReportRequest, ValidationError> {
        let missing: Vec<String> = self
            .group
            .missing_fields()
            .into_iter()
            .map(|field| format!("group.{field}"))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        if self.holdings.is_empty() {
            return Err(ValidationError::EmptyHoldings);
        }
        let Some(descriptor) = self.group.complete() else {
            return Err(ValidationError::Malformed("group incomplete".into()));
        };

        Ok(ReportRequest {
            descriptor,
            payload: GroupPayload {
                holdings: self.holdings,
            },
            regenerate: self.regenerate,
        })
    }
}

/// Remove every field in `fields` that holds something other than a
/// usable number, recording its path.
fn take_non_numeric(
    object: &mut Map<String, Value>,
    prefix: &str,
    fields: &[&str],
    out: &mut Vec<String>,
) {
    for field in fields {
        let usable = match object.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::Number(n)) => *field != "numEmployees" || n.is_u64(),
            Some(_) => false,
        };
        if !usable {
            object.remove(*field);
            out.push(format!("{prefix}.{field}"));
        }
    }
}

/// Take `field` out of `root` as an array, accepting `{field: [...]}`
/// wrapping. Absent or null means empty.
fn unwrap_collection(
    root: &mut Map<String, Value>,
    field: &str,
) -> Result<Vec<Value>, ValidationError> {
    match root.remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Object(mut wrapper)) => match wrapper.remove(field) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ValidationError::Malformed(format!(
                "{field} must be provided as [...] or {{\"{field}\": [...]}}"
            ))),
        },
        Some(_) => Err(ValidationError::Malformed(format!(
            "{field} must be an array"
        ))),
    }
}

fn check_breakdown_row(index: usize, item: &Value, out: &mut Vec<String>) {
    let Value::Object(row) = item else {
        out.push(format!("breakdown[{index}]"));
        return;
    };
    let activity_ok = row
        .get("activityId")
        .and_then(Value::as_u64)
        .is_some_and(|id| u32::try_from(id).is_ok());
    if !activity_ok {
        out.push(format!("breakdown[{index}].activityId"));
    }
    let country_ok = row
        .get("countryCode")
        .and_then(Value::as_str)
        .is_some_and(|code| code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()));
    if !country_ok {
        out.push(format!("breakdown[{index}].countryCode"));
    }
    if !row.get("weight").and_then(Value::as_f64).is_some_and(|w| w >= 0.0) {
        out.push(format!("breakdown[{index}].weight"));
    }
}

fn check_holding_row(index: usize, item: &Value, out: &mut Vec<String>) {
    let Value::Object(row) = item else {
        out.push(format!("holdings[{index}]"));
        return;
    };
    let id_ok = match row.get("id") {
        Some(Value::String(id)) => !id.trim().is_empty(),
        _ => false,
    };
    if !id_ok {
        out.push(format!("holdings[{index}].id"));
    }
    if !row.get("weight").and_then(Value::as_f64).is_some_and(|w| w >= 0.0) {
        out.push(format!("holdings[{index}].weight"));
    }
}
