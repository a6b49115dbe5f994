//! Asset (single scored entity) payloads.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::ResourceId;
use crate::reference::Activity;

/// Create-time description of an asset. The pair `(name, industry)` is the
/// identity used when matching search results.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AssetCreateInput {
    pub name: String,
    pub description: String,
    pub industry: String,
    pub hq_country_code: String,
    pub num_employees: u64,
}

/// Descriptive "basics" pushed before an impact calculation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AssetBasics {
    pub currency: String,
    pub description: String,
    pub hq_country_code: String,
    pub industry: String,
    pub name: String,
    pub num_employees: u64,
    pub revenue: f64,
    pub revenue_growth: f64,
}

impl AssetBasics {
    /// The create-time subset of the basics.
    pub fn create_input(&self) -> AssetCreateInput {
        AssetCreateInput {
            name: self.name.clone(),
            description: self.description.clone(),
            industry: self.industry.clone(),
            hq_country_code: self.hq_country_code.clone(),
            num_employees: self.num_employees,
        }
    }
}

/// Caller-supplied asset descriptor before presence validation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AssetDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub hq_country_code: Option<String>,
    pub num_employees: Option<u64>,
}

impl AssetDraft {
    pub const REQUIRED: [&'static str; 5] = [
        "description",
        "hqCountryCode",
        "industry",
        "name",
        "numEmployees",
    ];

    /// Wire names of every required field that is absent.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.description.is_some(),
            self.hq_country_code.is_some(),
            self.industry.is_some(),
            self.name.is_some(),
            self.num_employees.is_some(),
        ];
        Self::REQUIRED
            .iter()
            .zip(present)
            .filter_map(|(field, ok)| (!ok).then_some(*field))
            .collect()
    }

    /// Promote to a create input when every field is present.
    pub fn complete(&self) -> Option<AssetCreateInput> {
        Some(AssetCreateInput {
            name: self.name.clone()?,
            description: self.description.clone()?,
            industry: self.industry.clone()?,
            hq_country_code: self.hq_country_code.clone()?,
            num_employees: self.num_employees?,
        })
    }
}

impl From<AssetCreateInput> for AssetDraft {
    fn from(input: AssetCreateInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            industry: Some(input.industry),
            hq_country_code: Some(input.hq_country_code),
            num_employees: Some(input.num_employees),
        }
    }
}

/// Caller-supplied basics before presence validation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AssetBasicsDraft {
    pub currency: Option<String>,
    pub revenue: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub description: Option<String>,
    pub hq_country_code: Option<String>,
    pub industry: Option<String>,
    pub name: Option<String>,
    pub num_employees: Option<u64>,
}

impl AssetBasicsDraft {
    pub const REQUIRED: [&'static str; 8] = [
        "currency",
        "revenue",
        "revenueGrowth",
        "description",
        "hqCountryCode",
        "industry",
        "name",
        "numEmployees",
    ];

    /// Fields that must be JSON numbers rather than numeric strings.
    pub const NUMERIC: [&'static str; 3] =
        ["revenue", "revenueGrowth", "numEmployees"];

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.currency.is_some(),
            self.revenue.is_some(),
            self.revenue_growth.is_some(),
            self.description.is_some(),
            self.hq_country_code.is_some(),
            self.industry.is_some(),
            self.name.is_some(),
            self.num_employees.is_some(),
        ];
        Self::REQUIRED
            .iter()
            .zip(present)
            .filter_map(|(field, ok)| (!ok).then_some(*field))
            .collect()
    }

    pub fn complete(&self) -> Option<AssetBasics> {
        Some(AssetBasics {
            currency: self.currency.clone()?,
            description: self.description.clone()?,
            hq_country_code: self.hq_country_code.clone()?,
            industry: self.industry.clone()?,
            name: self.name.clone()?,
            num_employees: self.num_employees?,
            revenue: self.revenue?,
            revenue_growth: self.revenue_growth?,
        })
    }
}

impl From<AssetBasics> for AssetBasicsDraft {
    fn from(basics: AssetBasics) -> Self {
        Self {
            currency: Some(basics.currency),
            revenue: Some(basics.revenue),
            revenue_growth: Some(basics.revenue_growth),
            description: Some(basics.description),
            hq_country_code: Some(basics.hq_country_code),
            industry: Some(basics.industry),
            name: Some(basics.name),
            num_employees: Some(basics.num_employees),
        }
    }
}

/// One row of an asset's activity/geography allocation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BreakdownItem {
    pub activity_id: u32,
    pub country_code: String,
    pub weight: f64,
}

impl BreakdownItem {
    pub fn new(
        activity_id: u32,
        country_code: impl Into<String>,
        weight: f64,
    ) -> Self {
        Self {
            activity_id,
            country_code: country_code.into(),
            weight,
        }
    }
}

/// Breakdown row as echoed back by the service on asset reads.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AssetBreakdownEntry {
    pub activity: String,
    pub activity_id: u32,
    pub country: String,
    pub country_code: String,
    pub weight: f64,
}

/// Asset record held by the remote service.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Asset {
    pub id: ResourceId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    pub industry: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hq_country_code: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub num_employees: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub breakdown: Vec<AssetBreakdownEntry>,
}

/// Successful create response: the new asset plus suggested activities
/// derived from its description and industry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AssetCreateResponse {
    pub asset: Asset,
    #[cfg_attr(feature = "serde", serde(default))]
    pub suggested_activities: Vec<Activity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_every_absent_field() {
        let draft = AssetDraft {
            name: Some("Acme".into()),
            industry: Some("Software".into()),
            ..AssetDraft::default()
        };
        assert_eq!(
            draft.missing_fields(),
            vec!["description", "hqCountryCode", "numEmployees"]
        );
        assert!(draft.complete().is_none());
    }

    #[test]
    fn basics_draft_completes_when_full() {
        let basics = AssetBasics {
            currency: "USD".into(),
            description: "Tools".into(),
            hq_country_code: "US".into(),
            industry: "Software".into(),
            name: "Acme".into(),
            num_employees: 12,
            revenue: 1_000.0,
            revenue_growth: 0.1,
        };
        let draft = AssetBasicsDraft::from(basics.clone());
        assert!(draft.missing_fields().is_empty());
        assert_eq!(draft.complete(), Some(basics.clone()));
        assert_eq!(basics.create_input().name, "Acme");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn breakdown_item_uses_camel_case() {
        let item = BreakdownItem::new(11, "US", 0.5);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"activityId": 11, "countryCode": "US", "weight": 0.5})
        );
    }
}
