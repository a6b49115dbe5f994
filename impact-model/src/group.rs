//! Asset group (weighted collection) payloads.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::ResourceId;

/// Create-time description of a group. Groups are identified by name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupCreateInput {
    pub name: String,
    pub description: String,
    pub owner: String,
}

/// Caller-supplied group descriptor before presence validation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
}

impl GroupDraft {
    pub const REQUIRED: [&'static str; 3] = ["name", "description", "owner"];

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.name.is_some(),
            self.description.is_some(),
            self.owner.is_some(),
        ];
        Self::REQUIRED
            .iter()
            .zip(present)
            .filter_map(|(field, ok)| (!ok).then_some(*field))
            .collect()
    }

    pub fn complete(&self) -> Option<GroupCreateInput> {
        Some(GroupCreateInput {
            name: self.name.clone()?,
            description: self.description.clone()?,
            owner: self.owner.clone()?,
        })
    }
}

impl From<GroupCreateInput> for GroupDraft {
    fn from(input: GroupCreateInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            owner: Some(input.owner),
        }
    }
}

/// One row of a group's membership allocation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HoldingItem {
    pub id: String,
    pub weight: f64,
}

impl HoldingItem {
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }
}

/// Holding row as echoed back by the service on group reads.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct GroupHolding {
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_impact: bool,
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    pub weight: f64,
}

/// Group record held by the remote service.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Group {
    pub id: ResourceId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub owner: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub holdings: Vec<GroupHolding>,
}
