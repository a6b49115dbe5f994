//! Search-by-name results for assets and groups.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::ResourceId;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssetSearchHit {
    pub id: ResourceId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub industry: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupSearchHit {
    pub id: ResourceId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub owner: String,
}

/// Body of a search endpoint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchResults<T> {
    #[cfg_attr(feature = "serde", serde(default = "Vec::new"))]
    pub results: Vec<T>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub query: String,
}

/// Kind-independent view of a search hit used for identity matching.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: ResourceId,
    pub name: String,
    pub industry: Option<String>,
    pub owner: Option<String>,
}

impl From<AssetSearchHit> for SearchHit {
    fn from(hit: AssetSearchHit) -> Self {
        Self {
            id: hit.id,
            name: hit.name,
            industry: Some(hit.industry),
            owner: None,
        }
    }
}

impl From<GroupSearchHit> for SearchHit {
    fn from(hit: GroupSearchHit) -> Self {
        Self {
            id: hit.id,
            name: hit.name,
            industry: None,
            owner: Some(hit.owner),
        }
    }
}
