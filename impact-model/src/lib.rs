//! Core data model definitions shared across the impact report crates.
//!
//! Types mirror the JSON shapes exchanged with the remote scoring service.
//! Enabling the `serde` feature derives (de)serialization with the
//! service's camelCase field names; `chrono` adds typed date accessors.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod asset;
pub mod error;
pub mod group;
pub mod ids;
pub mod impact;
pub mod outcome;
pub mod policy;
pub mod reference;
pub mod search;

// Intentionally curated re-exports for downstream consumers.
pub use asset::{
    Asset, AssetBasics, AssetBasicsDraft, AssetBreakdownEntry,
    AssetCreateInput, AssetCreateResponse, AssetDraft, BreakdownItem,
};
pub use error::{ModelError, Result as ModelResult};
pub use group::{Group, GroupCreateInput, GroupDraft, GroupHolding, HoldingItem};
pub use ids::{ResourceId, ResourceKind};
pub use impact::{
    CalculationStatus, ImpactCalculationStatus, ImpactReport, ReportHistory,
    ReportHistoryEntry,
};
pub use outcome::{OutcomeStatus, ReportOutcome};
pub use policy::UnknownActivityPolicy;
pub use reference::{
    Activities, Activity, Countries, Country, Currencies, Currency, Industries,
    Region, Regions,
};
pub use search::{AssetSearchHit, GroupSearchHit, SearchHit, SearchResults};
