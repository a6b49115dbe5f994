//! The capability interface the generic workflow runs against, and its
//! asset and group adapters.

mod asset;
mod group;

pub use asset::{AssetBackend, AssetPayload};
pub use group::{GroupBackend, GroupPayload};

use std::fmt;

use async_trait::async_trait;
use impact_model::{
    Activity, AssetCreateInput, CalculationStatus, GroupCreateInput,
    ImpactReport, ReportHistory, ResourceId, ResourceKind, SearchHit,
};

use crate::client::CreateOutcome;
use crate::error::{Result, ValidationError};
use crate::normalize::{NormalizationReport, Normalizer};

/// Create-time description of a resource, and its identifying key.
pub trait ResourceDescriptor: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Whether a search hit is this resource.
    fn matches(&self, hit: &SearchHit) -> bool;
}

/// Assets are identified by name and industry.
impl ResourceDescriptor for AssetCreateInput {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, hit: &SearchHit) -> bool {
        hit.name == self.name && hit.industry.as_deref() == Some(self.industry.as_str())
    }
}

/// Groups are identified by name alone.
impl ResourceDescriptor for GroupCreateInput {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, hit: &SearchHit) -> bool {
        hit.name == self.name
    }
}

/// Descriptive data pushed before a calculation is triggered.
pub trait ReportPayload: fmt::Debug + Send + Sync {
    /// Bring the payload into shape for the service. `suggestions` are the
    /// activities proposed when the resource was created, if any.
    fn normalize(
        &mut self,
        suggestions: &[Activity],
        normalizer: &Normalizer,
    ) -> std::result::Result<NormalizationReport, ValidationError>;
}

/// Everything the report workflow needs from the remote service for one
/// resource kind.
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    type Descriptor: ResourceDescriptor;
    type Payload: ReportPayload;

    const KIND: ResourceKind;

    async fn create(&self, descriptor: &Self::Descriptor) -> Result<CreateOutcome>;

    async fn search(&self, name: &str) -> Result<Vec<SearchHit>>;

    /// Store the descriptive data. Every write must land before
    /// [`ResourceBackend::trigger`] is called.
    async fn push(&self, id: &ResourceId, payload: &Self::Payload) -> Result<()>;

    async fn trigger(&self, id: &ResourceId) -> Result<()>;

    async fn poll_status(&self, id: &ResourceId) -> Result<CalculationStatus>;

    async fn get_report(&self, id: &ResourceId) -> Result<ImpactReport>;

    async fn list_history(&self, id: &ResourceId) -> Result<ReportHistory>;

    async fn delete_history_entry(
        &self,
        id: &ResourceId,
        report_id: &str,
    ) -> Result<()>;

    /// Suggestions to validate against when creation produced none (for
    /// example because the resource already existed).
    async fn fallback_suggestions(
        &self,
        _descriptor: &Self::Descriptor,
    ) -> Vec<Activity> {
        Vec::new()
    }
}
