//! Discover which activity ids the service suggests for a descriptor.

use impact_model::{Activity, AssetCreateInput, ResourceId};
use tracing::{info, warn};

use crate::client::{AssetApi, CreateOutcome};
use crate::error::{ImpactError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    /// The throwaway asset created for the probe.
    pub asset_id: ResourceId,
    pub suggestions: Vec<Activity>,
    /// `false` when deleting the throwaway asset failed.
    pub cleaned_up: bool,
}

/// Create a throwaway asset, record its suggested activities, delete it.
///
/// The descriptor's name must not collide with an existing asset; a
/// conflict is an error because nothing was created to inspect.
pub async fn probe_suggested_activities(
    api: &AssetApi,
    descriptor: &AssetCreateInput,
) -> Result<ProbeReport> {
    let (asset_id, suggestions) = match api.create(descriptor).await? {
        CreateOutcome::Created { id, suggestions } => (id, suggestions),
        CreateOutcome::AlreadyExists { message } => {
            return Err(ImpactError::UnexpectedResponse {
                url: api.client().endpoint(&["asset"])?,
                reason: format!("probe asset `{}` already exists: {message}", descriptor.name),
            });
        }
    };

    match suggestions.first() {
        Some(first) => info!(
            asset_id = %asset_id,
            first_id = first.id,
            first_name = %first.name,
            count = suggestions.len(),
            "suggested activities"
        ),
        None => info!(asset_id = %asset_id, "no suggested activities"),
    }

    let cleaned_up = match api.delete(&asset_id).await {
        Ok(()) => true,
        Err(error) => {
            warn!(asset_id = %asset_id, error = %error, "failed to delete probe asset");
            false
        }
    };

    Ok(ProbeReport {
        asset_id,
        suggestions,
        cleaned_up,
    })
}
