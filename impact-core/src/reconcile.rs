//! Create-or-adopt: map a descriptor to exactly one remote id.
//!
//! There is no upsert endpoint, so creation is attempted first and a
//! conflict (or a failed create) falls back to searching by name. The asset
//! client checks the listing before it posts; the service itself accepts
//! duplicate asset names. Two concurrent reconciliations of a brand-new
//! resource may both create; later searches still converge on a single id.

use std::sync::Arc;

use impact_model::{Activity, ResourceId};
use tracing::{info, warn};

use crate::backend::{ResourceBackend, ResourceDescriptor};
use crate::client::CreateOutcome;
use crate::error::{ReconciliationError, Result};

/// The id a descriptor resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// The one remote id for the descriptor.
    pub id: ResourceId,
    /// Activities suggested by a fresh create; empty for adopted resources.
    pub suggestions: Vec<Activity>,
    /// `true` when the id was found by search rather than created.
    pub pre_existing: bool,
}

/// Resolves descriptors to remote ids through a [`ResourceBackend`].
#[derive(Debug)]
pub struct Reconciler<B> {
    backend: Arc<B>,
}

impl<B: ResourceBackend> Reconciler<B> {
    /// Reconciler over `backend`.
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Create the resource, or adopt the listed one matching `descriptor`.
    ///
    /// Errors with [`ReconciliationError`] when neither path yields an id.
    pub async fn reconcile(&self, descriptor: &B::Descriptor) -> Result<Reconciled> {
        let kind = B::KIND.label();
        let name = descriptor.name();

        let create_error = match self.backend.create(descriptor).await {
            Ok(CreateOutcome::Created { id, suggestions }) => {
                info!(resource_id = %id, %name, kind, "created");
                return Ok(Reconciled {
                    id,
                    suggestions,
                    pre_existing: false,
                });
            }
            Ok(CreateOutcome::AlreadyExists { message }) => {
                info!(%name, kind, %message, "already exists; searching");
                None
            }
            Err(error) => {
                warn!(%name, kind, error = %error, "create failed; searching");
                Some(error.to_string())
            }
        };

        let hits = match self.backend.search(name).await {
            Ok(hits) => hits,
            Err(error) => {
                return Err(ReconciliationError::SearchFailed {
                    kind,
                    name: name.to_string(),
                    create_error,
                    search_error: error.to_string(),
                }
                .into());
            }
        };

        match hits.into_iter().find(|hit| descriptor.matches(hit)) {
            Some(hit) => {
                info!(resource_id = %hit.id, %name, kind, "adopted existing");
                Ok(Reconciled {
                    id: hit.id,
                    suggestions: Vec::new(),
                    pre_existing: true,
                })
            }
            None => Err(ReconciliationError::NotFound {
                kind,
                name: name.to_string(),
                create_error,
            }
            .into()),
        }
    }
}
