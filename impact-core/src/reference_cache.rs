use std::collections::HashMap;
use std::future::Future;

use impact_model::Activity;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;

/// Activities keyed by industry name.
///
/// Owned by whoever builds it (usually one [`crate::AssetBackend`]); two
/// backends never share entries unless handed the same `Arc`.
#[derive(Debug, Default)]
pub struct ActivityCache {
    entries: RwLock<HashMap<String, Vec<Activity>>>,
}

fn key(industry: &str) -> String {
    industry.trim().to_lowercase()
}

impl ActivityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, industry: &str) -> Option<Vec<Activity>> {
        self.entries.read().await.get(&key(industry)).cloned()
    }

    pub async fn insert(&self, industry: &str, activities: Vec<Activity>) {
        self.entries.write().await.insert(key(industry), activities);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Cached activities for `industry`, fetching them on a miss. Failed
    /// fetches are not cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        industry: &str,
        fetch: F,
    ) -> Result<Vec<Activity>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Activity>>>,
    {
        if let Some(hit) = self.get(industry).await {
            return Ok(hit);
        }
        let fetched = fetch().await?;
        debug!(%industry, count = fetched.len(), "caching industry activities");
        self.insert(industry, fetched.clone()).await;
        Ok(fetched)
    }
}
