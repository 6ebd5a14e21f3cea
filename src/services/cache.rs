use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{BoundingBox, Stashpoint};
use crate::services::{StashpointCatalog, StoreError};

/// TTL cache in front of a stashpoint catalog
///
/// Stashpoint rows change rarely, so candidate lists are kept in memory for
/// a short TTL. Reservation totals are never cached here: availability must
/// reflect the store at query time.
pub struct CachedCatalog {
    inner: Arc<dyn StashpointCatalog>,
    cache: Cache<String, Arc<Vec<Stashpoint>>>,
}

impl CachedCatalog {
    /// Create a new cached catalog
    pub fn new(inner: Arc<dyn StashpointCatalog>, max_entries: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, cache }
    }

    /// Drop every cached candidate list
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
        tracing::debug!("Invalidated catalog cache");
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.entry_count(),
        }
    }
}

#[async_trait]
impl StashpointCatalog for CachedCatalog {
    async fn list_candidates(&self, bounds: Option<BoundingBox>) -> Result<Vec<Stashpoint>, StoreError> {
        let key = CacheKey::candidates(bounds.as_ref());

        if let Some(hit) = self.cache.get(&key).await {
            tracing::trace!("Catalog cache hit: {}", key);
            return Ok(hit.as_ref().clone());
        }

        tracing::trace!("Catalog cache miss: {}", key);
        let fresh = self.inner.list_candidates(bounds).await?;
        self.cache.insert(key, Arc::new(fresh.clone())).await;

        Ok(fresh)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.inner.health_check().await
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a candidate listing
    ///
    /// Edges are keyed by their exact bit patterns; two boxes share an entry
    /// only when they are identical.
    pub fn candidates(bounds: Option<&BoundingBox>) -> String {
        match bounds {
            Some(b) => format!(
                "candidates:{:016x}:{:016x}:{:016x}:{:016x}",
                b.min_lat.to_bits(),
                b.max_lat.to_bits(),
                b.min_lon.to_bits(),
                b.max_lon.to_bits()
            ),
            None => "candidates:all".to_string(),
        }
    }
}
