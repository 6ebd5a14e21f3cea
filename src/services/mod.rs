// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::{BoundingBox, Stashpoint, TimeInterval};

pub use cache::{CacheKey, CacheStats, CachedCatalog};
pub use memory::InMemoryStore;
pub use postgres::PostgresClient;

/// Failures reading from the stashpoint or reservation store
///
/// All variants are retryable from the caller's point of view.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Source of candidate stashpoints
#[async_trait]
pub trait StashpointCatalog: Send + Sync {
    /// List stashpoints in storage order
    ///
    /// `bounds` is a pre-filter hint; implementations may return points
    /// outside it but must not drop points inside it.
    async fn list_candidates(&self, bounds: Option<BoundingBox>) -> Result<Vec<Stashpoint>, StoreError>;

    /// Whether the backing store is reachable
    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Read access to reservation load
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Total bags of non-cancelled reservations overlapping `interval`,
    /// keyed by stashpoint id. Stashpoints with no load are absent.
    async fn sum_overlapping(
        &self,
        stashpoint_ids: &[String],
        interval: &TimeInterval,
    ) -> Result<HashMap<String, u32>, StoreError>;
}
