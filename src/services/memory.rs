use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::core::capacity::booked_bags;
use crate::core::distance::is_within_bounding_box;
use crate::models::{BoundingBox, Reservation, Stashpoint, TimeInterval};
use crate::services::{ReservationStore, StashpointCatalog, StoreError};

/// In-process stashpoint and reservation store
///
/// Serves small deployments and tests. Aggregation runs over the
/// materialized reservation list with the same overlap rules as the
/// database query.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    stashpoints: RwLock<Vec<Stashpoint>>,
    reservations: RwLock<Vec<Reservation>>,
}

impl InMemoryStore {
    pub fn new(stashpoints: Vec<Stashpoint>, reservations: Vec<Reservation>) -> Self {
        Self {
            stashpoints: RwLock::new(stashpoints),
            reservations: RwLock::new(reservations),
        }
    }

    pub async fn add_stashpoint(&self, stashpoint: Stashpoint) {
        self.stashpoints.write().await.push(stashpoint);
    }

    pub async fn add_reservation(&self, reservation: Reservation) {
        tracing::debug!(
            "Adding reservation {} for {} ({} bags)",
            reservation.id,
            reservation.stashpoint_id,
            reservation.bag_count
        );
        self.reservations.write().await.push(reservation);
    }

    pub async fn stashpoint_count(&self) -> usize {
        self.stashpoints.read().await.len()
    }
}

#[async_trait]
impl StashpointCatalog for InMemoryStore {
    async fn list_candidates(&self, bounds: Option<BoundingBox>) -> Result<Vec<Stashpoint>, StoreError> {
        let stashpoints = self.stashpoints.read().await;

        Ok(match bounds {
            Some(bbox) => stashpoints
                .iter()
                .filter(|sp| is_within_bounding_box(&sp.coordinate(), &bbox))
                .cloned()
                .collect(),
            None => stashpoints.clone(),
        })
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn sum_overlapping(
        &self,
        stashpoint_ids: &[String],
        interval: &TimeInterval,
    ) -> Result<HashMap<String, u32>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(booked_bags(reservations.iter(), stashpoint_ids, interval))
    }
}
