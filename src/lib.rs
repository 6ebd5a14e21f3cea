//! Stash Finder - availability search for luggage stashpoints
//!
//! Given a point, a dropoff/pickup interval and a bag count, finds the
//! stashpoints that have enough free capacity for the whole interval and are
//! open at both ends of it, ordered by distance.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{AvailabilityMatcher, distance::{haversine_distance, calculate_bounding_box}};
pub use models::{Coordinate, Reservation, SearchQuery, SearchResult, Stashpoint, StashpointQuery, StashpointSearchParams};
pub use services::{ReservationStore, StashpointCatalog, StoreError};
