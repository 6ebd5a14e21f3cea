use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::{
    capacity::available_capacity,
    distance::{calculate_bounding_box, haversine_distance, round_km},
    filters::{has_capacity, is_open_at_both, is_within_radius},
};
use crate::models::{SearchQuery, SearchResult, Stashpoint, StashpointQuery};
use crate::services::{ReservationStore, StashpointCatalog, StoreError};

/// A candidate that passed the radius stage, with its exact distance
#[derive(Debug, Clone)]
pub struct Candidate {
    pub stashpoint: Stashpoint,
    pub distance_km: f64,
}

/// Availability search orchestrator
///
/// # Pipeline Stages
/// 1. Bounding-box pre-filter (pushed into the catalog)
/// 2. Exact distance and radius filter
/// 3. Capacity check against one batched reservation aggregate
/// 4. Opening hours at dropoff and pickup
/// 5. Ascending distance sort
///
/// Holds no mutable state; clones share the injected collaborators.
#[derive(Clone)]
pub struct AvailabilityMatcher {
    catalog: Arc<dyn StashpointCatalog>,
    reservations: Arc<dyn ReservationStore>,
}

impl AvailabilityMatcher {
    pub fn new(catalog: Arc<dyn StashpointCatalog>, reservations: Arc<dyn ReservationStore>) -> Self {
        Self { catalog, reservations }
    }

    pub fn catalog(&self) -> &Arc<dyn StashpointCatalog> {
        &self.catalog
    }

    /// Run a stashpoint query against the current store contents
    ///
    /// Any catalog or reservation store failure aborts the whole search.
    pub async fn search(&self, query: &StashpointQuery) -> Result<Vec<SearchResult>, StoreError> {
        match query {
            StashpointQuery::ListAll => {
                let stashpoints = self.catalog.list_candidates(None).await?;
                tracing::debug!("Listing {} stashpoints without filters", stashpoints.len());
                Ok(list_all(stashpoints))
            }
            StashpointQuery::Search(query) => self.search_available(query).await,
        }
    }

    async fn search_available(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, StoreError> {
        let bounds = query
            .radius_km
            .and_then(|radius| calculate_bounding_box(&query.coordinate, radius));

        let stashpoints = self.catalog.list_candidates(bounds).await?;
        let total_candidates = stashpoints.len();

        let nearby = within_radius(query, stashpoints);
        if nearby.is_empty() {
            tracing::debug!("No stashpoints within radius (from {} candidates)", total_candidates);
            return Ok(Vec::new());
        }

        let ids: Vec<String> = nearby.iter().map(|c| c.stashpoint.id.clone()).collect();
        let booked = self.reservations.sum_overlapping(&ids, &query.interval()).await?;

        let results = rank_available(query, nearby, &booked);

        tracing::debug!(
            "{} of {} candidates available for {} bags",
            results.len(),
            total_candidates,
            query.bag_count
        );

        Ok(results)
    }
}

/// Bare listing: every stashpoint in storage order, no distance
pub fn list_all(stashpoints: Vec<Stashpoint>) -> Vec<SearchResult> {
    stashpoints
        .into_iter()
        .map(|stashpoint| SearchResult {
            stashpoint,
            distance_km: None,
        })
        .collect()
}

/// Measure every candidate and drop those outside the radius
///
/// Repeated stashpoint ids keep their first occurrence only.
pub fn within_radius(query: &SearchQuery, stashpoints: Vec<Stashpoint>) -> Vec<Candidate> {
    let mut seen = HashSet::new();

    stashpoints
        .into_iter()
        .filter(|stashpoint| seen.insert(stashpoint.id.clone()))
        .filter_map(|stashpoint| {
            let distance_km = haversine_distance(&query.coordinate, &stashpoint.coordinate());
            is_within_radius(distance_km, query.radius_km).then_some(Candidate {
                stashpoint,
                distance_km,
            })
        })
        .collect()
}

/// Apply capacity and opening hours, then sort by distance
///
/// The sort is stable, so equal distances keep candidate order. Reported
/// distances are rounded but never exceed the query radius.
pub fn rank_available(
    query: &SearchQuery,
    candidates: Vec<Candidate>,
    booked: &HashMap<String, u32>,
) -> Vec<SearchResult> {
    let mut available: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| {
            let free = available_capacity(c.stashpoint.capacity, booked, &c.stashpoint.id);
            has_capacity(free, query.bag_count)
        })
        .filter(|c| is_open_at_both(&c.stashpoint, &query.dropoff, &query.pickup))
        .collect();

    available.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    available
        .into_iter()
        .map(|c| SearchResult {
            stashpoint: c.stashpoint,
            distance_km: Some(match query.radius_km {
                Some(radius) => round_km(c.distance_km).min(radius),
                None => round_km(c.distance_km),
            }),
        })
        .collect()
}

/// Full in-process match over a materialized candidate set
pub fn find_available(
    query: &SearchQuery,
    stashpoints: Vec<Stashpoint>,
    booked: &HashMap<String, u32>,
) -> Vec<SearchResult> {
    rank_available(query, within_radius(query, stashpoints), booked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone};

    fn create_candidate(id: &str, lat: f64, lon: f64, capacity: u32, hours: (u32, u32)) -> Stashpoint {
        Stashpoint {
            id: id.to_string(),
            name: format!("Stashpoint {}", id),
            description: None,
            address: "1 Test Street".to_string(),
            postal_code: "SW1A 1AA".to_string(),
            latitude: lat,
            longitude: lon,
            capacity,
            open_from: NaiveTime::from_hms_opt(hours.0, 0, 0).unwrap(),
            open_until: NaiveTime::from_hms_opt(hours.1, 0, 0).unwrap(),
            created_at: None,
        }
    }

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, hour, 0, 0)
            .unwrap()
    }

    fn create_query(bag_count: u32, radius_km: Option<f64>) -> SearchQuery {
        SearchQuery {
            coordinate: Coordinate::new(51.5074, -0.1278),
            dropoff: at(10),
            pickup: at(18),
            bag_count,
            radius_km,
        }
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.stashpoint.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_distance() {
        let candidates = vec![
            create_candidate("far", 52.0, -1.0, 30, (8, 20)),
            create_candidate("here", 51.5074, -0.1278, 50, (8, 22)),
            create_candidate("near", 51.5144, -0.1226, 100, (0, 23)),
        ];

        let results = find_available(&create_query(1, None), candidates, &HashMap::new());

        assert_eq!(ids(&results), vec!["here", "near", "far"]);
        assert!(results[0].distance_km.unwrap() < 0.1);
    }

    #[test]
    fn test_radius_excludes_far_candidates() {
        let candidates = vec![
            create_candidate("here", 51.5074, -0.1278, 50, (8, 22)),
            create_candidate("far", 52.0, -1.0, 30, (8, 20)),
        ];

        let results = find_available(&create_query(1, Some(10.0)), candidates, &HashMap::new());

        assert_eq!(ids(&results), vec!["here"]);
    }

    #[test]
    fn test_capacity_boundary() {
        let candidates = vec![create_candidate("sp1", 51.5074, -0.1278, 50, (8, 22))];
        let mut booked = HashMap::new();
        booked.insert("sp1".to_string(), 48);

        assert!(find_available(&create_query(3, None), candidates.clone(), &booked).is_empty());
        assert_eq!(find_available(&create_query(2, None), candidates, &booked).len(), 1);
    }

    #[test]
    fn test_hours_filter_applies() {
        let candidates = vec![
            create_candidate("day", 51.5074, -0.1278, 50, (9, 17)),
            create_candidate("long", 51.5080, -0.1280, 50, (6, 23)),
        ];

        let results = find_available(&create_query(1, None), candidates, &HashMap::new());

        assert_eq!(ids(&results), vec!["long"]);
    }

    #[test]
    fn test_ties_keep_candidate_order() {
        let candidates = vec![
            create_candidate("first", 51.51, -0.12, 10, (0, 23)),
            create_candidate("second", 51.51, -0.12, 10, (0, 23)),
        ];

        let results = find_available(&create_query(1, None), candidates, &HashMap::new());

        assert_eq!(ids(&results), vec!["first", "second"]);
    }

    #[test]
    fn test_duplicate_ids_returned_once() {
        let candidates = vec![
            create_candidate("sp1", 51.51, -0.12, 10, (0, 23)),
            create_candidate("sp1", 51.51, -0.12, 10, (0, 23)),
        ];

        let results = find_available(&create_query(1, None), candidates, &HashMap::new());

        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_rounded_distance_stays_within_radius() {
        let candidates = vec![Candidate {
            stashpoint: create_candidate("sp1", 51.51, -0.12, 10, (0, 23)),
            distance_km: 1.0058,
        }];

        let results = rank_available(&create_query(1, Some(1.0059)), candidates.clone(), &HashMap::new());
        assert_eq!(results[0].distance_km, Some(1.0059));

        let unbounded = rank_available(&create_query(1, None), candidates, &HashMap::new());
        assert_eq!(unbounded[0].distance_km, Some(1.01));
    }

    #[test]
    fn test_empty_candidates() {
        assert!(find_available(&create_query(1, Some(5.0)), vec![], &HashMap::new()).is_empty());
    }

    #[test]
    fn test_list_all_keeps_order_without_distance() {
        let results = list_all(vec![
            create_candidate("b", 52.0, -1.0, 30, (8, 20)),
            create_candidate("a", 51.5, -0.1, 30, (8, 20)),
        ]);

        assert_eq!(ids(&results), vec!["b", "a"]);
        assert!(results.iter().all(|r| r.distance_km.is_none()));
    }
}
