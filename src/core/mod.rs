// Core algorithm exports
pub mod capacity;
pub mod distance;
pub mod filters;
pub mod matcher;

pub use capacity::{available_capacity, booked_bags, overlaps};
pub use distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box, round_km};
pub use filters::{clock_of_day, has_capacity, is_open_at, is_open_at_both, is_within_radius};
pub use matcher::{find_available, list_all, rank_available, within_radius, AvailabilityMatcher, Candidate};
