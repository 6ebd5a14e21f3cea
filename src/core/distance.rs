use std::f64::consts::{FRAC_PI_2, PI};

use geo::{HaversineDistance, Point};

use crate::models::{BoundingBox, Coordinate};

/// Mean Earth radius in kilometers, matching `geo`'s haversine
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Widens bounding boxes so rounding never excludes a point on the radius
const BOUNDS_MARGIN: f64 = 1.001;

/// Great-circle distance between two points in kilometers
///
/// Uses the haversine formula on a spherical Earth, so it is continuous
/// across the antimeridian and at the poles.
#[inline]
pub fn haversine_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let a = Point::new(from.longitude, from.latitude);
    let b = Point::new(to.longitude, to.latitude);

    (a.haversine_distance(&b) / 1000.0).max(0.0)
}

/// Round a distance to two decimal places for presentation
#[inline]
pub fn round_km(distance_km: f64) -> f64 {
    (distance_km * 100.0).round() / 100.0
}

/// Calculate a bounding box enclosing every point within `radius_km`
///
/// Returns `None` when the circle reaches a pole or crosses the
/// antimeridian; a single lat/lon box cannot express those regions, so the
/// caller should skip the pre-filter rather than lose candidates.
pub fn calculate_bounding_box(center: &Coordinate, radius_km: f64) -> Option<BoundingBox> {
    let angular = radius_km * BOUNDS_MARGIN / EARTH_RADIUS_KM;
    if !angular.is_finite() || angular >= FRAC_PI_2 {
        return None;
    }

    let lat = center.latitude.to_radians();
    let min_lat = lat - angular;
    let max_lat = lat + angular;
    if min_lat <= -FRAC_PI_2 || max_lat >= FRAC_PI_2 {
        return None;
    }

    // Widest longitude reach of a spherical cap
    let reach = angular.sin() / lat.cos();
    if reach >= 1.0 {
        return None;
    }
    let delta_lon = reach.asin();

    let lon = center.longitude.to_radians();
    let min_lon = lon - delta_lon;
    let max_lon = lon + delta_lon;
    if min_lon < -PI || max_lon > PI {
        return None;
    }

    Some(BoundingBox {
        min_lat: min_lat.to_degrees(),
        max_lat: max_lat.to_degrees(),
        min_lon: min_lon.to_degrees(),
        max_lon: max_lon.to_degrees(),
    })
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(point: &Coordinate, bbox: &BoundingBox) -> bool {
    point.latitude >= bbox.min_lat
        && point.latitude <= bbox.max_lat
        && point.longitude >= bbox.min_lon
        && point.longitude <= bbox.max_lon
}
