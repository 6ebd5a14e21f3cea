use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};

use crate::models::Stashpoint;

/// Wall-clock time of an instant at minute precision, date ignored
#[inline]
pub fn clock_of_day(instant: &DateTime<FixedOffset>) -> NaiveTime {
    let time = instant.time();
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// Check a clock time against the stashpoint's daily window (inclusive)
///
/// Windows wrapping midnight are not modelled; `open_from <= open_until`
/// is assumed.
#[inline]
pub fn is_open_at(stashpoint: &Stashpoint, clock: NaiveTime) -> bool {
    stashpoint.open_from <= clock && clock <= stashpoint.open_until
}

/// The stashpoint must be open at dropoff and again at pickup
#[inline]
pub fn is_open_at_both(
    stashpoint: &Stashpoint,
    dropoff: &DateTime<FixedOffset>,
    pickup: &DateTime<FixedOffset>,
) -> bool {
    is_open_at(stashpoint, clock_of_day(dropoff)) && is_open_at(stashpoint, clock_of_day(pickup))
}

/// Inclusive radius check; no radius means no limit
#[inline]
pub fn is_within_radius(distance_km: f64, radius_km: Option<f64>) -> bool {
    radius_km.map_or(true, |radius| distance_km <= radius)
}

/// Enough free capacity for the requested bags (exact fit allowed)
#[inline]
pub fn has_capacity(available: i64, bag_count: u32) -> bool {
    available >= i64::from(bag_count)
}
