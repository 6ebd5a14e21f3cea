use std::collections::{HashMap, HashSet};

use crate::models::{Reservation, TimeInterval};

/// Half-open overlap test: reservations that merely touch the interval
/// endpoints do not compete for capacity.
#[inline]
pub fn overlaps(reservation: &Reservation, interval: &TimeInterval) -> bool {
    reservation.dropoff < interval.pickup && reservation.pickup > interval.dropoff
}

/// Sum reserved bags per stashpoint over an interval
///
/// Only non-cancelled reservations that overlap `interval` and belong to one
/// of `stashpoint_ids` are counted, each reservation id at most once.
/// Stashpoints without overlapping reservations are absent from the result.
pub fn booked_bags<'a, I>(
    reservations: I,
    stashpoint_ids: &[String],
    interval: &TimeInterval,
) -> HashMap<String, u32>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    let wanted: HashSet<&str> = stashpoint_ids.iter().map(String::as_str).collect();
    let mut counted: HashSet<&str> = HashSet::new();
    let mut totals: HashMap<String, u32> = HashMap::new();

    for reservation in reservations {
        if reservation.is_cancelled
            || !wanted.contains(reservation.stashpoint_id.as_str())
            || !overlaps(reservation, interval)
            || !counted.insert(reservation.id.as_str())
        {
            continue;
        }

        let total = totals.entry(reservation.stashpoint_id.clone()).or_insert(0);
        *total = total.saturating_add(reservation.bag_count);
    }

    totals
}

/// Bags still free at a stashpoint; negative when overbooked
#[inline]
pub fn available_capacity(capacity: u32, booked: &HashMap<String, u32>, stashpoint_id: &str) -> i64 {
    i64::from(capacity) - i64::from(booked.get(stashpoint_id).copied().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap()
    }

    fn reservation(id: &str, stashpoint: &str, bags: u32, from: u32, to: u32, cancelled: bool) -> Reservation {
        Reservation {
            id: id.to_string(),
            stashpoint_id: stashpoint.to_string(),
            bag_count: bags,
            dropoff: at(from),
            pickup: at(to),
            is_cancelled: cancelled,
        }
    }

    fn interval(from: u32, to: u32) -> TimeInterval {
        TimeInterval {
            dropoff: at(from),
            pickup: at(to),
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_overlap_is_half_open() {
        let booking = reservation("b1", "sp1", 1, 12, 16, false);

        assert!(overlaps(&booking, &interval(13, 15)));
        assert!(overlaps(&booking, &interval(10, 13)));
        assert!(overlaps(&booking, &interval(15, 18)));
        assert!(overlaps(&booking, &interval(10, 18)));
        assert!(!overlaps(&booking, &interval(16, 18)));
        assert!(!overlaps(&booking, &interval(8, 12)));
    }

    #[test]
    fn test_sums_per_stashpoint() {
        let reservations = vec![
            reservation("b1", "sp1", 48, 12, 16, false),
            reservation("b2", "sp1", 1, 14, 15, false),
            reservation("b3", "sp2", 5, 10, 20, false),
        ];

        let booked = booked_bags(&reservations, &ids(&["sp1", "sp2"]), &interval(13, 15));

        assert_eq!(booked.get("sp1"), Some(&49));
        assert_eq!(booked.get("sp2"), Some(&5));
    }

    #[test]
    fn test_cancelled_never_counted() {
        let reservations = vec![reservation("b1", "sp2", 90, 12, 16, true)];

        let booked = booked_bags(&reservations, &ids(&["sp2"]), &interval(13, 15));

        assert!(booked.is_empty());
    }

    #[test]
    fn test_unrequested_and_non_overlapping_absent() {
        let reservations = vec![
            reservation("b1", "sp1", 3, 8, 10, false),
            reservation("b2", "sp9", 3, 12, 16, false),
        ];

        let booked = booked_bags(&reservations, &ids(&["sp1"]), &interval(13, 15));

        assert!(booked.is_empty());
    }

    #[test]
    fn test_duplicate_reservation_counted_once() {
        let booking = reservation("b1", "sp1", 4, 12, 16, false);
        let reservations = vec![booking.clone(), booking];

        let booked = booked_bags(&reservations, &ids(&["sp1"]), &interval(13, 15));

        assert_eq!(booked.get("sp1"), Some(&4));
    }

    #[test]
    fn test_available_capacity() {
        let mut booked = HashMap::new();
        booked.insert("sp1".to_string(), 48);

        assert_eq!(available_capacity(50, &booked, "sp1"), 2);
        assert_eq!(available_capacity(50, &booked, "sp2"), 50);
        assert_eq!(available_capacity(40, &booked, "sp1"), -8);
    }
}
