use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::models::domain::{Coordinate, SearchQuery, StashpointQuery};

/// Raw query-string parameters for the stashpoint search endpoint
///
/// Every field is kept as text so that unparseable values are reported as
/// field errors instead of rejecting the whole query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StashpointSearchParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub dropoff: Option<String>,
    pub pickup: Option<String>,
    pub bag_count: Option<String>,
    pub radius_km: Option<String>,
}

/// Why a single parameter was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Missing,
    InvalidFormat,
    OutOfRange,
    InvalidOrder,
}

/// A field-level validation failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind,
        }
    }
}

/// Reporting order for field errors
const FIELD_ORDER: [&str; 6] = ["lat", "lng", "dropoff", "pickup", "bag_count", "radius_km"];

fn field_rank(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|name| *name == field)
        .unwrap_or(FIELD_ORDER.len())
}

/// Parsed values awaiting range checks
#[derive(Debug, Validate)]
struct ParsedParams {
    #[validate(range(min = -90.0, max = 90.0, code = "out_of_range", message = "Latitude must be between -90 and 90"))]
    lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, code = "out_of_range", message = "Longitude must be between -180 and 180"))]
    lng: Option<f64>,
    #[validate(range(min = 1, code = "out_of_range", message = "bag_count must be greater than 0"))]
    bag_count: Option<i64>,
    #[validate(range(exclusive_min = 0.0, code = "out_of_range", message = "radius_km must be greater than 0"))]
    radius_km: Option<f64>,
}

impl StashpointSearchParams {
    /// True when the caller sent none of the search parameters
    pub fn is_empty(&self) -> bool {
        [
            &self.lat,
            &self.lng,
            &self.dropoff,
            &self.pickup,
            &self.bag_count,
            &self.radius_km,
        ]
        .iter()
        .all(|value| value.is_none())
    }

    /// Validate into a query, reporting every failing field at once
    ///
    /// `pickup <= dropoff` is only checked when both instants parsed.
    pub fn into_query(self) -> Result<StashpointQuery, Vec<FieldError>> {
        if self.is_empty() {
            return Ok(StashpointQuery::ListAll);
        }

        let mut errors = Vec::new();

        let lat = required("lat", self.lat.as_deref(), parse_float, &mut errors);
        let lng = required("lng", self.lng.as_deref(), parse_float, &mut errors);
        let dropoff = required("dropoff", self.dropoff.as_deref(), parse_instant, &mut errors);
        let pickup = required("pickup", self.pickup.as_deref(), parse_instant, &mut errors);
        let bag_count = required("bag_count", self.bag_count.as_deref(), parse_integer, &mut errors);
        let radius_km = optional("radius_km", self.radius_km.as_deref(), parse_float, &mut errors);

        let parsed = ParsedParams {
            lat,
            lng,
            bag_count,
            radius_km,
        };
        if let Err(failures) = parsed.validate() {
            for (field, field_errors) in failures.field_errors() {
                for failure in field_errors {
                    let message = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is out of range", field));
                    errors.push(FieldError::new(field.to_string(), message, FieldErrorKind::OutOfRange));
                }
            }
        }

        let bag_count = match bag_count.filter(|count| *count >= 1).map(u32::try_from) {
            Some(Ok(count)) => Some(count),
            Some(Err(_)) => {
                errors.push(FieldError::new(
                    "bag_count",
                    format!("bag_count must not exceed {}", u32::MAX),
                    FieldErrorKind::OutOfRange,
                ));
                None
            }
            None => None,
        };

        if let (Some(dropoff), Some(pickup)) = (dropoff, pickup) {
            if pickup <= dropoff {
                errors.push(FieldError::new(
                    "pickup",
                    "Pickup time must be after dropoff time",
                    FieldErrorKind::InvalidOrder,
                ));
            }
        }

        if !errors.is_empty() {
            errors.sort_by_key(|error| field_rank(&error.field));
            return Err(errors);
        }

        let (Some(lat), Some(lng), Some(dropoff), Some(pickup), Some(bag_count)) =
            (lat, lng, dropoff, pickup, bag_count)
        else {
            return Err(errors);
        };

        Ok(StashpointQuery::Search(SearchQuery {
            coordinate: Coordinate::new(lat, lng),
            dropoff,
            pickup,
            bag_count,
            radius_km,
        }))
    }
}

/// Failure to parse a single raw value
#[derive(Debug)]
struct ParseFailure(String);

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn required<T>(
    field: &str,
    raw: Option<&str>,
    parse: fn(&str, &str) -> Result<T, ParseFailure>,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => record(field, parse(field, value), errors),
        None => {
            errors.push(FieldError::new(
                field,
                format!("{} is required", field),
                FieldErrorKind::Missing,
            ));
            None
        }
    }
}

fn optional<T>(
    field: &str,
    raw: Option<&str>,
    parse: fn(&str, &str) -> Result<T, ParseFailure>,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    let value = raw.map(str::trim).filter(|value| !value.is_empty())?;
    record(field, parse(field, value), errors)
}

fn record<T>(field: &str, parsed: Result<T, ParseFailure>, errors: &mut Vec<FieldError>) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(failure) => {
            errors.push(FieldError::new(field, failure.to_string(), FieldErrorKind::InvalidFormat));
            None
        }
    }
}

fn parse_float(field: &str, value: &str) -> Result<f64, ParseFailure> {
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| ParseFailure(format!("{} must be a number", field)))
}

fn parse_integer(field: &str, value: &str) -> Result<i64, ParseFailure> {
    value
        .parse::<i64>()
        .map_err(|_| ParseFailure(format!("{} must be an integer", field)))
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC
fn parse_instant(field: &str, value: &str) -> Result<DateTime<FixedOffset>, ParseFailure> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .map_err(|_| ParseFailure(format!("{} must be an ISO-8601 timestamp", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> StashpointSearchParams {
        let mut params = StashpointSearchParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "lat" => params.lat = value,
                "lng" => params.lng = value,
                "dropoff" => params.dropoff = value,
                "pickup" => params.pickup = value,
                "bag_count" => params.bag_count = value,
                "radius_km" => params.radius_km = value,
                other => panic!("unknown parameter {}", other),
            }
        }
        params
    }

    fn valid() -> Vec<(&'static str, &'static str)> {
        vec![
            ("lat", "51.5074"),
            ("lng", "-0.1278"),
            ("dropoff", "2024-01-15T10:00:00Z"),
            ("pickup", "2024-01-15T18:00:00Z"),
            ("bag_count", "2"),
        ]
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_no_params_is_listing() {
        let query = StashpointSearchParams::default().into_query().unwrap();
        assert_eq!(query, StashpointQuery::ListAll);
    }

    #[test]
    fn test_valid_params() {
        let mut pairs = valid();
        pairs.push(("radius_km", "5.0"));

        let StashpointQuery::Search(query) = params(&pairs).into_query().unwrap() else {
            panic!("expected a search query");
        };

        assert_eq!(query.coordinate, Coordinate::new(51.5074, -0.1278));
        assert_eq!(query.bag_count, 2);
        assert_eq!(query.radius_km, Some(5.0));
        assert!(query.pickup > query.dropoff);
    }

    #[test]
    fn test_missing_fields_reported_together() {
        let errors = params(&[("lat", "51.5074"), ("lng", "-0.1278")])
            .into_query()
            .unwrap_err();

        assert_eq!(fields(&errors), vec!["dropoff", "pickup", "bag_count"]);
        assert!(errors.iter().all(|e| e.kind == FieldErrorKind::Missing));
    }

    #[test]
    fn test_out_of_range_coordinates() {
        let mut pairs = valid();
        pairs[0] = ("lat", "91.0");
        pairs[1] = ("lng", "-181.0");

        let errors = params(&pairs).into_query().unwrap_err();

        assert_eq!(fields(&errors), vec!["lat", "lng"]);
        assert!(errors.iter().all(|e| e.kind == FieldErrorKind::OutOfRange));
        assert_eq!(errors[0].message, "Latitude must be between -90 and 90");
    }

    #[test]
    fn test_boundary_coordinates_accepted() {
        let mut pairs = valid();
        pairs[0] = ("lat", "-90");
        pairs[1] = ("lng", "180");

        assert!(params(&pairs).into_query().is_ok());
    }

    #[test]
    fn test_non_positive_radius_rejected() {
        let mut pairs = valid();
        pairs.push(("radius_km", "0"));

        let errors = params(&pairs).into_query().unwrap_err();

        assert_eq!(fields(&errors), vec!["radius_km"]);
        assert_eq!(errors[0].kind, FieldErrorKind::OutOfRange);
    }

    #[test]
    fn test_pickup_not_after_dropoff() {
        let mut pairs = valid();
        pairs[3] = ("pickup", "2024-01-15T10:00:00Z");

        let errors = params(&pairs).into_query().unwrap_err();

        assert_eq!(fields(&errors), vec!["pickup"]);
        assert_eq!(errors[0].kind, FieldErrorKind::InvalidOrder);
    }

    #[test]
    fn test_three_distinct_failures() {
        let errors = params(&[
            ("lat", "51.5074"),
            ("lng", "-0.1278"),
            ("pickup", "tomorrow"),
            ("bag_count", "0"),
        ])
        .into_query()
        .unwrap_err();

        assert_eq!(fields(&errors), vec!["dropoff", "pickup", "bag_count"]);
        assert_eq!(errors[0].kind, FieldErrorKind::Missing);
        assert_eq!(errors[1].kind, FieldErrorKind::InvalidFormat);
        assert_eq!(errors[2].kind, FieldErrorKind::OutOfRange);
    }

    #[test]
    fn test_order_skipped_when_dropoff_missing() {
        let errors = params(&[
            ("lat", "51.5074"),
            ("lng", "-0.1278"),
            ("pickup", "2024-01-15T10:00:00Z"),
            ("bag_count", "0"),
        ])
        .into_query()
        .unwrap_err();

        assert_eq!(fields(&errors), vec!["dropoff", "bag_count"]);
    }

    #[test]
    fn test_non_numeric_and_non_finite_values() {
        let mut pairs = valid();
        pairs[0] = ("lat", "NaN");
        pairs[4] = ("bag_count", "2.5");

        let errors = params(&pairs).into_query().unwrap_err();

        assert_eq!(fields(&errors), vec!["lat", "bag_count"]);
        assert!(errors.iter().all(|e| e.kind == FieldErrorKind::InvalidFormat));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut pairs = valid();
        pairs[2] = ("dropoff", "  ");

        let errors = params(&pairs).into_query().unwrap_err();

        assert_eq!(fields(&errors), vec!["dropoff"]);
        assert_eq!(errors[0].kind, FieldErrorKind::Missing);
    }

    #[test]
    fn test_naive_timestamp_taken_as_utc() {
        let mut pairs = valid();
        pairs[2] = ("dropoff", "2024-01-15T10:00:00");

        let StashpointQuery::Search(query) = params(&pairs).into_query().unwrap() else {
            panic!("expected a search query");
        };
        assert_eq!(query.dropoff.to_rfc3339(), "2024-01-15T10:00:00+00:00");
    }

    #[test]
    fn test_field_error_serialization() {
        let error = FieldError::new("bag_count", "bag_count must be greater than 0", FieldErrorKind::OutOfRange);
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["field"], "bag_count");
        assert_eq!(json["kind"], "out_of_range");
    }
}
