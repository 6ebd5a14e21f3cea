use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A location that accepts bags for temporary storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stashpoint {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub address: String,
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Maximum number of bags held at the same time
    pub capacity: u32,
    #[serde(with = "clock_format")]
    pub open_from: NaiveTime,
    #[serde(with = "clock_format")]
    pub open_until: NaiveTime,
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Stashpoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A customer's claim on stashpoint capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub stashpoint_id: String,
    pub bag_count: u32,
    pub dropoff: DateTime<Utc>,
    pub pickup: DateTime<Utc>,
    #[serde(default)]
    pub is_cancelled: bool,
}

/// Half-open time range `[dropoff, pickup)` in absolute time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub dropoff: DateTime<Utc>,
    pub pickup: DateTime<Utc>,
}

/// A validated availability search
///
/// `dropoff` and `pickup` keep the offset the caller sent so that opening
/// hours are compared against the caller's wall clock.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub coordinate: Coordinate,
    pub dropoff: DateTime<FixedOffset>,
    pub pickup: DateTime<FixedOffset>,
    pub bag_count: u32,
    pub radius_km: Option<f64>,
}

impl SearchQuery {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            dropoff: self.dropoff.with_timezone(&Utc),
            pickup: self.pickup.with_timezone(&Utc),
        }
    }
}

/// What the caller asked the stashpoint endpoint for
#[derive(Debug, Clone, PartialEq)]
pub enum StashpointQuery {
    /// No search parameters: every stashpoint, unfiltered
    ListAll,
    Search(SearchQuery),
}

/// A stashpoint annotated with its distance from the search point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub stashpoint: Stashpoint,
    /// Rounded to two decimals; `None` for bare listings
    pub distance_km: Option<f64>,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Opening hours travel as `HH:MM`
mod clock_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
