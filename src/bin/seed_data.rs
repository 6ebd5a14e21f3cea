//! Development data loader
//!
//! Replaces all stashpoints, customers and bookings with a fixed London
//! dataset. Booking times are relative to today so searches for the next
//! few days hit busy and fully booked periods.
//!
//! Run: cargo run --bin seed-data

use chrono::{DateTime, Duration, NaiveTime, Utc};
use stash_finder::config::Settings;
use stash_finder::models::{Reservation, Stashpoint};
use stash_finder::services::PostgresClient;
use tracing::{error, info};

/// (name, description, address, postal_code, lat, lon, capacity, open, close)
type StashpointRow = (&'static str, &'static str, &'static str, &'static str, f64, f64, u32, (u32, u32), (u32, u32));

const STASHPOINTS: &[StashpointRow] = &[
    ("Central Cafe Storage", "Cafe in the heart of the city with secure bag storage", "123 Main Street", "EC1A 1AA", 51.5107, -0.1246, 20, (8, 0), (22, 0)),
    ("Downtown Hotel Lockers", "24/7 hotel lockers with staff assistance", "45 Park Avenue", "EC2A 2BB", 51.5173, -0.0850, 50, (0, 0), (23, 59)),
    ("Market Square Shop", "Friendly local shop offering bag storage", "8 Market Square", "EC3M 3CC", 51.5128, -0.0849, 15, (9, 0), (18, 0)),
    ("Central Station Lockers", "Automated lockers at the main train station", "Central Station, Platform 1", "NW1 2DX", 51.5282, -0.1340, 100, (5, 0), (23, 59)),
    ("Airport Express Storage", "Convenient bag drop at airport express station", "Airport Link, Terminal 1", "TW6 1EW", 51.4700, -0.4543, 80, (4, 30), (23, 30)),
    ("Museum District Lockers", "Self-service lockers near major museums", "15 Exhibition Road", "SW7 2DD", 51.4969, -0.1764, 30, (9, 30), (18, 30)),
    ("Riverside Cafe Storage", "Scenic cafe by the river offering secure storage", "27 River Walk", "SE1 7GP", 51.5074, -0.0982, 12, (8, 0), (20, 0)),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("John Smith", "john.smith@example.com"),
    ("Jane Doe", "jane.doe@example.com"),
    ("Alice Johnson", "alice.j@example.com"),
    ("Bob Williams", "bob.w@example.com"),
    ("Charlie Brown", "charlie.b@example.com"),
    ("Diana Prince", "diana.p@example.com"),
    ("Edward Norton", "edward.n@example.com"),
    ("Fiona Apple", "fiona.a@example.com"),
];

fn clock(hour: u32, minute: u32) -> Result<NaiveTime, String> {
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| format!("invalid clock time {}:{}", hour, minute))
}

fn build_stashpoints() -> Result<Vec<Stashpoint>, String> {
    STASHPOINTS
        .iter()
        .map(|(name, description, address, postal_code, lat, lon, capacity, open, close)| {
            Ok(Stashpoint {
                id: uuid::Uuid::new_v4().simple().to_string(),
                name: name.to_string(),
                description: Some(description.to_string()),
                address: address.to_string(),
                postal_code: postal_code.to_string(),
                latitude: *lat,
                longitude: *lon,
                capacity: *capacity,
                open_from: clock(open.0, open.1)?,
                open_until: clock(close.0, close.1)?,
                created_at: None,
            })
        })
        .collect()
}

fn booking(stashpoint: &Stashpoint, bags: u32, dropoff: DateTime<Utc>, hours: i64, cancelled: bool) -> Reservation {
    Reservation {
        id: uuid::Uuid::new_v4().simple().to_string(),
        stashpoint_id: stashpoint.id.clone(),
        bag_count: bags,
        dropoff,
        pickup: dropoff + Duration::hours(hours),
        is_cancelled: cancelled,
    }
}

/// Spread of ordinary bookings plus a nearly full day, a full day and some
/// cancellations that must not count against capacity
fn build_bookings(stashpoints: &[Stashpoint], today: DateTime<Utc>) -> Vec<Reservation> {
    let mut bookings = Vec::new();

    for (i, stashpoint) in stashpoints.iter().enumerate() {
        for day in -3i64..7 {
            let start = today + Duration::days(day) + Duration::hours(10 + (i as i64 + day).rem_euclid(6));
            let bags = 1 + ((i as u32) + (day.unsigned_abs() as u32)) % 4;
            let length = 2 + (day.rem_euclid(3)) * 3;
            bookings.push(booking(stashpoint, bags, start, length, day % 5 == 4));
        }
    }

    // Tomorrow 10:00-18:00: first stashpoint nearly full
    if let Some(busy) = stashpoints.first() {
        let dropoff = today + Duration::days(1) + Duration::hours(10);
        for _ in 0..busy.capacity.saturating_sub(4) {
            bookings.push(booking(busy, 1, dropoff, 8, false));
        }
    }

    // Day after tomorrow 09:30-17:30: third stashpoint completely full
    if let Some(full) = stashpoints.get(2) {
        let dropoff = today + Duration::days(2) + Duration::hours(9) + Duration::minutes(30);
        let mut stored = 0;
        while stored < full.capacity {
            let bags = (full.capacity - stored).min(3);
            bookings.push(booking(full, bags, dropoff, 8, false));
            stored += bags;
        }
        // A cancelled booking on top must not matter
        bookings.push(booking(full, 4, dropoff, 8, true));
    }

    bookings
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let settings = Settings::load()?;
    let client = PostgresClient::from_settings(&settings.database).await?;

    client.clear_all().await?;

    let stashpoints = build_stashpoints()?;
    for stashpoint in &stashpoints {
        client.upsert_stashpoint(stashpoint).await?;
    }
    info!("Created {} stashpoints", stashpoints.len());

    let mut customer_ids = Vec::with_capacity(CUSTOMERS.len());
    for (name, email) in CUSTOMERS {
        let id = uuid::Uuid::new_v4().simple().to_string();
        client.insert_customer(&id, name, email).await?;
        customer_ids.push(id);
    }
    info!("Created {} customers", customer_ids.len());

    let today = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or_else(Utc::now);

    let bookings = build_bookings(&stashpoints, today);
    for (i, reservation) in bookings.iter().enumerate() {
        let customer_id = &customer_ids[i % customer_ids.len()];
        if let Err(e) = client.insert_booking(reservation, customer_id).await {
            error!("Failed to insert booking {}: {}", reservation.id, e);
            return Err(e.into());
        }
    }
    info!("Created {} bookings", bookings.len());

    Ok(())
}
