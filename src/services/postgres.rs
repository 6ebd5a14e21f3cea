use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::models::{BoundingBox, Reservation, Stashpoint, TimeInterval};
use crate::services::{ReservationStore, StashpointCatalog, StoreError};

const STASHPOINT_COLUMNS: &str = r#"
    id, name, description, address, postal_code, latitude, longitude,
    capacity, open_from, open_until, created_at
"#;

/// PostgreSQL-backed stashpoint catalog and reservation store
///
/// Distance and availability are computed in-process; the database only
/// supplies the candidate rows (bounding-box pre-filtered) and a single
/// grouped aggregate of reservation load per search.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!(
            "Connecting to PostgreSQL (max: {} connections)",
            settings.max_connections
        );

        Self::new(
            &settings.url,
            settings.max_connections,
            settings.min_connections,
            Duration::from_secs(settings.acquire_timeout_secs),
            Duration::from_secs(settings.idle_timeout_secs),
        )
        .await
    }

    /// Insert or replace a stashpoint
    pub async fn upsert_stashpoint(&self, stashpoint: &Stashpoint) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO stashpoints
                (id, name, description, address, postal_code, latitude, longitude,
                 capacity, open_from, open_until)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                address = EXCLUDED.address,
                postal_code = EXCLUDED.postal_code,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                capacity = EXCLUDED.capacity,
                open_from = EXCLUDED.open_from,
                open_until = EXCLUDED.open_until
        "#;

        let capacity = i32::try_from(stashpoint.capacity)
            .map_err(|_| StoreError::InvalidRow(format!("capacity too large for {}", stashpoint.id)))?;

        sqlx::query(query)
            .bind(&stashpoint.id)
            .bind(&stashpoint.name)
            .bind(&stashpoint.description)
            .bind(&stashpoint.address)
            .bind(&stashpoint.postal_code)
            .bind(stashpoint.latitude)
            .bind(stashpoint.longitude)
            .bind(capacity)
            .bind(stashpoint.open_from)
            .bind(stashpoint.open_until)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a customer record
    pub async fn insert_customer(&self, id: &str, name: &str, email: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO customers (id, name, email) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a booking for a customer
    pub async fn insert_booking(&self, reservation: &Reservation, customer_id: &str) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO bookings
                (id, stashpoint_id, customer_id, bag_count, dropoff_time, pickup_time, is_cancelled)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#;

        let bag_count = i32::try_from(reservation.bag_count)
            .map_err(|_| StoreError::InvalidRow(format!("bag_count too large for {}", reservation.id)))?;

        sqlx::query(query)
            .bind(&reservation.id)
            .bind(&reservation.stashpoint_id)
            .bind(customer_id)
            .bind(bag_count)
            .bind(reservation.dropoff)
            .bind(reservation.pickup)
            .bind(reservation.is_cancelled)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete all bookings, customers and stashpoints
    pub async fn clear_all(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;
        for table in ["bookings", "customers", "stashpoints"] {
            let result = sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
            removed += result.rows_affected();
        }
        tx.commit().await?;

        tracing::info!("Cleared {} rows", removed);
        Ok(removed)
    }

    /// Health check for the database connection
    pub async fn ping(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn stashpoint_from_row(row: &PgRow) -> Result<Stashpoint, StoreError> {
    let id: String = row.try_get("id")?;
    let capacity: i32 = row.try_get("capacity")?;
    let capacity = u32::try_from(capacity)
        .map_err(|_| StoreError::InvalidRow(format!("negative capacity for stashpoint {}", id)))?;
    let open_from: NaiveTime = row.try_get("open_from")?;
    let open_until: NaiveTime = row.try_get("open_until")?;
    let created_at: Option<DateTime<Utc>> = row.try_get("created_at")?;

    Ok(Stashpoint {
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        address: row.try_get("address")?,
        postal_code: row.try_get("postal_code")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        capacity,
        open_from,
        open_until,
        created_at,
        id,
    })
}

#[async_trait]
impl StashpointCatalog for PostgresClient {
    async fn list_candidates(&self, bounds: Option<BoundingBox>) -> Result<Vec<Stashpoint>, StoreError> {
        let rows = match bounds {
            Some(bbox) => {
                let query = format!(
                    r#"
                    SELECT {}
                    FROM stashpoints
                    WHERE latitude BETWEEN $1 AND $2
                      AND longitude BETWEEN $3 AND $4
                    ORDER BY created_at, id
                    "#,
                    STASHPOINT_COLUMNS
                );
                sqlx::query(&query)
                    .bind(bbox.min_lat)
                    .bind(bbox.max_lat)
                    .bind(bbox.min_lon)
                    .bind(bbox.max_lon)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {} FROM stashpoints ORDER BY created_at, id",
                    STASHPOINT_COLUMNS
                );
                sqlx::query(&query).fetch_all(&self.pool).await?
            }
        };

        let stashpoints = rows
            .iter()
            .map(stashpoint_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} candidate stashpoints", stashpoints.len());
        Ok(stashpoints)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.ping().await
    }
}

#[async_trait]
impl ReservationStore for PostgresClient {
    async fn sum_overlapping(
        &self,
        stashpoint_ids: &[String],
        interval: &TimeInterval,
    ) -> Result<HashMap<String, u32>, StoreError> {
        if stashpoint_ids.is_empty() {
            return Ok(HashMap::new());
        }

        // Half-open overlap: touching endpoints do not compete
        let query = r#"
            SELECT stashpoint_id, SUM(bag_count)::BIGINT AS booked
            FROM bookings
            WHERE stashpoint_id = ANY($1)
              AND is_cancelled = FALSE
              AND dropoff_time < $3
              AND pickup_time > $2
            GROUP BY stashpoint_id
        "#;

        let rows = sqlx::query(query)
            .bind(stashpoint_ids)
            .bind(interval.dropoff)
            .bind(interval.pickup)
            .fetch_all(&self.pool)
            .await?;

        let mut totals = HashMap::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("stashpoint_id")?;
            let booked: i64 = row.try_get("booked")?;
            let booked = u32::try_from(booked)
                .map_err(|_| StoreError::InvalidRow(format!("booked bags out of range for {}", id)))?;
            totals.insert(id, booked);
        }

        tracing::debug!(
            "Reservation load for {} stashpoints: {} with bookings",
            stashpoint_ids.len(),
            totals.len()
        );

        Ok(totals)
    }
}
