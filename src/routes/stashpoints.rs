use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::AvailabilityMatcher;
use crate::models::{ErrorResponse, FieldError, HealthResponse, HealthStatus, StashpointQuery, StashpointSearchParams};
use crate::services::StoreError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matcher: AvailabilityMatcher,
}

/// Errors surfaced by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Invalid query: {0}")]
    MalformedQuery(String),

    #[error("Stashpoint storage unavailable: {0}")]
    Dependency(#[from] StoreError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Dependency(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            ApiError::Validation(details) => ErrorResponse {
                error: self.to_string(),
                message: details
                    .iter()
                    .map(|d| d.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
                status_code: status.as_u16(),
                details: details.clone(),
            },
            ApiError::MalformedQuery(message) => ErrorResponse {
                error: "Invalid query".to_string(),
                message: message.clone(),
                status_code: status.as_u16(),
                details: Vec::new(),
            },
            ApiError::Dependency(e) => ErrorResponse {
                error: "Service unavailable".to_string(),
                message: e.to_string(),
                status_code: status.as_u16(),
                details: Vec::new(),
            },
        };

        HttpResponse::build(status).json(body)
    }
}

/// Configure stashpoint routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/stashpoints", web::get().to(search_stashpoints))
        .route("/stashpoints/", web::get().to(search_stashpoints));
}

/// Liveness probe
///
/// GET /healthcheck
pub async fn healthcheck() -> HttpResponse {
    HttpResponse::Ok().json(HealthStatus {
        status: "healthy".to_string(),
    })
}

/// Health check endpoint including the catalog store
///
/// GET /api/v1/health
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = match state.matcher.catalog().health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Catalog health check failed: {}", e);
            false
        }
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Search stashpoints endpoint
///
/// GET /api/v1/stashpoints/?lat=51.5074&lng=-0.1278&dropoff=2024-01-15T10:00:00Z&pickup=2024-01-15T18:00:00Z&bag_count=2&radius_km=5
///
/// Without any parameters every stashpoint is listed.
async fn search_stashpoints(
    state: web::Data<AppState>,
    params: web::Query<StashpointSearchParams>,
) -> Result<HttpResponse, ApiError> {
    let query = params.into_inner().into_query().map_err(|errors| {
        tracing::info!("Rejected stashpoint search: {} invalid fields", errors.len());
        ApiError::Validation(errors)
    })?;

    let results = state.matcher.search(&query).await.map_err(|e| {
        tracing::error!("Stashpoint search failed: {}", e);
        ApiError::from(e)
    })?;

    match &query {
        StashpointQuery::ListAll => tracing::info!("Listed {} stashpoints", results.len()),
        StashpointQuery::Search(q) => tracing::info!(
            "Returning {} stashpoints near ({}, {}) for {} bags",
            results.len(),
            q.coordinate.latitude,
            q.coordinate.longitude,
            q.bag_count
        ),
    }

    Ok(HttpResponse::Ok().json(results))
}
