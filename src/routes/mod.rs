// Route exports
pub mod stashpoints;

use actix_web::{error, web, HttpRequest};

pub use stashpoints::{ApiError, AppState};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthcheck", web::get().to(stashpoints::healthcheck))
        .service(web::scope("/api/v1").configure(stashpoints::configure));
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    ApiError::MalformedQuery(err.to_string()).into()
}
