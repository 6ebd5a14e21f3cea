use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use stash_finder::config::{LoggingSettings, Settings};
use stash_finder::core::AvailabilityMatcher;
use stash_finder::routes::{self, AppState};
use stash_finder::services::{CachedCatalog, PostgresClient, StashpointCatalog};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Initialize logging; RUST_LOG takes precedence over the configured level
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    info!("Starting stash finder service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    info!("Configuration loaded successfully");

    let postgres = Arc::new(PostgresClient::from_settings(&settings.database).await.map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        std::io::Error::other(format!("PostgreSQL connection error: {}", e))
    })?);

    info!("PostgreSQL client initialized");

    let mut catalog: Arc<dyn StashpointCatalog> = postgres.clone();
    if settings.search.catalog_cache_ttl_secs > 0 {
        catalog = Arc::new(CachedCatalog::new(
            catalog,
            settings.search.catalog_cache_size,
            settings.search.catalog_cache_ttl_secs,
        ));
        info!(
            "Catalog cache enabled ({} entries, TTL: {}s)",
            settings.search.catalog_cache_size, settings.search.catalog_cache_ttl_secs
        );
    }

    let app_state = AppState {
        matcher: AvailabilityMatcher::new(catalog, postgres),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
