use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use lostfound_match::config::{Settings, StoreBackend};
use lostfound_match::core::Matcher;
use lostfound_match::routes::{self, matches::AppState};
use lostfound_match::services::{
    AttributeCache, InMemoryReportStore, MatchingService, PostgresReportStore, ReportStore,
};
use std::io;
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(level: &str, format: &str) {
    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

async fn build_store(settings: &Settings) -> io::Result<Arc<dyn ReportStore>> {
    match settings.database.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory report store; reports are not persisted");
            Ok(Arc::new(InMemoryReportStore::new()))
        }
        StoreBackend::Postgres => {
            let store = PostgresReportStore::from_settings(
                &settings.database.url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                io::Error::new(io::ErrorKind::Other, format!("PostgreSQL connection error: {}", e))
            })?;

            info!(
                "PostgreSQL report store initialized (max: {} connections)",
                settings.database.max_connections.unwrap_or(10)
            );
            Ok(Arc::new(store))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, format!("Configuration error: {}", e))
    })?;

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting lost & found matching service...");

    let match_config = settings.match_config().and_then(|config| {
        let matcher = Matcher::new(&config)?;
        Ok((config, matcher))
    });
    let (match_config, matcher) = match_config.map_err(|e| {
        error!("Invalid matching configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!(
        "Matcher initialized with weights: {:?}, threshold: {}",
        match_config.weights, match_config.min_score_threshold
    );

    let matcher = Arc::new(matcher);
    let cache = Arc::new(AttributeCache::new(
        Arc::clone(matcher.extractor()),
        settings.cache.capacity,
        settings.cache.ttl_secs,
    ));

    info!(
        "Attribute cache initialized ({} entries, TTL: {}s)",
        settings.cache.capacity, settings.cache.ttl_secs
    );

    let store = build_store(&settings).await?;

    let app_state = AppState {
        service: Arc::new(MatchingService::new(
            store,
            cache,
            matcher,
            settings.matching.max_results_cap,
        )),
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
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
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
