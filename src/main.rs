use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use hotspot_finder::config::{LoggingSettings, Settings};
use hotspot_finder::core::RequestGenerations;
use hotspot_finder::models::ErrorResponse;
use hotspot_finder::routes::{self, AppState};
use hotspot_finder::services::HotspotSource;
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// Rejected request payload, answered with the usual error body
#[derive(Debug)]
struct PayloadError(ErrorResponse);

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl error::ResponseError for PayloadError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

fn payload_error(error: &str, message: String) -> actix_web::Error {
    PayloadError(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
    .into()
}

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    payload_error("invalid_json", format!("Invalid JSON: {}", err))
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    payload_error("invalid_query", format!("Invalid query: {}", err))
}

/// RUST_LOG wins over LOG_LEVEL, which wins over the configured level
fn init_logging(logging: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);

    info!("Starting hotspot finder service...");

    let source = settings.source.build().map_err(|e| {
        error!("Failed to initialize hotspot source: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!(
        "Hotspot source {} initialized ({:?}, {} business types)",
        source.name(),
        source.layout(),
        source.catalog().len()
    );

    let finder = settings.finder();

    info!(
        "Search configured: ranking {:?}, default radius {}km, default max {} results",
        settings.search.ranking,
        settings.search.default_radius_km,
        settings.search.default_max_results
    );

    // Build application state
    let app_state = AppState {
        source,
        finder,
        generations: Arc::new(RequestGenerations::new()),
        search: settings.search.clone(),
        location: settings.location.clone(),
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
