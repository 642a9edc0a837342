mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use config::Settings;
use core::TriageEngine;
use routes::triage::AppState;
use services::{DispatchClient, GeminiOracle};
use std::sync::Arc;
use tracing::{info, warn};
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
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Filter directives for the tracing subscriber
///
/// Precedence: `RUST_LOG` (handled by the caller), then `LOG_LEVEL`, then the
/// `[logging]` section of the config file.
fn log_directives(env_level: Option<String>, configured: &str) -> String {
    env_level.unwrap_or_else(|| configured.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration (before logging init so [logging] can shape it)
    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(log_directives(
            std::env::var("LOG_LEVEL").ok(),
            &settings.logging.level,
        ))
    });
    let log_format = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting TriageFlow triage service...");
    info!("Configuration loaded successfully");

    let oracle_configured = settings.oracle_configured();
    if !oracle_configured {
        warn!("GEMINI_API_KEY not set - API will use fallback safety mode");
    }

    // Initialize the Gemini oracle client
    let oracle = Arc::new(GeminiOracle::new(&settings.oracle));
    info!(
        "Gemini oracle initialized (model: {}, timeout: {}s)",
        settings.oracle.model, settings.oracle.timeout_secs
    );

    // Initialize the MATS dispatch client
    let dispatch = Arc::new(DispatchClient::new(&settings.dispatch));
    match &settings.dispatch.endpoint {
        Some(endpoint) => info!("MATS dispatch client initialized ({})", endpoint),
        None => info!("MATS dispatch endpoint not configured, notices will be logged"),
    }

    // Build application state
    let app_state = AppState {
        engine: Arc::new(TriageEngine::new(oracle, dispatch)),
        oracle_configured,
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
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
