use crate::core::TriageEngine;
use crate::models::{ErrorResponse, HealthResponse, TriageRequest};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TriageEngine>,
    pub oracle_configured: bool,
}

/// Configure all triage routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health_check))
        .route("/triage", web::post().to(perform_triage));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "operational".to_string(),
        service: "TriageFlow API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        oracle_configured: state.oracle_configured,
    })
}

/// Main triage endpoint
///
/// POST /triage
///
/// Request body:
/// ```json
/// {
///   "text_description": "string",
///   "image_url": "string (optional)"
/// }
/// ```
///
/// Input validation failures return 400; once validation passes the response
/// is always 200 with a well-formed triage assessment - pipeline failures are
/// absorbed into the safety fallback rather than surfaced as errors.
async fn perform_triage(
    state: web::Data<AppState>,
    req: web::Json<TriageRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for triage request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: "Symptom description too short. Please provide detailed symptoms."
                .to_string(),
            status_code: 400,
        });
    }

    tracing::info!(
        "Received triage request: {} chars",
        req.text_description.len()
    );

    let result = state.engine.analyze(&req.text_description).await;

    tracing::info!(
        "Triage completed: Level {}, Uncertainty: {:.2}",
        result.urgency_level,
        result.uncertainty_score
    );

    HttpResponse::Ok().json(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response_shape() {
        let response = HealthResponse {
            status: "operational".to_string(),
            service: "TriageFlow API".to_string(),
            version: "1.0.0".to_string(),
            oracle_configured: false,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "operational");
        assert_eq!(json["oracle_configured"], false);
    }
}
