use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::MatchError;
use crate::models::{
    ClarifyRequest, ClarifyResponse, ErrorResponse, ExplainMatchRequest, ExtractRequest,
    ExtractResponse, FindMatchesRequest, FindMatchesResponse, HealthResponse,
};
use crate::services::MatchingService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MatchingService>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches))
        .route("/matches/explain", web::post().to(explain_match))
        .route("/matches/clarify", web::post().to(clarify_match))
        .route("/extract", web::post().to(extract_attributes));
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Map engine errors onto HTTP responses
fn match_error_response(err: &MatchError) -> HttpResponse {
    let (mut builder, error, status_code) = match err {
        MatchError::InvalidReport(_) => (HttpResponse::BadRequest(), "Invalid report", 400),
        MatchError::ReportNotFound(_) => (HttpResponse::NotFound(), "Report not found", 404),
        MatchError::CandidatePoolUnavailable(_) => {
            (HttpResponse::ServiceUnavailable(), "Candidate pool unavailable", 503)
        }
        MatchError::InvalidConfig(_) => {
            (HttpResponse::InternalServerError(), "Invalid configuration", 500)
        }
    };

    builder.json(ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        status_code,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.service.store_healthy().await;

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find matches endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "reportId": "string",
///   "limit": 10
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: {:?}", errors);
        return validation_error(errors);
    }

    tracing::info!("Finding matches for report: {}, limit: {:?}", req.report_id, req.limit);

    match state
        .service
        .find_matches_for(&req.report_id, req.limit.map(usize::from))
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(FindMatchesResponse {
            report_id: outcome.source_id,
            matches: outcome.result.matches,
            total_candidates: outcome.result.total_candidates,
            clarifying_question: outcome.clarifying_question,
        }),
        Err(e) => {
            tracing::warn!("find_matches failed for {}: {}", req.report_id, e);
            match_error_response(&e)
        }
    }
}

/// Explain match endpoint
///
/// POST /api/v1/matches/explain
///
/// Request body:
/// ```json
/// {
///   "reportId": "string",
///   "candidateId": "string"
/// }
/// ```
async fn explain_match(
    state: web::Data<AppState>,
    req: web::Json<ExplainMatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state.service.explain(&req.report_id, &req.candidate_id).await {
        Ok(candidate) => HttpResponse::Ok().json(candidate),
        Err(e) => match_error_response(&e),
    }
}

/// Clarification endpoint
///
/// POST /api/v1/matches/clarify
///
/// Request body:
/// ```json
/// {
///   "reportId": "string",
///   "field": "brand",
///   "answer": "Samsung"
/// }
/// ```
async fn clarify_match(
    state: web::Data<AppState>,
    req: web::Json<ClarifyRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state.service.clarify(&req.report_id, req.field, &req.answer).await {
        Ok(attributes) => HttpResponse::Ok().json(ClarifyResponse {
            report_id: req.report_id.clone(),
            attributes,
        }),
        Err(e) => {
            tracing::warn!("clarify failed for {}: {}", req.report_id, e);
            match_error_response(&e)
        }
    }
}

/// Attribute extraction endpoint
///
/// POST /api/v1/extract
async fn extract_attributes(
    state: web::Data<AppState>,
    req: web::Json<ExtractRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    HttpResponse::Ok().json(ExtractResponse {
        attributes: state.service.extract(&req.text),
    })
}
