use axum::{
    routing::{get, post},
    Router,
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Result, AppError};
use crate::api::models::{AnalyzeRequest, AnalyzeResponse};
use crate::api::response;
use crate::export::plain_text_report;
use crate::models::ScoreBand;
use crate::pipeline::render_artifacts;
use crate::AppState;

/// Upper bound for a whole request: two fetch attempts plus two AI calls.
const HANDLER_TIMEOUT: Duration = Duration::from_secs(90);

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze_handler))
        .route("/health", get(health_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn health_handler() -> impl IntoResponse {
    response::success("ok")
}

async fn analyze_handler(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    info!(url = %req.url, "Processing analysis request");
    let start_time = std::time::Instant::now();

    let result = tokio::time::timeout(HANDLER_TIMEOUT, process_analyze_request(&state, &req)).await;
    let elapsed = start_time.elapsed();

    match result {
        Ok(Ok(data)) => {
            info!(url = %req.url, elapsed_ms = elapsed.as_millis() as u64, "Request completed");
            response::success(data).into_response()
        }
        Ok(Err(err)) => {
            warn!(url = %req.url, kind = err.kind(), error = %err, "Request failed");
            err.into_response()
        }
        Err(_) => {
            warn!(url = %req.url, elapsed_ms = elapsed.as_millis() as u64, "Request timed out");
            response::error::<()>(
                StatusCode::REQUEST_TIMEOUT,
                "timeout",
                "Request processing timed out".to_string(),
            )
            .into_response()
        }
    }
}

async fn process_analyze_request(state: &AppState, req: &AnalyzeRequest) -> Result<AnalyzeResponse> {
    if req.url.trim().is_empty() {
        return Err(AppError::BadRequest("url must not be empty".to_string()));
    }

    let email = req.email.as_deref().unwrap_or_default();
    if !state.authorizer.is_authorized(email) {
        return Err(AppError::Unauthorized(email.to_string()));
    }

    if let Some(cached) = state.cache.get(&req.url) {
        info!(url = %req.url, "Cache hit");
        let report = plain_text_report(&cached.result, &cached.artifacts);
        return Ok(AnalyzeResponse {
            score_band: ScoreBand::from_score(cached.result.score()),
            result: cached.result,
            artifacts: cached.artifacts,
            report,
            cached: true,
        });
    }

    let options = req.options(&state.config.default_options);
    let result = state.analyzer.analyze(&req.url, &options).await?;
    let artifacts = render_artifacts(&result, result.extracted());
    let report = plain_text_report(&result, &artifacts);

    state.cache.insert(&req.url, result.clone(), artifacts.clone());

    Ok(AnalyzeResponse {
        score_band: ScoreBand::from_score(result.score()),
        result,
        artifacts,
        report,
        cached: false,
    })
}
