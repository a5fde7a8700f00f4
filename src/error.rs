use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde::Serialize;

use crate::api::response;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum FetchErrorKind {
    #[error("request timed out")]
    Timeout,

    #[error("host could not be resolved")]
    Dns,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("server responded with HTTP {0}")]
    HttpError(u16),

    #[error("too many redirects")]
    RedirectLoop,

    #[error("invalid URL")]
    InvalidUrl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("Failed to fetch {url}: {kind}")]
pub struct FetchError {
    #[serde(flatten)]
    pub kind: FetchErrorKind,
    pub url: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, url: impl Into<String>) -> Self {
        Self { kind, url: url.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentErrorKind {
    #[error("invalid response")]
    InvalidResponse,

    #[error("authentication rejected")]
    Auth,

    #[error("quota exhausted")]
    Quota,

    #[error("bad request")]
    BadRequest,

    #[error("service unavailable after retry")]
    TransientExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("AI assessment failed ({kind}): {detail}")]
pub struct AssessmentError {
    pub kind: AssessmentErrorKind,
    pub detail: String,
}

impl AssessmentError {
    pub fn new(kind: AssessmentErrorKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: detail.into() }
    }
}

/// Top-level failure of `analyze`. No score exists when this is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Assessment(#[from] AssessmentError),

    #[error("Page at {url} has no usable content")]
    NoContent { url: String },
}

impl AnalysisError {
    /// Stable tag for callers to map to a user-facing message.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Fetch(e) => match e.kind {
                FetchErrorKind::Timeout => "timeout",
                FetchErrorKind::Dns => "dns",
                FetchErrorKind::ConnectionRefused => "connection_refused",
                FetchErrorKind::HttpError(_) => "http_error",
                FetchErrorKind::RedirectLoop => "redirect_loop",
                FetchErrorKind::InvalidUrl => "invalid_url",
            },
            AnalysisError::Assessment(e) => match e.kind {
                AssessmentErrorKind::InvalidResponse => "invalid_response",
                AssessmentErrorKind::Auth => "auth",
                AssessmentErrorKind::Quota => "quota",
                AssessmentErrorKind::BadRequest => "bad_request",
                AssessmentErrorKind::TransientExhausted => "transient_exhausted",
            },
            AnalysisError::NoContent { .. } => "no_content",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Analysis(err) => match err {
                AnalysisError::Fetch(e) => match e.kind {
                    FetchErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                    FetchErrorKind::InvalidUrl => StatusCode::BAD_REQUEST,
                    _ => StatusCode::BAD_GATEWAY,
                },
                AnalysisError::Assessment(_) => StatusCode::BAD_GATEWAY,
                AnalysisError::NoContent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            },
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Analysis(err) => err.kind(),
            AppError::Unauthorized(_) => "unauthorized",
            AppError::BadRequest(_) => "bad_request",
            AppError::ConfigError(_) => "config",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        response::error::<()>(self.status(), self.kind(), self.to_string()).into_response()
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_serializes_kind_tag() {
        let err = FetchError::new(FetchErrorKind::HttpError(503), "https://example.com");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "http_error");
        assert_eq!(json["status"], 503);
        assert_eq!(json["url"], "https://example.com");
    }

    #[test]
    fn test_analysis_error_kinds() {
        let timeout: AnalysisError = FetchError::new(FetchErrorKind::Timeout, "x").into();
        assert_eq!(timeout.kind(), "timeout");

        let quota: AnalysisError = AssessmentError::new(AssessmentErrorKind::Quota, "limit").into();
        assert_eq!(quota.kind(), "quota");
        assert_eq!(AppError::from(quota).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_unauthorized_maps_to_forbidden() {
        assert_eq!(AppError::Unauthorized("a@b.c".into()).status(), StatusCode::FORBIDDEN);
    }
}
