pub mod api;
pub mod assessor;
pub mod auth;
pub mod cache;
pub mod checks;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod fetcher;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod templates;
pub mod testing;

use std::sync::Arc;

use auth::Authorizer;
use cache::AnalysisCache;
use config::Config;
use pipeline::Analyzer;

pub use error::{AnalysisError, AssessmentError, FetchError};
pub use models::{AIAssessment, AnalysisResult, Artifacts, ExtractedContent, FetchResult, Finding, Severity};
pub use pipeline::{render_artifacts, AnalysisOptions};

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: Analyzer,
    pub authorizer: Arc<dyn Authorizer>,
    pub cache: Arc<AnalysisCache>,
}
