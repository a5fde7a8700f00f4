use serde::{Deserialize, Serialize};

use crate::models::{AnalysisResult, Artifacts, ScoreBand};
use crate::pipeline::AnalysisOptions;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
    pub email: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub ai_model_name: Option<String>,
    pub max_text_sample_chars: Option<usize>,
}

impl AnalyzeRequest {
    /// Request overrides on top of the server defaults.
    pub fn options(&self, defaults: &AnalysisOptions) -> AnalysisOptions {
        AnalysisOptions {
            timeout_seconds: self.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            ai_model_name: self
                .ai_model_name
                .clone()
                .unwrap_or_else(|| defaults.ai_model_name.clone()),
            max_text_sample_chars: self
                .max_text_sample_chars
                .unwrap_or(defaults.max_text_sample_chars),
        }
    }
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub result: AnalysisResult,
    pub artifacts: Artifacts,
    pub score_band: ScoreBand,
    pub report: String,
    pub cached: bool,
}
