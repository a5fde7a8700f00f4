//! Linear analysis pipeline: fetch, extract, check, assess, score.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{info, warn};

use crate::assessor::Assessor;
use crate::checks::{self, SpeedThresholds};
use crate::error::AnalysisError;
use crate::extractor::{self, DEFAULT_MAX_TEXT_SAMPLE_CHARS};
use crate::fetcher::{PageFetcher, DEFAULT_TIMEOUT};
use crate::llm::{CompletionService, DEFAULT_MODEL};
use crate::models::{AnalysisResult, Artifacts, ExtractedContent};
use crate::scoring::ScoringPolicy;
use crate::templates;

/// Per-request knobs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub timeout_seconds: u64,
    pub ai_model_name: String,
    pub max_text_sample_chars: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            ai_model_name: DEFAULT_MODEL.to_string(),
            max_text_sample_chars: DEFAULT_MAX_TEXT_SAMPLE_CHARS,
        }
    }
}

/// One isolated pipeline. Cloning shares only the immutable collaborators.
#[derive(Clone)]
pub struct Analyzer {
    fetcher: Arc<dyn PageFetcher>,
    assessor: Assessor,
    policy: ScoringPolicy,
    speed: SpeedThresholds,
}

impl Analyzer {
    pub fn new(fetcher: Arc<dyn PageFetcher>, completion: Arc<dyn CompletionService>) -> Self {
        Self::with_assessor(fetcher, Assessor::new(completion))
    }

    pub fn with_assessor(fetcher: Arc<dyn PageFetcher>, assessor: Assessor) -> Self {
        Self {
            fetcher,
            assessor,
            policy: ScoringPolicy::default(),
            speed: SpeedThresholds::default(),
        }
    }

    pub fn with_policy(mut self, policy: ScoringPolicy, speed: SpeedThresholds) -> Self {
        self.policy = policy;
        self.speed = speed;
        self
    }

    pub async fn analyze(&self, url: &str, options: &AnalysisOptions) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        info!(url, "Starting analysis");

        let timeout = Duration::from_secs(options.timeout_seconds.max(1));
        let page = self.fetcher.fetch(url, timeout).await?;

        let extracted =
            extractor::extract_from_page(&page.html, Some(&page.final_url), options.max_text_sample_chars);
        if is_unusable(&extracted) {
            warn!(url = %page.final_url, "Page has no usable content");
            return Err(AnalysisError::NoContent { url: page.final_url });
        }

        let findings = checks::run_checks_with(&page, &extracted, self.speed);
        let assessment = self
            .assessor
            .assess(&extracted, &findings, &options.ai_model_name)
            .await?;

        let result = AnalysisResult::new(page.final_url, findings, assessment, extracted, &self.policy);
        info!(
            url = result.url(),
            score = result.score(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(result)
    }
}

pub fn render_artifacts(result: &AnalysisResult, extracted: &ExtractedContent) -> Artifacts {
    templates::render(result, extracted)
}

fn is_unusable(extracted: &ExtractedContent) -> bool {
    !extracted.has_visible_text && extracted.title.is_none() && extracted.h1.is_none()
}
