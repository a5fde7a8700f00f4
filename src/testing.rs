//! In-memory doubles for the pipeline's two I/O boundaries.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use crate::llm::{CompletionError, CompletionService};
use crate::models::FetchResult;

/// Replays a fixed script of completion outcomes, one per call.
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    prompts: Mutex<Vec<String>>,
    timeouts: Mutex<Vec<Duration>>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            timeouts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Timeout passed with each call, in call order.
    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, _model: &str, prompt: &str, timeout: Duration) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut timeouts) = self.timeouts.lock() {
            timeouts.push(timeout);
        }
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| Err(CompletionError::Malformed("script exhausted".into())))
    }
}

/// Serves one canned fetch outcome for every URL.
pub struct StaticFetcher {
    outcome: Result<FetchResult, FetchError>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn page(page: FetchResult) -> Self {
        Self {
            outcome: Ok(page),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: FetchError) -> Self {
        Self {
            outcome: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str, _timeout: Duration) -> Result<FetchResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// A well-formed model reply.
pub fn good_lead_reply(is_good_lead: bool) -> String {
    serde_json::json!({
        "summary": "Small local business site with dated design.",
        "strengths": ["Clear business name"],
        "weaknesses": ["Slow to load", "Hard to use on phones"],
        "is_good_lead": is_good_lead,
        "lead_rationale": "Visitors on mobile likely leave before calling.",
    })
    .to_string()
}
