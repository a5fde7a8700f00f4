use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o";

/// Failure of a single completion call, before any retry policy is applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("quota exhausted: {0}")]
    Quota(String),

    #[error("request rejected: {0}")]
    BadRequest(String),

    #[error("malformed completion: {0}")]
    Malformed(String),
}

impl CompletionError {
    /// Worth one more attempt after a short pause.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited(_)
                | CompletionError::Server { .. }
                | CompletionError::Timeout
                | CompletionError::Network(_)
        )
    }

    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => CompletionError::Auth(body),
            402 => CompletionError::Quota(body),
            429 if body.contains("insufficient_quota") => CompletionError::Quota(body),
            429 => CompletionError::RateLimited(body),
            408 => CompletionError::Timeout,
            500..=599 => CompletionError::Server { status, body },
            _ => CompletionError::BadRequest(body),
        }
    }
}

/// A text-completion backend: prompt in, text out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str, timeout: Duration) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

/// OpenAI-compatible chat completions client (OpenRouter by default).
#[derive(Clone)]
pub struct OpenRouterClient {
    http: Client,
    api_key: String,
    base_url: String,
    site_url: Option<String>,
    site_name: Option<String>,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            site_url: None,
            site_name: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Attribution headers sent with each request.
    pub fn with_site(mut self, site_url: Option<String>, site_name: Option<String>) -> Self {
        self.site_url = site_url;
        self.site_name = site_name;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionService for OpenRouterClient {
    async fn complete(&self, model: &str, prompt: &str, timeout: Duration) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: model.to_string(),
            messages: vec![Message {
                role: "user".into(),
                content: prompt.into(),
            }],
            temperature: 0.2,
            max_tokens: 600,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&body);

        // Add optional headers if provided
        if let Some(url) = &self.site_url {
            request = request.header("HTTP-Referer", url);
        }

        if let Some(name) = &self.site_name {
            request = request.header("X-Title", name);
        }

        let start = std::time::Instant::now();
        let res = request.send().await.map_err(|e| {
            warn!(error = %e, "Completion request failed");
            if e.is_timeout() {
                CompletionError::Timeout
            } else {
                CompletionError::Network(e.to_string())
            }
        })?;

        let status = res.status();
        if status != StatusCode::OK {
            let text = res.text().await.unwrap_or_default();
            warn!(status = %status, error = %text, "Completion API error");
            return Err(CompletionError::from_status(status.as_u16(), text));
        }

        let parsed: ChatResponse = res
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        debug!(model, duration_ms = start.elapsed().as_millis() as u64, "Completion received");

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CompletionError::Malformed("Invalid response format from LLM".to_string()))
    }
}
