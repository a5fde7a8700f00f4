use std::error::Error as StdError;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, ClientBuilder};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FetchError, FetchErrorKind};
use crate::models::FetchResult;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_REDIRECTS: usize = 5;

const SSL_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const USER_AGENT: &str = concat!(
    "site-lead-analyzer/",
    env!("CARGO_PKG_VERSION"),
    " (website quality check)"
);

/// Source of pages for the pipeline.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResult, FetchError>;
}

/// Fetches over the network. Certificate problems do not block the page
/// fetch; they are reported separately through `ssl_valid`.
#[derive(Clone)]
pub struct HttpFetcher {
    page_client: Client,
    probe_client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let page_client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .danger_accept_invalid_certs(true)
            .pool_max_idle_per_host(10)
            .build()?;

        let probe_client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            page_client,
            probe_client,
        })
    }

    async fn get(&self, url: &Url, timeout: Duration) -> Result<FetchResult, FetchError> {
        let start = Instant::now();
        let response = self
            .page_client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::new(classify(&e), url.as_str()))?;

        let status = response.status();
        let final_url = response.url().clone();
        if !status.is_success() {
            return Err(FetchError::new(FetchErrorKind::HttpError(status.as_u16()), url.as_str()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::new(classify(&e), url.as_str()))?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let is_https = final_url.scheme() == "https";
        let ssl_valid = self.probe_certificate(&final_url, timeout).await;

        Ok(FetchResult {
            final_url: final_url.to_string(),
            html,
            status_code: status.as_u16(),
            elapsed_ms,
            is_https,
            ssl_valid,
        })
    }

    /// Best-effort: can a certificate-verifying client complete a TLS request to this host?
    async fn probe_certificate(&self, page_url: &Url, timeout: Duration) -> bool {
        let Some(host) = page_url.host_str() else {
            return false;
        };
        let probe_url = match page_url.port() {
            Some(port) if page_url.scheme() == "https" => format!("https://{}:{}/", host, port),
            _ => format!("https://{}/", host),
        };

        match self
            .probe_client
            .head(&probe_url)
            .timeout(timeout.min(SSL_PROBE_TIMEOUT))
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!(url = %probe_url, error = %e, "SSL probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, raw_url: &str, timeout: Duration) -> Result<FetchResult, FetchError> {
        let (url, scheme_inferred) = normalize_url(raw_url)?;

        let err = match self.get(&url, timeout).await {
            Ok(page) => {
                info!(url = %page.final_url, elapsed_ms = page.elapsed_ms, "Fetched page");
                return Ok(page);
            }
            Err(err) => err,
        };

        let retry_plain = scheme_inferred
            && matches!(err.kind, FetchErrorKind::ConnectionRefused | FetchErrorKind::Timeout);
        if !retry_plain {
            warn!(url = %url, error = %err, "Fetch failed");
            return Err(err);
        }

        warn!(url = %url, error = %err, "HTTPS attempt failed, retrying over HTTP");
        let mut plain = url.clone();
        plain
            .set_scheme("http")
            .map_err(|_| FetchError::new(FetchErrorKind::InvalidUrl, raw_url))?;

        let page = self.get(&plain, timeout).await.inspect_err(|e| {
            warn!(url = %plain, error = %e, "HTTP fallback failed");
        })?;
        info!(url = %page.final_url, elapsed_ms = page.elapsed_ms, "Fetched page over HTTP");
        Ok(page)
    }
}

/// Trim, infer `https://` when no scheme is given, and parse.
/// Returns the URL and whether the scheme was inferred.
pub fn normalize_url(raw: &str) -> Result<(Url, bool), FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::new(FetchErrorKind::InvalidUrl, raw));
    }

    let lower = trimmed.to_ascii_lowercase();
    let (candidate, inferred) = if lower.starts_with("http://") || lower.starts_with("https://") {
        (trimmed.to_string(), false)
    } else if lower.contains("://") {
        return Err(FetchError::new(FetchErrorKind::InvalidUrl, raw));
    } else {
        (format!("https://{}", trimmed), true)
    };

    let url = Url::parse(&candidate).map_err(|_| FetchError::new(FetchErrorKind::InvalidUrl, raw))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::new(FetchErrorKind::InvalidUrl, raw));
    }
    Ok((url, inferred))
}

fn classify(err: &reqwest::Error) -> FetchErrorKind {
    if err.is_timeout() {
        return FetchErrorKind::Timeout;
    }
    if err.is_redirect() {
        return FetchErrorKind::RedirectLoop;
    }
    if is_dns_failure(err) {
        return FetchErrorKind::Dns;
    }
    FetchErrorKind::ConnectionRefused
}

fn is_dns_failure(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        let text = cause.to_string().to_lowercase();
        if text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
            || text.contains("no such host")
        {
            return true;
        }
        source = cause.source();
    }
    false
}
