//! Per-URL memoization for callers that re-display recent analyses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::fetcher::normalize_url;
use crate::models::{AnalysisResult, Artifacts};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub result: AnalysisResult,
    pub artifacts: Artifacts,
    pub timestamp: DateTime<Utc>,
}

pub struct AnalysisCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl AnalysisCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// `example.com`, `https://Example.com` and `https://example.com/` share a key.
    pub fn key(url: &str) -> String {
        match normalize_url(url) {
            Ok((parsed, _)) => parsed.to_string(),
            Err(_) => url.trim().to_lowercase(),
        }
    }

    /// Fresh entry for `url`, if any. Stale entries are evicted.
    pub fn get(&self, url: &str) -> Option<CachedResponse> {
        let key = Self::key(url);
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(&key) {
            Some(entry) if now - entry.timestamp < self.ttl => Some(entry.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store an entry, sweeping every expired one so the map only holds live URLs.
    pub fn insert(&self, url: &str, result: AnalysisResult, artifacts: Artifacts) {
        let now = self.clock.now();
        let entry = CachedResponse {
            result,
            artifacts,
            timestamp: now,
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, e| now - e.timestamp < self.ttl);
        entries.insert(Self::key(url), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
