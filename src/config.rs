use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::assessor::DEFAULT_AI_TIMEOUT;
use crate::checks::SpeedThresholds;
use crate::error::{AppError, Result};
use crate::extractor::DEFAULT_MAX_TEXT_SAMPLE_CHARS;
use crate::fetcher::DEFAULT_TIMEOUT;
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::pipeline::AnalysisOptions;
use crate::scoring::ScoringPolicy;

const DEFAULT_CACHE_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub openrouter_api_key: String,
    pub llm_base_url: String,
    pub default_options: AnalysisOptions,
    pub authorized_emails: Vec<String>,
    pub cache_ttl_seconds: i64,
    pub ai_timeout_seconds: u64,
    pub scoring_policy: ScoringPolicy,
    pub speed_thresholds: SpeedThresholds,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. `load` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openrouter_api_key = lookup("OPENROUTER_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("OPENROUTER_API_KEY is not set".to_string()))?;

        // Load server configuration with defaults
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let default_options = AnalysisOptions {
            timeout_seconds: parse_or(&lookup, "FETCH_TIMEOUT_SECONDS", DEFAULT_TIMEOUT.as_secs())?,
            ai_model_name: lookup("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_text_sample_chars: parse_or(&lookup, "MAX_TEXT_SAMPLE_CHARS", DEFAULT_MAX_TEXT_SAMPLE_CHARS)?,
        };

        let authorized_emails = lookup("AUTHORIZED_EMAILS")
            .map(|csv| {
                csv.split(',')
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let defaults = ScoringPolicy::default();
        let scoring_policy = ScoringPolicy {
            fail_penalty: parse_or(&lookup, "SCORE_FAIL_PENALTY", defaults.fail_penalty)?,
            warn_penalty: parse_or(&lookup, "SCORE_WARN_PENALTY", defaults.warn_penalty)?,
            bad_lead_penalty: parse_or(&lookup, "SCORE_BAD_LEAD_PENALTY", defaults.bad_lead_penalty)?,
        };

        let speed = SpeedThresholds::default();
        let speed_thresholds = SpeedThresholds {
            warn_ms: parse_or(&lookup, "SPEED_WARN_MS", speed.warn_ms)?,
            fail_ms: parse_or(&lookup, "SPEED_FAIL_MS", speed.fail_ms)?,
        };
        if speed_thresholds.warn_ms > speed_thresholds.fail_ms {
            return Err(AppError::ConfigError(format!(
                "SPEED_WARN_MS ({}) exceeds SPEED_FAIL_MS ({})",
                speed_thresholds.warn_ms, speed_thresholds.fail_ms
            )));
        }

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            openrouter_api_key,
            llm_base_url: lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            default_options,
            authorized_emails,
            cache_ttl_seconds: parse_or(&lookup, "CACHE_TTL_SECONDS", DEFAULT_CACHE_TTL_SECONDS)?,
            ai_timeout_seconds: parse_or(&lookup, "AI_TIMEOUT_SECONDS", DEFAULT_AI_TIMEOUT.as_secs())?,
            scoring_policy,
            speed_thresholds,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("OPENROUTER_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.server_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.default_options, AnalysisOptions::default());
        assert!(config.authorized_emails.is_empty());
        assert_eq!(config.cache_ttl_seconds, 86400);
        assert_eq!(config.llm_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.ai_timeout_seconds, 30);
        assert_eq!(config.scoring_policy, ScoringPolicy::default());
        assert_eq!(config.speed_thresholds, SpeedThresholds::default());
    }

    #[test]
    fn test_policy_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("SCORE_FAIL_PENALTY", "3"),
            ("SCORE_BAD_LEAD_PENALTY", "0"),
            ("SPEED_WARN_MS", "1500"),
            ("SPEED_FAIL_MS", "4000"),
            ("AI_TIMEOUT_SECONDS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.scoring_policy.fail_penalty, 3);
        assert_eq!(config.scoring_policy.warn_penalty, 1);
        assert_eq!(config.scoring_policy.bad_lead_penalty, 0);
        assert_eq!(config.speed_thresholds, SpeedThresholds { warn_ms: 1500, fail_ms: 4000 });
        assert_eq!(config.ai_timeout_seconds, 12);

        let inverted = Config::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("SPEED_WARN_MS", "9000"),
            ("SPEED_FAIL_MS", "1000"),
        ]));
        assert!(matches!(inverted, Err(AppError::ConfigError(msg)) if msg.contains("SPEED_WARN_MS")));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("PORT", "8080"),
            ("FETCH_TIMEOUT_SECONDS", "5"),
            ("AI_MODEL", "openai/gpt-4o-mini"),
            ("AUTHORIZED_EMAILS", "a@x.com, b@y.com"),
        ]))
        .unwrap();
        assert_eq!(config.server_addr.port(), 8080);
        assert_eq!(config.default_options.timeout_seconds, 5);
        assert_eq!(config.default_options.ai_model_name, "openai/gpt-4o-mini");
        assert_eq!(config.authorized_emails, vec!["a@x.com", "b@y.com"]);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(matches!(Config::from_lookup(lookup(&[])), Err(AppError::ConfigError(_))));
        let bad_port = Config::from_lookup(lookup(&[("OPENROUTER_API_KEY", "k"), ("PORT", "nope")]));
        assert!(matches!(bad_port, Err(AppError::ConfigError(msg)) if msg.contains("PORT")));
    }
}
