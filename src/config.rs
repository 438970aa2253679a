use reqwest::Url;
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::models::SearchTerm;

pub const DEFAULT_BASE_URL: &str = "https://www.amazon.com";
pub const DEFAULT_SEARCH_TERM: &str = "headphones";
pub const DEFAULT_FALLBACK_KEYWORDS: &str = "laptop,usb,keyboard,monitor,mouse";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
// Operator locale first, marketplace default still accepted
const DEFAULT_ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MARKETPLACE_BASE_URL is not a valid URL: {0}")]
    InvalidBaseUrl(String),
    #[error("MARKETPLACE_BASE_URL must use http or https, got {0}")]
    UnsupportedScheme(String),
    #[error("DEFAULT_SEARCH_TERM must not be empty")]
    EmptyDefaultTerm,
}

/// Browser emulation and limits applied to every outbound request
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_redirects: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

/// Read-only settings established at process start
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: Url,
    pub default_term: SearchTerm,
    /// Ordered as configured
    pub fallback_terms: Vec<SearchTerm>,
    pub fetch: FetchSettings,
}

impl ScraperConfig {
    pub fn new(
        base_url: &str,
        default_term: &str,
        fallback_keywords: &str,
    ) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url)?;
        let default_term = SearchTerm::parse(default_term).ok_or(ConfigError::EmptyDefaultTerm)?;

        Ok(Self {
            base_url,
            default_term,
            fallback_terms: parse_keyword_list(fallback_keywords),
            fetch: FetchSettings::default(),
        })
    }

    /// Loads `.env` (if any) and reads the process environment.
    /// Unset or blank variables fall back to the built-in defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url =
            non_blank("MARKETPLACE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let default_term =
            non_blank("DEFAULT_SEARCH_TERM").unwrap_or_else(|| DEFAULT_SEARCH_TERM.to_string());
        let fallbacks = lookup("FALLBACK_KEYWORDS")
            .unwrap_or_else(|| DEFAULT_FALLBACK_KEYWORDS.to_string());

        Self::new(&base_url, &default_term, &fallbacks)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidBaseUrl(format!("{} ({})", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

/// Comma-separated list, trimmed, blanks dropped
pub fn parse_keyword_list(raw: &str) -> Vec<SearchTerm> {
    raw.split(',').filter_map(SearchTerm::parse).collect()
}
