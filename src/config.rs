//! Configuration management for the search agent.
//!
//! Configuration is read from environment variables (a `.env` file is loaded
//! by the binary first):
//! - `LLM_BASE_URL` - OpenAI-compatible endpoint. Defaults to `http://0.0.0.0:7000/v1`.
//! - `LLM_API_KEY` - Bearer token. Defaults to `local-key`.
//! - `LLM_MODEL` - Model identifier. Defaults to `lfm2.5`.
//! - `LLM_TEMPERATURE` / `LLM_TOP_P` - Sampling. Default to `0.1`.
//! - `LLM_MAX_TOKENS` - Completion cap. Defaults to `2048`.
//! - `SEARXNG_URL` - SearXNG instance. Defaults to `http://searxng.chat.svc.cluster.local:8080`.
//! - `SEARXNG_TIMEOUT_SECS` - Per-request timeout. Defaults to `30`.
//! - `SEARCH_LANGUAGE` - Defaults to `en`.
//! - `SEARCH_CATEGORIES` / `SEARCH_ENGINES` - Optional comma-separated filters.
//! - `MAX_RESULTS_PER_QUERY` - Defaults to `5`.
//! - `RESEARCH_MODE` - `speed`, `balanced` or `quality`. Defaults to `balanced`.
//! - `MAX_ITERATIONS` - Search/decide loop budget. Defaults to `5`.
//! - `MAX_VERIFICATION_RETRIES` - Answer rewrites after a failed fact check. Defaults to `1`.
//! - `RUN_TIMEOUT_SECS` - Optional deadline for a whole run.
//! - `DEBUG` - Verbose logging. Defaults to `false`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::agent::ResearchMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Completion service settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://0.0.0.0:7000/v1".to_string(),
            api_key: "local-key".to_string(),
            model: "lfm2.5".to_string(),
            temperature: 0.1,
            top_p: 0.1,
            max_tokens: 2048,
        }
    }
}

/// Web search (SearXNG) settings.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// SearXNG base URL
    pub url: String,

    /// Per-request timeout
    pub timeout: Duration,

    pub language: String,

    /// Results kept per query
    pub max_results_per_query: usize,

    /// Optional category filter (e.g. `general`, `news`)
    pub categories: Vec<String>,

    /// Optional engine filter (e.g. `google`, `bing`)
    pub engines: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: "http://searxng.chat.svc.cluster.local:8080".to_string(),
            timeout: Duration::from_secs(30),
            language: "en".to_string(),
            max_results_per_query: 5,
            categories: Vec::new(),
            engines: Vec::new(),
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,

    pub search: SearchConfig,

    /// Prompt preset for the decision loop
    pub research_mode: ResearchMode,

    /// Budget for the search/decide loop
    pub max_iterations: usize,

    /// How many times a failed fact check may send the answer back for a rewrite
    pub max_verification_retries: usize,

    /// Deadline for a whole run (None = no deadline)
    pub run_timeout: Option<Duration>,

    /// Verbose logging
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            research_mode: ResearchMode::Balanced,
            max_iterations: 5,
            max_verification_retries: 1,
            run_timeout: None,
            debug: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let llm = LlmConfig {
            base_url: lookup("LLM_BASE_URL").unwrap_or(defaults.llm.base_url),
            api_key: lookup("LLM_API_KEY").unwrap_or(defaults.llm.api_key),
            model: lookup("LLM_MODEL").unwrap_or(defaults.llm.model),
            temperature: parse_var(&lookup, "LLM_TEMPERATURE")?.unwrap_or(defaults.llm.temperature),
            top_p: parse_var(&lookup, "LLM_TOP_P")?.unwrap_or(defaults.llm.top_p),
            max_tokens: parse_var(&lookup, "LLM_MAX_TOKENS")?.unwrap_or(defaults.llm.max_tokens),
        };

        let search = SearchConfig {
            url: lookup("SEARXNG_URL").unwrap_or(defaults.search.url),
            timeout: parse_var::<u64, _>(&lookup, "SEARXNG_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.search.timeout),
            language: lookup("SEARCH_LANGUAGE").unwrap_or(defaults.search.language),
            max_results_per_query: parse_var(&lookup, "MAX_RESULTS_PER_QUERY")?
                .unwrap_or(defaults.search.max_results_per_query),
            categories: lookup("SEARCH_CATEGORIES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            engines: lookup("SEARCH_ENGINES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
        };

        let research_mode = parse_var(&lookup, "RESEARCH_MODE")?.unwrap_or(defaults.research_mode);

        let max_iterations = parse_var(&lookup, "MAX_ITERATIONS")?.unwrap_or(defaults.max_iterations);
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let max_verification_retries = parse_var(&lookup, "MAX_VERIFICATION_RETRIES")?
            .unwrap_or(defaults.max_verification_retries);

        let run_timeout = parse_var::<u64, _>(&lookup, "RUN_TIMEOUT_SECS")?.map(Duration::from_secs);

        let debug = lookup("DEBUG")
            .map(|v| parse_bool(&v).map_err(|e| ConfigError::InvalidValue("DEBUG".to_string(), e)))
            .transpose()?
            .unwrap_or(defaults.debug);

        Ok(Self {
            llm,
            search,
            research_mode,
            max_iterations,
            max_verification_retries,
            run_timeout,
            debug,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(research_mode: ResearchMode, max_iterations: usize) -> Self {
        Self {
            research_mode,
            max_iterations,
            ..Self::default()
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue(key.to_string(), format!("{}", e)))
        })
        .transpose()
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = load(&[]).unwrap();
        assert_eq!(config.llm.model, "lfm2.5");
        assert_eq!(config.search.language, "en");
        assert_eq!(config.search.max_results_per_query, 5);
        assert_eq!(config.research_mode, ResearchMode::Balanced);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.max_verification_retries, 1);
        assert!(config.run_timeout.is_none());
        assert!(!config.debug);
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("RESEARCH_MODE", "quality"),
            ("MAX_ITERATIONS", "8"),
            ("SEARXNG_TIMEOUT_SECS", "10"),
            ("SEARCH_ENGINES", "google, bing,"),
            ("RUN_TIMEOUT_SECS", "120"),
            ("DEBUG", "yes"),
        ])
        .unwrap();
        assert_eq!(config.research_mode, ResearchMode::Quality);
        assert_eq!(config.max_iterations, 8);
        assert_eq!(config.search.timeout, Duration::from_secs(10));
        assert_eq!(config.search.engines, vec!["google", "bing"]);
        assert_eq!(config.run_timeout, Some(Duration::from_secs(120)));
        assert!(config.debug);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = load(&[("MAX_ITERATIONS", "many")]).unwrap_err();
        assert!(err.to_string().contains("MAX_ITERATIONS"));

        let err = load(&[("RESEARCH_MODE", "turbo")]).unwrap_err();
        assert!(err.to_string().contains("RESEARCH_MODE"));

        assert!(load(&[("MAX_ITERATIONS", "0")]).is_err());
        assert!(load(&[("DEBUG", "maybe")]).is_err());
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool(" On "), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("2").is_err());
    }
}
