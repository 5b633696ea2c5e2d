//! Explicit runtime configuration.
//!
//! Every provider gets its own section; an adapter is constructed from its
//! section only. [`PitlaneConfig::from_env`] is the single place that reads
//! the process environment.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::fetch::{JsonFetcher, DEFAULT_USER_AGENT};
use crate::http_client::HttpClient;
use crate::provider_policy::ProviderPolicy;
use crate::retry::RetryConfig;
use crate::{ProviderId, ValidationError};

pub const DEFAULT_JOLPICA_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_OPENF1_BASE_URL: &str = "https://api.openf1.org/v1";
pub const DEFAULT_TIMEZONEDB_BASE_URL: &str = "https://api.timezonedb.com";
pub const DEFAULT_WIKIPEDIA_BASE_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_F1LIVE_BASE_URL: &str = "https://api-formula-1.p.rapidapi.com";
pub const DEFAULT_F1LIVE_ENDPOINT: &str = "/events/live";

/// Schedule, standings and results provider (Ergast-compatible).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JolpicaConfig {
    pub base_url: String,
}

impl Default for JolpicaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_JOLPICA_BASE_URL.to_string(),
        }
    }
}

/// Credentialed provider section: a base URL plus an optional API key.
///
/// `api_key = None` means the provider is not configured.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyedProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl KeyedProviderConfig {
    pub fn unconfigured(base_url: &str) -> Self {
        Self {
            api_key: None,
            base_url: base_url.to_string(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for KeyedProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Live timing and telemetry provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenF1Config {
    pub session_key: Option<String>,
    pub base_url: String,
}

impl Default for OpenF1Config {
    fn default() -> Self {
        Self {
            session_key: None,
            base_url: DEFAULT_OPENF1_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikipediaConfig {
    pub base_url: String,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WIKIPEDIA_BASE_URL.to_string(),
        }
    }
}

/// Track-status feed served through RapidAPI.
///
/// `api_key = None` means the feed is not configured.
#[derive(Clone, PartialEq, Eq)]
pub struct F1LiveConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub endpoint: String,
    /// `X-RapidAPI-Host` value; the host of `base_url` when unset.
    pub host: Option<String>,
}

impl F1LiveConfig {
    pub fn unconfigured(base_url: &str) -> Self {
        Self {
            api_key: None,
            base_url: base_url.to_string(),
            endpoint: DEFAULT_F1LIVE_ENDPOINT.to_string(),
            host: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn rapidapi_host(&self) -> Option<String> {
        self.host.clone().or_else(|| {
            reqwest::Url::parse(&self.base_url)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string))
        })
    }
}

impl Default for F1LiveConfig {
    fn default() -> Self {
        Self::unconfigured(DEFAULT_F1LIVE_BASE_URL)
    }
}

impl std::fmt::Debug for F1LiveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("F1LiveConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("host", &self.host)
            .finish()
    }
}

/// Transport settings shared by every provider.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    pub user_agent: String,
    pub retry: RetryConfig,
    pub timeout_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
            timeout_ms: 8_000,
        }
    }
}

impl HttpSettings {
    /// Fetcher for `provider` using its default pacing and cache horizon.
    pub fn fetcher_for(&self, http: Arc<dyn HttpClient>, provider: ProviderId) -> JsonFetcher {
        JsonFetcher::new(http, ProviderPolicy::default_for(provider))
            .with_retry(self.retry.clone())
            .with_user_agent(self.user_agent.clone())
            .with_timeout_ms(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitlaneConfig {
    pub jolpica: JolpicaConfig,
    pub openweather: KeyedProviderConfig,
    pub newsapi: KeyedProviderConfig,
    pub youtube: KeyedProviderConfig,
    pub openf1: OpenF1Config,
    pub timezonedb: KeyedProviderConfig,
    pub wikipedia: WikipediaConfig,
    pub f1live: F1LiveConfig,
    pub http: HttpSettings,
    pub fixtures_dir: Option<PathBuf>,
}

impl Default for PitlaneConfig {
    fn default() -> Self {
        Self {
            jolpica: JolpicaConfig::default(),
            openweather: KeyedProviderConfig::unconfigured(DEFAULT_OPENWEATHER_BASE_URL),
            newsapi: KeyedProviderConfig::unconfigured(DEFAULT_NEWSAPI_BASE_URL),
            youtube: KeyedProviderConfig::unconfigured(DEFAULT_YOUTUBE_BASE_URL),
            openf1: OpenF1Config::default(),
            timezonedb: KeyedProviderConfig::unconfigured(DEFAULT_TIMEZONEDB_BASE_URL),
            wikipedia: WikipediaConfig::default(),
            f1live: F1LiveConfig::default(),
            http: HttpSettings::default(),
            fixtures_dir: None,
        }
    }
}

impl PitlaneConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let url = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());
        let keyed = |key: &str, base: &str, default: &str| KeyedProviderConfig {
            api_key: get(key),
            base_url: url(base, default),
        };

        let defaults = HttpSettings::default();
        let attempts = match get("PITLANE_RETRY_ATTEMPTS") {
            Some(value) => parse_number::<u32>("PITLANE_RETRY_ATTEMPTS", &value)?,
            None => defaults.retry.max_attempts,
        };
        if attempts == 0 {
            return Err(ValidationError::InvalidSetting {
                name: "PITLANE_RETRY_ATTEMPTS",
                value: attempts.to_string(),
            });
        }
        let retry_base_ms = match get("PITLANE_RETRY_BASE_MS") {
            Some(value) => parse_number::<u64>("PITLANE_RETRY_BASE_MS", &value)?,
            None => 500,
        };
        let timeout_ms = match get("PITLANE_TIMEOUT_MS") {
            Some(value) => parse_number::<u64>("PITLANE_TIMEOUT_MS", &value)?,
            None => defaults.timeout_ms,
        };

        Ok(Self {
            jolpica: JolpicaConfig {
                base_url: url("JOLPICA_BASE_URL", DEFAULT_JOLPICA_BASE_URL),
            },
            openweather: keyed(
                "OPENWEATHER_API_KEY",
                "OPENWEATHER_BASE_URL",
                DEFAULT_OPENWEATHER_BASE_URL,
            ),
            newsapi: keyed("NEWS_API_KEY", "NEWSAPI_BASE_URL", DEFAULT_NEWSAPI_BASE_URL),
            youtube: keyed("YOUTUBE_API_KEY", "YOUTUBE_BASE_URL", DEFAULT_YOUTUBE_BASE_URL),
            openf1: OpenF1Config {
                session_key: get("OPENF1_SESSION_KEY"),
                base_url: url("OPENF1_BASE_URL", DEFAULT_OPENF1_BASE_URL),
            },
            timezonedb: keyed(
                "TIMEZONEDB_API_KEY",
                "TIMEZONEDB_BASE_URL",
                DEFAULT_TIMEZONEDB_BASE_URL,
            ),
            wikipedia: WikipediaConfig {
                base_url: url("WIKIPEDIA_BASE_URL", DEFAULT_WIKIPEDIA_BASE_URL),
            },
            f1live: F1LiveConfig {
                api_key: get("RAPIDAPI_F1LIVE_KEY"),
                base_url: url("RAPIDAPI_F1LIVE_URL", DEFAULT_F1LIVE_BASE_URL),
                endpoint: url("RAPIDAPI_F1LIVE_ENDPOINT", DEFAULT_F1LIVE_ENDPOINT),
                host: get("RAPIDAPI_F1LIVE_HOST"),
            },
            http: HttpSettings {
                user_agent: get("PITLANE_USER_AGENT").unwrap_or(defaults.user_agent),
                retry: RetryConfig::linear(attempts, Duration::from_millis(retry_base_ms)),
                timeout_ms,
            },
            fixtures_dir: get("PITLANE_FIXTURES_DIR").map(PathBuf::from),
        })
    }

    /// Names of providers that are skipped because a credential is missing.
    pub fn unconfigured_features(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.openweather.is_configured() {
            missing.push("weather");
        }
        if !self.newsapi.is_configured() {
            missing.push("news");
        }
        if !self.youtube.is_configured() {
            missing.push("videos");
        }
        if self.openf1.session_key.is_none() {
            missing.push("live_timing");
        }
        if !self.timezonedb.is_configured() {
            missing.push("timezone");
        }
        if !self.f1live.is_configured() {
            missing.push("track_status");
        }
        missing
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ValidationError> {
    value.parse::<T>().map_err(|_| ValidationError::InvalidSetting {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = PitlaneConfig::from_lookup(lookup(&[])).expect("defaults are valid");

        assert_eq!(config, PitlaneConfig::default());
        assert_eq!(config.jolpica.base_url, DEFAULT_JOLPICA_BASE_URL);
        assert_eq!(config.http.retry.max_attempts, 3);
        assert!(!config.openweather.is_configured());
        assert_eq!(
            config.unconfigured_features(),
            vec!["weather", "news", "videos", "live_timing", "timezone", "track_status"]
        );
    }

    #[test]
    fn empty_strings_count_as_unset() {
        let config = PitlaneConfig::from_lookup(lookup(&[
            ("OPENWEATHER_API_KEY", ""),
            ("OPENF1_SESSION_KEY", "   "),
            ("JOLPICA_BASE_URL", ""),
        ]))
        .expect("valid");

        assert!(config.openweather.api_key.is_none());
        assert!(config.openf1.session_key.is_none());
        assert_eq!(config.jolpica.base_url, DEFAULT_JOLPICA_BASE_URL);
    }

    #[test]
    fn reads_provider_sections_and_http_settings() {
        let config = PitlaneConfig::from_lookup(lookup(&[
            ("OPENWEATHER_API_KEY", "ow-key"),
            ("NEWSAPI_BASE_URL", "http://localhost:9000/v2"),
            ("OPENF1_SESSION_KEY", "9158"),
            ("PITLANE_RETRY_ATTEMPTS", "5"),
            ("PITLANE_RETRY_BASE_MS", "10"),
            ("PITLANE_USER_AGENT", "pitlane-ci"),
            ("PITLANE_FIXTURES_DIR", "/tmp/fixtures"),
        ]))
        .expect("valid");

        assert_eq!(config.openweather.api_key.as_deref(), Some("ow-key"));
        assert_eq!(config.newsapi.base_url, "http://localhost:9000/v2");
        assert_eq!(config.openf1.session_key.as_deref(), Some("9158"));
        assert_eq!(config.http.retry.max_attempts, 5);
        assert_eq!(
            config.http.retry.delay_for_attempt(2),
            Duration::from_millis(20)
        );
        assert_eq!(config.http.user_agent, "pitlane-ci");
        assert_eq!(config.fixtures_dir, Some(PathBuf::from("/tmp/fixtures")));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let error = PitlaneConfig::from_lookup(lookup(&[("PITLANE_TIMEOUT_MS", "soon")]))
            .expect_err("not a number");
        assert_eq!(
            error,
            ValidationError::InvalidSetting {
                name: "PITLANE_TIMEOUT_MS",
                value: String::from("soon"),
            }
        );

        assert!(PitlaneConfig::from_lookup(lookup(&[("PITLANE_RETRY_ATTEMPTS", "0")])).is_err());
    }

    #[test]
    fn rapidapi_host_defaults_to_the_base_url_host() {
        let config = PitlaneConfig::from_lookup(lookup(&[
            ("RAPIDAPI_F1LIVE_KEY", "rapid-key"),
            ("RAPIDAPI_F1LIVE_URL", "https://f1live.test:8443/v1/"),
        ]))
        .expect("valid");

        assert!(config.f1live.is_configured());
        assert_eq!(config.f1live.endpoint, DEFAULT_F1LIVE_ENDPOINT);
        assert_eq!(config.f1live.rapidapi_host().as_deref(), Some("f1live.test"));

        let explicit = PitlaneConfig::from_lookup(lookup(&[("RAPIDAPI_F1LIVE_HOST", "edge.test")]))
            .expect("valid");
        assert_eq!(explicit.f1live.rapidapi_host().as_deref(), Some("edge.test"));
        assert_eq!(
            PitlaneConfig::default().f1live.rapidapi_host().as_deref(),
            Some("api-formula-1.p.rapidapi.com")
        );
    }

    #[test]
    fn debug_output_redacts_api_keys() {
        let section = KeyedProviderConfig::unconfigured(DEFAULT_NEWSAPI_BASE_URL).with_api_key("s3cr3t");
        let rendered = format!("{section:?}");
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("<redacted>"));
    }
}
