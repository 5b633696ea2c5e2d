//! Outbound JSON fetching with bounded retry, pacing and response caching.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::cache::ResponseCache;
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::retry::RetryConfig;
use crate::throttling::Throttle;
use crate::ProviderId;

pub const DEFAULT_USER_AGENT: &str = concat!(
    "pitlane/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/pitlane-f1/pitlane)"
);

/// Whether a failed fetch is worth trying again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Transport failure, timeout, 408, 429 or 5xx.
    Transient,
    /// Any other non-2xx status.
    Permanent,
    /// 2xx with a body that does not decode into the expected shape.
    Malformed,
}

/// Terminal failure of [`JsonFetcher::fetch_json`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub provider: ProviderId,
    pub status: Option<u16>,
    pub attempts: u32,
    pub kind: FetchErrorKind,
    pub cause: String,
}

impl FetchError {
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, FetchErrorKind::Transient)
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} request failed after {} attempt(s): {}",
            self.provider, self.attempts, self.cause
        )
    }
}

impl std::error::Error for FetchError {}

/// JSON fetcher bound to one provider.
///
/// Clones share the transport, the rate limiter and the response cache.
#[derive(Clone)]
pub struct JsonFetcher {
    http: Arc<dyn HttpClient>,
    retry: RetryConfig,
    user_agent: String,
    timeout_ms: u64,
    policy: ProviderPolicy,
    throttle: Throttle,
    cache: ResponseCache,
}

impl JsonFetcher {
    pub fn new(http: Arc<dyn HttpClient>, policy: ProviderPolicy) -> Self {
        Self {
            http,
            retry: RetryConfig::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 8_000,
            throttle: Throttle::from_policy(&policy),
            policy,
            cache: ResponseCache::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    pub const fn provider(&self) -> ProviderId {
        self.policy.provider_id
    }

    pub const fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    /// Fetches `request` and decodes the body as `T`.
    ///
    /// Only bodies that decode are cached, for the provider's revalidation period.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, FetchError> {
        let provider = self.provider();

        if let Some(body) = self.cache.get(&request.url).await {
            match serde_json::from_str(&body) {
                Ok(value) => {
                    tracing::debug!(%provider, url = %request.log_url, "response cache hit");
                    return Ok(value);
                }
                Err(error) => {
                    tracing::debug!(%provider, %error, "cached body no longer decodes; refetching");
                }
            }
        }

        let cache_key = request.url.clone();
        let (body, attempts) = self.fetch_body(request).await?;

        let value = serde_json::from_str(&body).map_err(|error| FetchError {
            provider,
            status: Some(200),
            attempts,
            kind: FetchErrorKind::Malformed,
            cause: format!("response body does not match the expected shape: {error}"),
        })?;

        self.cache.put(cache_key, body, self.policy.revalidate).await;
        Ok(value)
    }

    async fn fetch_body(&self, request: HttpRequest) -> Result<(String, u32), FetchError> {
        let provider = self.provider();
        let request = request
            .with_header("user-agent", self.user_agent.as_str())
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);
        let max_attempts = self.retry.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.throttle.acquire().await;

            tracing::debug!(%provider, attempt, url = %request.log_url, "sending request");
            let failure = match self.http.execute(request.clone()).await {
                Ok(response) if response.is_success() => return Ok((response.body, attempt)),
                Ok(response) => FetchError {
                    provider,
                    status: Some(response.status),
                    attempts: attempt,
                    kind: if self.retry.should_retry_status(response.status) {
                        FetchErrorKind::Transient
                    } else {
                        FetchErrorKind::Permanent
                    },
                    cause: format!("request failed with status {}", response.status),
                },
                Err(error) => FetchError {
                    provider,
                    status: None,
                    attempts: attempt,
                    kind: if error.retryable() && self.retry.retry_on_transport {
                        FetchErrorKind::Transient
                    } else {
                        FetchErrorKind::Permanent
                    },
                    cause: error.message().to_string(),
                },
            };

            if !failure.is_transient() || attempt >= max_attempts {
                return Err(failure);
            }

            let delay = self.retry.delay_for_attempt(attempt);
            tracing::warn!(
                %provider,
                attempt,
                status = failure.status,
                delay_ms = duration_ms(delay),
                url = %request.log_url,
                cause = %failure.cause,
                "transient upstream failure; retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

impl std::fmt::Debug for JsonFetcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFetcher")
            .field("provider", &self.policy.provider_id)
            .field("retry", &self.retry)
            .field("user_agent", &self.user_agent)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
