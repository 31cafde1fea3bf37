//! Rate-limited JSON fetcher for the upstream data API
//!
//! Every outbound call goes through [`RateLimitedFetcher::fetch`], which:
//! - waits on a shared governor rate limiter (one token per logical call)
//! - retries transport errors and non-2xx statuses with exponential backoff
//! - applies a fixed per-attempt timeout
//!
//! Exhausting the retries yields [`FetchError::Exhausted`]; callers treat that as
//! "no data this round" rather than a fatal error.

use crate::config::Config;
use crate::metrics;
use crate::utils::error::FetchError;
use crate::utils::retry::{with_retry_if, RetryPolicy, Sleeper, TokioSleeper};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Client,
};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP fetcher shared by the scanner and the enrichment batcher
///
/// The rate limiter is atomic, so one fetcher can serve concurrent callers
/// while keeping the whole process under the configured request budget.
pub struct RateLimitedFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Scheme and host every endpoint path is appended to
    base_url: String,

    policy: RetryPolicy,

    sleeper: Arc<dyn Sleeper>,
}

impl RateLimitedFetcher {
    /// Create a fetcher from the application config
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for a malformed base URL and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Self::with_config(
            &config.api.base_url,
            &config.api.api_key,
            &config.api.user_agent,
            config.fetcher.requests_per_second,
            config.retry_policy(),
            config.request_timeout(),
        )
    }

    /// Create a fetcher with explicit settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for a malformed base URL and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn with_config(
        base_url: &str,
        api_key: &str,
        user_agent: &str,
        requests_per_second: u32,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        url::Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .default_headers(Self::build_headers(api_key, user_agent)?)
            .build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        // Burst of one: consecutive dispatches are at least 1/rate apart
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate).allow_burst(NonZeroU32::MIN));

        Ok(Self {
            client,
            rate_limiter,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Create a fetcher pointed at a mock server, with default retry policy
    ///
    /// # Errors
    ///
    /// Same as [`RateLimitedFetcher::with_config`]
    pub fn with_base_url(base_url: &str, requests_per_second: u32) -> Result<Self, FetchError> {
        Self::with_config(
            base_url,
            "test-key",
            "creator-scout-test",
            requests_per_second,
            RetryPolicy::default(),
            Duration::from_secs(5),
        )
    }

    /// Replace the sleeper used for backoff delays
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `endpoint` with query `params` and decode the JSON body
    ///
    /// # Errors
    ///
    /// - `FetchError::Exhausted` once every attempt failed with a retryable error
    /// - `FetchError::Decode` when a 2xx body is not JSON (not retried)
    pub async fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, FetchError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, endpoint);

        let result = with_retry_if(
            &self.policy,
            self.sleeper.as_ref(),
            |attempt| {
                if attempt > 0 {
                    metrics::record_retry(endpoint);
                }
                self.attempt(&url, params)
            },
            Self::should_retry,
        )
        .await;

        metrics::record_request(endpoint, result.is_ok());

        result.map_err(|e| {
            if Self::should_retry(&e) {
                warn!(endpoint = endpoint, error = %e, "Retries exhausted");
                FetchError::Exhausted {
                    endpoint: endpoint.to_string(),
                    last: e.summary(),
                }
            } else {
                e
            }
        })
    }

    /// A single request attempt
    async fn attempt(&self, url: &str, params: &[(&str, String)]) -> Result<Value, FetchError> {
        debug!(url = url, "Sending request");

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Http(e)
            }
        })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Transport errors and every non-2xx status are retried; decoding problems are not
    fn should_retry(error: &FetchError) -> bool {
        matches!(
            error,
            FetchError::Http(_) | FetchError::Status(_) | FetchError::Timeout
        )
    }

    fn build_headers(api_key: &str, user_agent: &str) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();

        let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| FetchError::InvalidUrl("api key contains invalid header characters".into()))?;
        headers.insert(AUTHORIZATION, auth);

        if let Ok(agent) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, agent);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(headers)
    }
}
