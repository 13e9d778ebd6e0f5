//! HTTP fetching with timeout and bounded fixed-delay retry
//!
//! [`Transport`] is the narrow seam to the network: one GET, one body.
//! [`ReqwestTransport`] is the production implementation. On top of it,
//! [`ResilientFetcher`] adds the hard per-attempt timeout, the
//! user-agent header and the retry loop.

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::infrastructure::config::{HttpConfig, SiteConfig};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} timed out after {}ms", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    pub fn transport(url: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

/// One GET request as handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

/// Performs a single HTTP GET and returns the body on a 2xx response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| FetchError::InvalidRequest(format!("Invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::InvalidRequest(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let url = request.url.as_str();
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, request.user_agent.as_str())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                        timeout: request.timeout,
                    }
                } else {
                    FetchError::transport(url, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::transport(url, format!("Failed to read response body: {e}")))
    }
}

/// Retry policy of a [`ResilientFetcher`].
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub user_agent: String,
    pub timeout: Duration,
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Fixed wait between attempts
    pub retry_delay: Duration,
}

impl FetchPolicy {
    pub fn from_config(site: &SiteConfig, http: &HttpConfig) -> Self {
        Self {
            user_agent: site.user_agent.clone(),
            timeout: http.timeout(),
            max_retries: http.max_retries,
            retry_delay: http.retry_delay(),
        }
    }
}

/// GET with hard timeout and fixed-delay retry.
///
/// Holds no state between calls besides the shared transport.
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    policy: FetchPolicy,
}

impl ResilientFetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: FetchPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetch with the configured retry budget.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_with_retries(url, self.policy.max_retries).await
    }

    /// Fetch, retrying up to `retries` more times after a failure.
    ///
    /// Returns the last error once the budget is exhausted.
    pub async fn fetch_with_retries(&self, url: &str, retries: u32) -> Result<String, FetchError> {
        let request = FetchRequest {
            url: url.to_string(),
            user_agent: self.policy.user_agent.clone(),
            timeout: self.policy.timeout,
        };

        let mut remaining = retries;
        let mut attempt: u32 = 1;
        loop {
            match self.attempt(&request).await {
                Ok(body) => {
                    if attempt > 1 {
                        debug!("Fetched {} on attempt {}", url, attempt);
                    } else {
                        debug!("Fetched {} ({} bytes)", url, body.len());
                    }
                    return Ok(body);
                }
                Err(e) if remaining == 0 => {
                    warn!("Giving up on {} after {} attempt(s): {}", url, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        "Fetch of {} failed (attempt {}), retrying in {:?}: {}",
                        url, attempt, self.policy.retry_delay, e
                    );
                    sleep(self.policy.retry_delay).await;
                    remaining -= 1;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, request: &FetchRequest) -> Result<String, FetchError> {
        match tokio::time::timeout(request.timeout, self.transport.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: request.url.clone(),
                timeout: request.timeout,
            }),
        }
    }
}
