// src/services/fetcher.rs

//! Page fetching with bounded retry on timeouts.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{AppError, Result};
use crate::models::FetchConfig;
use crate::utils::http::create_fetch_client;

/// Body of a fetched page, kept as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Raw response bytes
    pub body: Vec<u8>,
    /// Charset label from the `Content-Type` header, if any
    pub charset: Option<String>,
}

impl FetchedPage {
    /// A page without a declared charset (decoded as UTF-8).
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            charset: None,
        }
    }

    pub fn with_charset(body: impl Into<Vec<u8>>, charset: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            charset: Some(charset.into()),
        }
    }

    /// Decode the body using the declared charset.
    ///
    /// Unknown or missing labels fall back to UTF-8; a byte order mark wins
    /// over the label.
    pub fn text(&self) -> Cow<'_, str> {
        let encoding = self
            .charset
            .as_deref()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&self.body);
        text
    }
}

/// Extract the `charset` parameter of a `Content-Type` value.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Source of page bodies.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a single GET and return the body. Non-2xx is an error.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Fetcher backed by a reqwest client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: create_fetch_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self.client.get(url).send().await.map_err(|e| classify(url, e))?;
        let response = response.error_for_status().map_err(|e| classify(url, e))?;
        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_from_content_type);
        let body = response.bytes().await.map_err(|e| classify(url, e))?;
        Ok(FetchedPage {
            body: body.to_vec(),
            charset,
        })
    }
}

fn classify(url: &str, error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::Timeout {
            url: url.to_string(),
        }
    } else {
        AppError::fetch(url, error)
    }
}

/// Retry schedule for timeout-class failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Attempt `n` (1-based) is followed by a wait of `n * backoff`
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_secs(config.backoff_secs),
        }
    }

    /// Delay to wait after the given failed attempt, saturating at
    /// `Duration::MAX`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Fetch `url`, retrying only timeouts until the policy is exhausted.
///
/// Any other error is returned immediately.
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &RetryPolicy,
) -> Result<FetchedPage> {
    let mut attempt = 1;
    loop {
        match fetcher.fetch(url).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_timeout() && attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                log::warn!(
                    "Timeout fetching {}, retrying in {}s ({}/{})",
                    url,
                    delay.as_secs(),
                    attempt,
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
