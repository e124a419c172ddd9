//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the shared HTTP client with browser-like headers
//! - Bounding in-flight requests through a [`Limiter`]
//! - Page fetches (status 200 and an HTML content type)
//! - Media fetches (status 200, raw bytes under a byte ceiling)
//! - Error classification
//!
//! Failures are never retried; each one is returned as a [`FetchError`] and
//! logged by the caller.

use crate::config::FetchConfig;
use crate::crawler::limiter::Limiter;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const ACCEPT_ANY: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Errors that can occur during a single fetch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("content type mismatch: {0}")]
    ContentMismatch(String),

    #[error("body exceeds {limit} bytes (at least {len} bytes)")]
    TooLarge { len: usize, limit: usize },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request limiter closed")]
    LimiterClosed,

    #[error("cancelled before the request was sent")]
    Cancelled,
}

/// A fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: String,
    /// Page body, decoded with the charset the server announced
    pub body: String,
}

/// A fetched media payload
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    /// The URL that was requested
    pub url: String,
    /// Raw response body
    pub bytes: Vec<u8>,
    /// Content-Type header value, empty when absent
    pub content_type: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use pixel_harvest::config::FetchConfig;
/// use pixel_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_ANY));
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A request path bounded by its own limiter and timeout
///
/// Pages and media use separate instances sharing one [`Client`], so each
/// kind of traffic has its own concurrency ceiling and pacing.
#[derive(Debug, Clone)]
pub struct BoundedFetcher {
    client: Client,
    limiter: Limiter,
    timeout: Duration,
    cancelled: Option<Arc<AtomicBool>>,
}

impl BoundedFetcher {
    pub fn new(client: Client, limiter: Limiter, timeout: Duration) -> Self {
        Self {
            client,
            limiter,
            timeout,
            cancelled: None,
        }
    }

    /// Fails every request that obtains its permit after `flag` was set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    /// Fetches an HTML page
    ///
    /// Succeeds only for status 200 with a Content-Type containing
    /// `text/html`.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let body = self
            .bounded(async {
                let (response, content_type) = self.send(url).await?;
                if !content_type.to_ascii_lowercase().contains("text/html") {
                    return Err(FetchError::ContentMismatch(content_type));
                }
                response.text().await.map_err(transport_error)
            })
            .await?;
        tracing::debug!("Fetched page {} ({} bytes)", url, body.len());

        Ok(FetchedPage {
            url: url.to_string(),
            body,
        })
    }

    /// Fetches a media payload; any status-200 body is accepted
    ///
    /// The body is read incrementally and abandoned as soon as it is known to
    /// exceed `max_bytes`, either from `Content-Length` or while streaming.
    pub async fn fetch_media(&self, url: &str, max_bytes: usize) -> Result<FetchedMedia, FetchError> {
        let (content_type, bytes) = self
            .bounded(async {
                let (mut response, content_type) = self.send(url).await?;

                if let Some(length) = response.content_length() {
                    let len = usize::try_from(length).unwrap_or(usize::MAX);
                    if len > max_bytes {
                        return Err(FetchError::TooLarge { len, limit: max_bytes });
                    }
                }

                let mut bytes = Vec::new();
                while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
                    let len = bytes.len() + chunk.len();
                    if len > max_bytes {
                        return Err(FetchError::TooLarge { len, limit: max_bytes });
                    }
                    bytes.extend_from_slice(&chunk);
                }
                Ok((content_type, bytes))
            })
            .await?;
        tracing::debug!("Fetched media {} ({} bytes)", url, bytes.len());

        Ok(FetchedMedia {
            url: url.to_string(),
            bytes,
            content_type,
        })
    }

    /// Runs `request` while holding a permit, under the timeout
    ///
    /// The cancel flag is read after the permit and pacing delay, right before
    /// the request goes out.
    async fn bounded<T, F>(&self, request: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| FetchError::LimiterClosed)?;

        if self.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }

    /// Sends one GET; anything but status 200 is a failure
    async fn send(&self, url: &str) -> Result<(Response, String), FetchError> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        Ok((response, content_type))
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

/// Maps a transport-level reqwest error onto [`FetchError`]
fn transport_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Transport("request timeout".to_string())
    } else if error.is_connect() {
        FetchError::Transport(format!("connection failed: {}", error))
    } else {
        FetchError::Transport(error.to_string())
    }
}
