//! Last.fm web service client
//!
//! Every call is a GET on the API root with `method`, `api_key` and
//! `format=json` query parameters. Failures come back as an `{"error": N}`
//! body, with or without an error HTTP status.
//!
//! # Retries
//! - Error 29 (rate limit) or HTTP 429: back off and retry, then fail with
//!   `RateLimited`
//! - Errors 11 and 16 (service offline, temporary failure) or HTTP 5xx: back
//!   off and retry
//! - Error 6 (no such track or artist): `NotFound`
//! - Errors 4, 9, 10 and 26 (credentials): `Auth`
//!
//! The backoff doubles on each attempt, starting at one second, up to
//! `max_retries` attempts. Requests are spaced at least 200 ms apart.

use crate::models::{
    ApiErrorBody, ArtistSearchResponse, ArtistSearchResults, Tag, TopTagsResponse,
    TrackSearchResponse, TrackSearchResults,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use trackmatch_common::config::LastfmConfig;
use trackmatch_core::ProviderError;

const MIN_REQUEST_INTERVAL_MS: u64 = 200;
const RETRY_BACKOFF_SECS: u64 = 1;
const REQUEST_TIMEOUT_SECS: u64 = 30;

const ERROR_INVALID_PARAMETERS: u32 = 6;
const ERROR_AUTHENTICATION_FAILED: u32 = 4;
const ERROR_INVALID_SESSION: u32 = 9;
const ERROR_INVALID_API_KEY: u32 = 10;
const ERROR_SERVICE_OFFLINE: u32 = 11;
const ERROR_TEMPORARY: u32 = 16;
const ERROR_SUSPENDED_API_KEY: u32 = 26;
const ERROR_RATE_LIMIT: u32 = 29;

/// Spaces requests at least `min_interval` apart
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Last.fm rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// What to do with a failed call
enum Failure {
    /// Retryable, `RateLimited` once retries run out
    RateLimited,
    /// Retryable, `Api` once retries run out
    Unavailable(&'static str),
    Fail(ProviderError),
}

/// Classify a Last.fm error code
fn classify_error_code(code: u32, message: String, status: StatusCode) -> Failure {
    match code {
        ERROR_RATE_LIMIT => Failure::RateLimited,
        ERROR_SERVICE_OFFLINE | ERROR_TEMPORARY => Failure::Unavailable("service unavailable"),
        ERROR_INVALID_PARAMETERS => Failure::Fail(ProviderError::NotFound(message)),
        ERROR_AUTHENTICATION_FAILED
        | ERROR_INVALID_SESSION
        | ERROR_INVALID_API_KEY
        | ERROR_SUSPENDED_API_KEY => Failure::Fail(ProviderError::Auth(message)),
        _ => Failure::Fail(ProviderError::Api {
            status: status.as_u16(),
            message: format!("error {}: {}", code, message),
        }),
    }
}

/// Classify a non-success response that carried no error code
fn classify_status(status: StatusCode, body: String) -> Failure {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Failure::RateLimited
    } else if status.is_server_error() {
        Failure::Unavailable("server error")
    } else if status == StatusCode::NOT_FOUND {
        Failure::Fail(ProviderError::NotFound(body))
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Failure::Fail(ProviderError::Auth(body))
    } else {
        Failure::Fail(ProviderError::Api {
            status: status.as_u16(),
            message: body,
        })
    }
}

/// Last.fm API client
pub struct LastfmClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    retry_backoff: Duration,
    rate_limiter: RateLimiter,
}

impl LastfmClient {
    /// Build a client from configuration
    ///
    /// Fails with [`ProviderError::Auth`] when no API key is configured.
    pub fn new(config: &LastfmConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::Auth("Last.fm API key is required".to_string()))?;

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.trim())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_secs(RETRY_BACKOFF_SECS),
            rate_limiter: RateLimiter::new(Duration::from_millis(MIN_REQUEST_INTERVAL_MS)),
        })
    }

    /// Override the minimum spacing between requests
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.rate_limiter = RateLimiter::new(interval);
        self
    }

    /// Override the first retry delay (later retries double it)
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// `track.search`
    pub async fn search_tracks(
        &self,
        artist: &str,
        track: &str,
        limit: u32,
    ) -> Result<TrackSearchResults, ProviderError> {
        let limit = limit.to_string();
        let response: TrackSearchResponse = self
            .call(
                "track.search",
                &[("artist", artist), ("track", track), ("limit", limit.as_str())],
            )
            .await?;
        Ok(response.results)
    }

    /// `artist.search`
    pub async fn search_artists(
        &self,
        artist: &str,
        limit: u32,
    ) -> Result<ArtistSearchResults, ProviderError> {
        let limit = limit.to_string();
        let response: ArtistSearchResponse = self
            .call("artist.search", &[("artist", artist), ("limit", limit.as_str())])
            .await?;
        Ok(response.results)
    }

    /// `track.getTopTags`, most popular first
    pub async fn track_top_tags(
        &self,
        artist: &str,
        track: &str,
    ) -> Result<Vec<Tag>, ProviderError> {
        let response: TopTagsResponse = self
            .call(
                "track.getTopTags",
                &[("artist", artist), ("track", track), ("autocorrect", "1")],
            )
            .await?;
        Ok(response.toptags.tag)
    }

    /// `artist.getTopTags`, most popular first
    pub async fn artist_top_tags(&self, artist: &str) -> Result<Vec<Tag>, ProviderError> {
        let response: TopTagsResponse = self
            .call("artist.getTopTags", &[("artist", artist), ("autocorrect", "1")])
            .await?;
        Ok(response.toptags.tag)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/", self.base_url);
        let mut retries = 0u32;

        loop {
            self.rate_limiter.wait().await;

            debug!(method, retries, "Querying Last.fm API");
            let response = self
                .http_client
                .get(&url)
                .query(&[
                    ("method", method),
                    ("api_key", self.api_key.as_str()),
                    ("format", "json"),
                ])
                .query(params)
                .send()
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;

            let error_code = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|e| e.error.map(|code| (code, e.message.unwrap_or_default())));

            let failure = match error_code {
                Some((code, message)) => classify_error_code(code, message, status),
                None if status.is_success() => {
                    return serde_json::from_str(&body)
                        .map_err(|e| ProviderError::Parse(e.to_string()));
                }
                None => classify_status(status, body),
            };

            match failure {
                Failure::RateLimited | Failure::Unavailable(_) if retries < self.max_retries => {
                    let backoff = self.retry_backoff.saturating_mul(2u32.saturating_pow(retries));
                    warn!(
                        method,
                        status = status.as_u16(),
                        backoff_ms = backoff.as_millis() as u64,
                        "Last.fm request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    retries += 1;
                }
                Failure::RateLimited => return Err(ProviderError::RateLimited { retries }),
                Failure::Unavailable(reason) => {
                    return Err(ProviderError::Api {
                        status: status.as_u16(),
                        message: reason.to_string(),
                    });
                }
                Failure::Fail(error) => return Err(error),
            }
        }
    }
}
