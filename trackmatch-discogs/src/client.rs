//! Discogs API client
//!
//! Authenticated with a personal access token. Discogs reports the request
//! budget of the current one-minute window in `X-Discogs-Ratelimit*` headers.
//!
//! # Retries
//! - HTTP 429: wait `Retry-After` seconds (60 when absent) and retry, up to
//!   `max_retries` times
//! - HTTP 5xx: wait `2^n` seconds and retry, up to `max_retries` times
//! - A successful response reporting zero remaining quota makes the next
//!   request wait out the window first
//! - Any other non-success status fails immediately

use crate::models::{Artist, Master, Release, SearchResults};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use trackmatch_common::config::DiscogsConfig;
use trackmatch_core::ProviderError;

const ACCEPT_HEADER: &str = "application/vnd.discogs.v2+json";
const RATELIMIT_HEADER: &str = "x-discogs-ratelimit";
const RATELIMIT_USED_HEADER: &str = "x-discogs-ratelimit-used";
const RATELIMIT_REMAINING_HEADER: &str = "x-discogs-ratelimit-remaining";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const QUOTA_WINDOW_SECS: u64 = 60;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Request budget last reported by Discogs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Requests allowed per window
    pub limit: Option<u32>,
    pub used: Option<u32>,
    pub remaining: Option<u32>,
}

impl RateLimitStatus {
    /// Merge the headers of a response; absent or malformed values keep the
    /// previous reading
    fn update(&mut self, headers: &HeaderMap) {
        if let Some(limit) = header_u32(headers, RATELIMIT_HEADER) {
            self.limit = Some(limit);
        }
        if let Some(used) = header_u32(headers, RATELIMIT_USED_HEADER) {
            self.used = Some(used);
        }
        if let Some(remaining) = header_u32(headers, RATELIMIT_REMAINING_HEADER) {
            self.remaining = Some(remaining);
        }
    }

    fn exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn retry_after(headers: &HeaderMap) -> Duration {
    let secs = header_u32(headers, RETRY_AFTER.as_str())
        .map(u64::from)
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

/// Query parameters of `GET /database/search`
///
/// Unset fields are omitted from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub query: Option<String>,
    /// "release", "master", "artist" or "label"
    pub result_type: Option<String>,
    /// Combined "Artist - Title" field
    pub title: Option<String>,
    pub release_title: Option<String>,
    pub credit: Option<String>,
    pub artist: Option<String>,
    pub anv: Option<String>,
    pub label: Option<String>,
    pub genre: Option<String>,
    pub style: Option<String>,
    pub country: Option<String>,
    pub year: Option<String>,
    pub format: Option<String>,
    pub catno: Option<String>,
    pub barcode: Option<String>,
    pub track: Option<String>,
    pub submitter: Option<String>,
    pub contributor: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SearchParams {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let text_fields = [
            ("q", &self.query),
            ("type", &self.result_type),
            ("title", &self.title),
            ("release_title", &self.release_title),
            ("credit", &self.credit),
            ("artist", &self.artist),
            ("anv", &self.anv),
            ("label", &self.label),
            ("genre", &self.genre),
            ("style", &self.style),
            ("country", &self.country),
            ("year", &self.year),
            ("format", &self.format),
            ("catno", &self.catno),
            ("barcode", &self.barcode),
            ("track", &self.track),
            ("submitter", &self.submitter),
            ("contributor", &self.contributor),
        ];

        let mut query: Vec<(&'static str, String)> = text_fields
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (key, v.to_string()))
            })
            .collect();

        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            query.push(("per_page", per_page.to_string()));
        }
        query
    }
}

/// Discogs API client
pub struct DiscogsClient {
    http_client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    quota_window: Duration,
    rate_limit: Mutex<RateLimitStatus>,
}

impl DiscogsClient {
    /// Build a client from configuration
    ///
    /// Fails with [`ProviderError::Auth`] when the token or user agent is
    /// missing, since Discogs rejects unauthenticated or anonymous requests.
    pub fn new(config: &DiscogsConfig) -> Result<Self, ProviderError> {
        let token = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::Auth("Discogs API token is required".to_string()))?;

        let user_agent = config.user_agent.trim();
        if user_agent.is_empty() {
            return Err(ProviderError::Auth(
                "User-Agent is required by Discogs API".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Discogs token={}", token)).map_err(|_| {
            ProviderError::Auth("Discogs API token is not a valid header value".to_string())
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            quota_window: Duration::from_secs(QUOTA_WINDOW_SECS),
            rate_limit: Mutex::new(RateLimitStatus::default()),
        })
    }

    /// Override how long an exhausted request budget is waited out
    pub fn with_quota_window(mut self, window: Duration) -> Self {
        self.quota_window = window;
        self
    }

    /// Last reported request budget
    pub async fn rate_limit(&self) -> RateLimitStatus {
        *self.rate_limit.lock().await
    }

    /// Search the database
    pub async fn search(&self, params: &SearchParams) -> Result<SearchResults, ProviderError> {
        self.get_json("/database/search", &params.to_query()).await
    }

    pub async fn get_release(&self, release_id: u64) -> Result<Release, ProviderError> {
        self.get_json(&format!("/releases/{}", release_id), &[]).await
    }

    pub async fn get_master(&self, master_id: u64) -> Result<Master, ProviderError> {
        self.get_json(&format!("/masters/{}", master_id), &[]).await
    }

    pub async fn get_artist(&self, artist_id: u64) -> Result<Artist, ProviderError> {
        self.get_json(&format!("/artists/{}", artist_id), &[]).await
    }

    fn full_url(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!("{}/{}", self.base_url, path_or_url.trim_start_matches('/'))
        }
    }

    /// GET a JSON resource, retrying on rate limiting and server errors
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ProviderError> {
        let url = self.full_url(path);
        let mut retries = 0u32;

        loop {
            self.wait_for_quota().await;

            debug!(url = %url, retries, "Querying Discogs API");
            let response = self
                .http_client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;

            let status = response.status();
            {
                let mut rate_limit = self.rate_limit.lock().await;
                rate_limit.update(response.headers());
                if status == StatusCode::TOO_MANY_REQUESTS {
                    // Retry-After already covers the window
                    rate_limit.remaining = None;
                }
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if retries >= self.max_retries {
                    return Err(ProviderError::RateLimited { retries });
                }
                let wait = retry_after(response.headers());
                warn!(
                    url = %url,
                    wait_secs = wait.as_secs(),
                    "Discogs rate limit hit, backing off"
                );
                tokio::time::sleep(wait).await;
                retries += 1;
                continue;
            }

            if status.is_server_error() && retries < self.max_retries {
                let backoff = Duration::from_secs(2u64.saturating_pow(retries));
                warn!(
                    url = %url,
                    status = status.as_u16(),
                    backoff_secs = backoff.as_secs(),
                    "Discogs server error, retrying"
                );
                tokio::time::sleep(backoff).await;
                retries += 1;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                return Err(ProviderError::NotFound(url));
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                let message = response.text().await.unwrap_or_default();
                return Err(ProviderError::Auth(message));
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;
            return serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()));
        }
    }

    /// Sleep out the current window when the last response reported no
    /// remaining quota
    async fn wait_for_quota(&self) {
        let mut status = self.rate_limit.lock().await;
        if status.exhausted() {
            let wait = self.quota_window;
            warn!(wait_ms = wait.as_millis() as u64, "Discogs request budget exhausted, waiting");
            tokio::time::sleep(wait).await;
            status.remaining = None;
        }
    }
}
