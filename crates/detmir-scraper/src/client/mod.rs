//! HTTP client for the storefront's catalog endpoint.

mod harvest;

use std::time::Duration;

use detmir_core::AppConfig;
use reqwest::header::HeaderMap;
use reqwest::Client;

use crate::error::ScraperError;
use crate::query::PageRequest;
use crate::rate_limit::retry_with_backoff;

pub use harvest::CategoryHarvest;

/// `Retry-After` assumed when a 429 response omits the header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// HTTP client for catalog page requests.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed errors. The body of a successful response is returned unparsed;
/// interpreting it is [`crate::PaginationDriver`]'s job.
///
/// Transient errors (429, network failures, 5xx) are automatically retried
/// with exponential backoff up to `max_retries` additional attempts.
pub struct DetmirClient {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
}

impl DetmirClient {
    /// Creates a `DetmirClient` with configured timeout, `User-Agent`, and retry policy.
    ///
    /// `max_retries` is the number of additional attempts after the first failure for
    /// retriable errors. Set to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Builds a client from the scraper section of [`AppConfig`].
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            config.scraper_max_retries,
            config.scraper_retry_backoff_base_secs,
        )
    }

    /// Fetches one catalog page and returns its raw body, retrying transient
    /// failures.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries exhausted.
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status (5xx retried, 4xx not).
    /// - [`ScraperError::Http`]: network or TLS failure after all retries exhausted.
    pub async fn fetch_page(&self, request: &PageRequest) -> Result<String, ScraperError> {
        let url = request.url();
        tracing::debug!(
            category = %request.category,
            offset = request.offset,
            page = request.page_index(),
            url,
            "fetching catalog page"
        );

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(ScraperError::RateLimited {
                    domain: request_domain(url),
                    retry_after_secs: retry_after_secs(response.headers()),
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScraperError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.text().await?)
        })
        .await
    }
}

/// Reads a whole-seconds `Retry-After` header; HTTP-date values and a
/// missing header fall back to 60 seconds.
fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Extracts the hostname from a request URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
fn request_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
