//! HTTP client for the retailer's public product catalog endpoint.

mod fetch_all;

use std::time::Duration;

use reqwest::Client;

use billa_core::AppConfig;

use crate::error::ScraperError;
use crate::types::CatalogPage;
use crate::user_agent::UserAgentPool;

/// Request pacing and retry settings for [`CatalogClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub timeout: Duration,
    /// Pause after every successful page before the next one is requested.
    pub inter_page_delay: Duration,
    /// Total attempts per page, including the first one.
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl FetchSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.scraper_request_timeout_secs),
            inter_page_delay: Duration::from_millis(config.scraper_inter_page_delay_ms),
            max_attempts: config.scraper_max_attempts,
            retry_delay: Duration::from_millis(config.scraper_retry_delay_ms),
        }
    }
}

/// HTTP client for the paginated catalog endpoint.
///
/// Single-page requests are plain GETs with a freshly rotated `User-Agent`.
/// Non-2xx statuses and unparseable bodies are typed errors; retrying them
/// is left to the multi-page loop in [`CatalogClient::fetch_all`].
pub struct CatalogClient {
    pub(super) client: Client,
    pub(super) user_agents: UserAgentPool,
    pub(super) settings: FetchSettings,
}

impl CatalogClient {
    /// Creates a `CatalogClient` with the given pacing and the built-in
    /// user-agent pool.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(settings: FetchSettings) -> Result<Self, ScraperError> {
        Self::with_user_agents(settings, UserAgentPool::default())
    }

    /// Creates a `CatalogClient` rotating through `user_agents`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_user_agents(
        settings: FetchSettings,
        user_agents: UserAgentPool,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            user_agents,
            settings,
        })
    }

    #[must_use]
    pub fn settings(&self) -> FetchSettings {
        self.settings
    }

    /// Fetches and decodes a single catalog page. No retries.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`]: network or TLS failure.
    /// - [`ScraperError::UnexpectedStatus`]: any non-2xx status.
    /// - [`ScraperError::Deserialize`]: the body is not a catalog page.
    pub async fn fetch_page(&self, url: &str) -> Result<CatalogPage, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, self.user_agents.pick())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::ACCEPT_LANGUAGE, "de-AT,de;q=0.9,en;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<CatalogPage>(&body).map_err(|e| ScraperError::Deserialize {
            context: format!("catalog page {url}"),
            source: e,
        })
    }

    /// Reads the catalog size from the first page at `start_url`.
    ///
    /// A response without a `total` key reports zero records.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_page`]; this request is not
    /// retried.
    pub async fn fetch_total(&self, start_url: &str) -> Result<u64, ScraperError> {
        let page = self.fetch_page(start_url).await?;
        let total = page.total.unwrap_or(0);
        tracing::info!(total_records = total, "catalog size reported by source");
        Ok(total)
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
