//! Multi-page fetch loop for `CatalogClient`.

use crate::error::ScraperError;
use crate::pagination::{page_url, FetchState, PageCursor};
use crate::retry::retry_fixed;

use super::CatalogClient;

impl CatalogClient {
    /// Fetches every page from the cursor position implied by
    /// `records_scraped` until `total_records` have arrived or the last page
    /// has been requested.
    ///
    /// **Partial-result semantics**: when one page keeps failing for
    /// `max_attempts` attempts, the loop stops and the records gathered so
    /// far are returned with [`FetchState::truncated`] set. Callers treat
    /// that as valid input, not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] only if `base_url` cannot be
    /// parsed; transport failures never surface as errors here.
    pub async fn fetch_all(
        &self,
        base_url: &str,
        total_records: u64,
        records_scraped: u64,
        page_size: u32,
    ) -> Result<FetchState, ScraperError> {
        let cursor = PageCursor::starting_at(records_scraped, total_records, page_size);
        let mut state = FetchState::new(cursor);

        while !state.is_finished() {
            state = self.fetch_step(base_url, state).await?;
        }

        tracing::info!(
            records = state.records.len(),
            records_scraped = state.cursor.records_scraped,
            total_records = state.cursor.total_records,
            pages_requested = state.cursor.next_page,
            truncated = state.truncated,
            "catalog fetch finished"
        );
        Ok(state)
    }

    /// Requests the page under the cursor (with retries) and returns the
    /// next state.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `base_url` cannot be parsed.
    pub async fn fetch_step(
        &self,
        base_url: &str,
        state: FetchState,
    ) -> Result<FetchState, ScraperError> {
        let FetchState {
            cursor,
            mut records,
            truncated,
        } = state;
        let url = page_url(base_url, cursor.next_page, cursor.page_size)?;

        let result = retry_fixed(self.settings.max_attempts, self.settings.retry_delay, || {
            let url = url.clone();
            async move { self.fetch_page(&url).await }
        })
        .await;

        match result {
            Ok(page) => {
                let page_records = page.into_results();
                let cursor = cursor.advance(page_records.len());
                records.extend(page_records);

                tracing::info!(
                    page = cursor.next_page - 1,
                    records_scraped = cursor.records_scraped,
                    records_to_go = cursor.records_to_go(),
                    "catalog page fetched"
                );

                if !cursor.is_done() && !self.settings.inter_page_delay.is_zero() {
                    tokio::time::sleep(self.settings.inter_page_delay).await;
                }

                Ok(FetchState {
                    cursor,
                    records,
                    truncated,
                })
            }
            Err(ScraperError::InvalidUrl { url, reason }) => {
                Err(ScraperError::InvalidUrl { url, reason })
            }
            Err(err) => {
                tracing::error!(
                    page = cursor.next_page,
                    max_attempts = self.settings.max_attempts,
                    error = %err,
                    "page failed after all attempts, stopping fetch"
                );
                Ok(FetchState {
                    cursor,
                    records,
                    truncated: true,
                })
            }
        }
    }
}
