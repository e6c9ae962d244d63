//! Page-index cursor for the catalog endpoint.
//!
//! The endpoint is addressed by a zero-based `page` query parameter and a
//! `pageSize` parameter that always mirrors the cursor's page size. A
//! [`PageCursor`] tracks how many records have been received and which page
//! comes next; it only ever moves forward and never past the last page.

use reqwest::Url;
use serde_json::Value;

use crate::error::ScraperError;

/// Name of the page-index query parameter.
pub const PAGE_PARAM: &str = "page";
/// Name of the page-size query parameter.
pub const PAGE_SIZE_PARAM: &str = "pageSize";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub records_scraped: u64,
    pub next_page: u64,
    pub total_records: u64,
    pub page_size: u32,
}

impl PageCursor {
    /// Cursor resuming after `records_scraped` records.
    ///
    /// The next page is `records_scraped / page_size`; a `page_size` of zero
    /// is treated as one.
    #[must_use]
    pub fn starting_at(records_scraped: u64, total_records: u64, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        Self {
            records_scraped,
            next_page: records_scraped / u64::from(page_size),
            total_records,
            page_size,
        }
    }

    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total_records.div_ceil(u64::from(self.page_size.max(1)))
    }

    #[must_use]
    pub fn records_to_go(&self) -> u64 {
        self.total_records.saturating_sub(self.records_scraped)
    }

    /// `true` once every record has arrived or every page has been requested.
    ///
    /// The page bound is what ends the loop when pages come back empty.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.records_scraped >= self.total_records || self.next_page >= self.total_pages()
    }

    /// Cursor after a successful response carrying `records_in_page` records.
    ///
    /// The page index advances even for an empty page.
    #[must_use]
    pub fn advance(self, records_in_page: usize) -> Self {
        Self {
            records_scraped: self
                .records_scraped
                .saturating_add(records_in_page as u64),
            next_page: self.next_page + 1,
            ..self
        }
    }
}

/// Everything a multi-page fetch has produced so far.
#[derive(Debug, Clone)]
pub struct FetchState {
    pub cursor: PageCursor,
    pub records: Vec<Value>,
    /// Set when a page exhausted its retries; no further pages are fetched.
    pub truncated: bool,
}

impl FetchState {
    #[must_use]
    pub fn new(cursor: PageCursor) -> Self {
        Self {
            cursor,
            records: Vec::new(),
            truncated: false,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.truncated || self.cursor.is_done()
    }
}

/// Returns `base_url` with its `page` and `pageSize` query values set to
/// `page` and `page_size`.
///
/// The page size always comes from the cursor so the request cannot
/// disagree with the page arithmetic. Other query parameters keep their
/// order; missing ones are appended.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `base_url` does not parse.
pub fn page_url(base_url: &str, page: u64, page_size: u32) -> Result<String, ScraperError> {
    let mut url = Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })?;

    let page_value = page.to_string();
    let size_value = page_size.to_string();
    let mut has_page = false;
    let mut has_size = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            if key == PAGE_PARAM {
                has_page = true;
                (key.into_owned(), page_value.clone())
            } else if key == PAGE_SIZE_PARAM {
                has_size = true;
                (key.into_owned(), size_value.clone())
            } else {
                (key.into_owned(), value.into_owned())
            }
        })
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, value) in &pairs {
            query.append_pair(key, value);
        }
        if !has_page {
            query.append_pair(PAGE_PARAM, &page_value);
        }
        if !has_size {
            query.append_pair(PAGE_SIZE_PARAM, &size_value);
        }
    }

    Ok(url.to_string())
}
