//! Response shape of the catalog endpoint.
//!
//! Only the two envelope keys are typed. Product entries stay as raw
//! `serde_json::Value` objects because their shape varies between products
//! and over time; [`crate::normalize`] picks the fields it needs.

use serde::Deserialize;
use serde_json::Value;

/// One page of `GET /api/products?page=N&pageSize=M`.
#[derive(Debug, Deserialize)]
pub struct CatalogPage {
    /// Number of products in the whole catalog, repeated on every page.
    #[serde(default)]
    pub total: Option<u64>,

    /// Products on this page. Missing on some error-ish responses; such a
    /// page contributes nothing.
    #[serde(default)]
    pub results: Option<Vec<Value>>,
}

impl CatalogPage {
    #[must_use]
    pub fn into_results(self) -> Vec<Value> {
        self.results.unwrap_or_default()
    }
}
