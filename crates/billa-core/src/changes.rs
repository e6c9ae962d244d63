use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Historical and freshly scraped value of one differing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    #[serde(default)]
    pub historical: Value,
    #[serde(default)]
    pub scraped: Value,
}

/// Per-sku map of differing fields, keyed by column name.
///
/// Only skus with at least one differing field are present.
pub type ChangeSet = BTreeMap<String, BTreeMap<String, FieldDiff>>;
