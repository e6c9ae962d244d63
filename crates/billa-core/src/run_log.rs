//! One entry of the persisted run history.
//!
//! Key names match the log files produced by earlier versions of the
//! tracker, so an existing `scraping_log.json` keeps loading.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::changes::ChangeSet;

pub const NO_DIFFERENCES_MESSAGE: &str =
    "No differences found between the latest historical data and the scraped data.";

/// Either the change set of a run or the "nothing changed" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Differences {
    Found(ChangeSet),
    Message(String),
}

impl Differences {
    /// Wraps `changes`, using the sentinel message when it is empty.
    #[must_use]
    pub fn from_changes(changes: ChangeSet) -> Self {
        if changes.is_empty() {
            Differences::Message(NO_DIFFERENCES_MESSAGE.to_owned())
        } else {
            Differences::Found(changes)
        }
    }

    #[must_use]
    pub fn changed_sku_count(&self) -> usize {
        match self {
            Differences::Found(changes) => changes.len(),
            Differences::Message(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "TotalRecords")]
    pub total_records: u64,
    #[serde(rename = "RecordsScraped")]
    pub records_scraped: u64,
    #[serde(rename = "Number of rows in combined_dataframe")]
    pub rows_before: u64,
    #[serde(rename = "Number of rows in updated_combined_dataframe")]
    pub rows_after: u64,
    #[serde(rename = "Differences found")]
    pub differences: Differences,
}

/// `YYYY-MM-DD HH:MM:SS` on output; ISO-8601 with a `T` separator and
/// fractional seconds are accepted on input.
mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map_err(serde::de::Error::custom)
    }
}
