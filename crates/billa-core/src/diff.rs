//! Snapshot diff between the price history and the current scrape.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::changes::{ChangeSet, FieldDiff};
use crate::compare::values_equivalent;
use crate::record::{PriceField, PriceRecord};

/// Latest-known state per sku: the row with the greatest `date`, ties going
/// to the row that appears later in `history`. Sorted by sku.
#[must_use]
pub fn latest_by_sku(history: &[PriceRecord]) -> Vec<&PriceRecord> {
    let mut latest: BTreeMap<&str, &PriceRecord> = BTreeMap::new();
    for row in history {
        latest
            .entry(row.sku.as_str())
            .and_modify(|current| {
                if row.date >= current.date {
                    *current = row;
                }
            })
            .or_insert(row);
    }
    latest.into_values().collect()
}

/// Compares every latest historical row against the scraped row with the
/// same sku.
///
/// Skus present on only one side are skipped. When the scrape holds a sku
/// more than once, its first occurrence is compared.
#[must_use]
pub fn find_differences(latest: &[&PriceRecord], scraped: &[PriceRecord]) -> ChangeSet {
    let mut scraped_by_sku: HashMap<&str, &PriceRecord> = HashMap::with_capacity(scraped.len());
    for row in scraped {
        scraped_by_sku.entry(row.sku.as_str()).or_insert(row);
    }

    let mut changes = ChangeSet::new();
    for historical in latest {
        let Some(current) = scraped_by_sku.get(historical.sku.as_str()) else {
            continue;
        };

        let field_diffs: BTreeMap<String, FieldDiff> = PriceField::ALL
            .iter()
            .filter_map(|&field| {
                let before = historical.value(field);
                let after = current.value(field);
                if values_equivalent(field, before, after) {
                    None
                } else {
                    Some((
                        field.name().to_owned(),
                        FieldDiff {
                            historical: before.to_json(),
                            scraped: after.to_json(),
                        },
                    ))
                }
            })
            .collect();

        if !field_diffs.is_empty() {
            changes.insert(historical.sku.clone(), field_diffs);
        }
    }
    changes
}

/// [`latest_by_sku`] followed by [`find_differences`].
#[must_use]
pub fn diff_snapshot(history: &[PriceRecord], scraped: &[PriceRecord]) -> ChangeSet {
    let latest = latest_by_sku(history);
    find_differences(&latest, scraped)
}

/// Scraped rows whose sku appears in `changes`, in scrape order.
#[must_use]
pub fn rows_to_append(scraped: &[PriceRecord], changes: &ChangeSet) -> Vec<PriceRecord> {
    let changed: HashSet<&str> = changes.keys().map(String::as_str).collect();
    scraped
        .iter()
        .filter(|row| changed.contains(row.sku.as_str()))
        .cloned()
        .collect()
}

/// First scraped row of every sku, in scrape order. Used to seed an empty
/// history, where nothing can be compared yet.
#[must_use]
pub fn seed_rows(scraped: &[PriceRecord]) -> Vec<PriceRecord> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(scraped.len());
    scraped
        .iter()
        .filter(|row| seen.insert(row.sku.as_str()))
        .cloned()
        .collect()
}

/// Rows a run appends to the history.
///
/// Only the scraped rows of changed skus, except that an empty `history`
/// is seeded with [`seed_rows`] when `seed_empty` is set. A sku missing
/// from a non-empty history is never appended.
#[must_use]
pub fn rows_for_run(
    history: &[PriceRecord],
    scraped: &[PriceRecord],
    changes: &ChangeSet,
    seed_empty: bool,
) -> Vec<PriceRecord> {
    if history.is_empty() && seed_empty {
        seed_rows(scraped)
    } else {
        rows_to_append(scraped, changes)
    }
}

#[cfg(test)]
#[path = "diff_test.rs"]
mod tests;
