use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use super::*;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn priced(sku: &str, date: NaiveDate, cents: i64) -> PriceRecord {
    let mut record = PriceRecord::new(sku, date);
    record.price_regular_value = Some(Decimal::new(cents, 2));
    record
}

// -----------------------------------------------------------------------
// latest_by_sku
// -----------------------------------------------------------------------

#[test]
fn latest_by_sku_picks_max_date() {
    let history = vec![
        priced("A", day(3), 300),
        priced("A", day(1), 100),
        priced("B", day(2), 200),
    ];
    let latest = latest_by_sku(&history);
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].sku, "A");
    assert_eq!(latest[0].price_regular_value, Some(Decimal::new(300, 2)));
    assert_eq!(latest[1].sku, "B");
}

#[test]
fn latest_by_sku_breaks_date_ties_by_insertion_order() {
    let history = vec![priced("A", day(5), 100), priced("A", day(5), 250)];
    let latest = latest_by_sku(&history);
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].price_regular_value, Some(Decimal::new(250, 2)));
}

#[test]
fn latest_by_sku_on_empty_history_is_empty() {
    assert!(latest_by_sku(&[]).is_empty());
}

// -----------------------------------------------------------------------
// find_differences / diff_snapshot
// -----------------------------------------------------------------------

#[test]
fn price_change_is_reported_with_both_values() {
    let history = vec![priced("A", day(1), 999)];
    let scraped = vec![priced("A", day(2), 1049)];

    let changes = diff_snapshot(&history, &scraped);

    assert_eq!(changes.len(), 1);
    let diff = &changes["A"]["price_regular_value"];
    assert_eq!(diff.historical, json!(9.99));
    assert_eq!(diff.scraped, json!(10.49));
    assert_eq!(changes["A"].len(), 1, "only the price should differ");
}

#[test]
fn identical_rows_produce_no_entry() {
    let mut row = priced("A", day(1), 999);
    row.regular_tags = Some(json!(["bio"]));
    row.amount = Some(json!("500"));
    let history = vec![row.clone()];
    let mut scraped = row;
    scraped.date = day(9);

    let changes = diff_snapshot(&history, &[scraped]);
    assert!(changes.is_empty(), "got: {changes:?}");
}

#[test]
fn diff_is_idempotent() {
    let history = vec![priced("A", day(1), 999), priced("B", day(1), 100)];
    let scraped = vec![priced("A", day(2), 1049), priced("B", day(2), 100)];

    let first = diff_snapshot(&history, &scraped);
    let second = diff_snapshot(&history, &scraped);
    assert_eq!(first, second);
    assert_eq!(first.keys().collect::<Vec<_>>(), vec!["A"]);
}

#[test]
fn one_sided_skus_are_skipped() {
    let history = vec![priced("OLD", day(1), 100)];
    let scraped = vec![priced("NEW", day(2), 200)];
    assert!(diff_snapshot(&history, &scraped).is_empty());
}

#[test]
fn only_latest_history_row_is_compared() {
    let history = vec![priced("A", day(1), 500), priced("A", day(2), 999)];
    let scraped = vec![priced("A", day(3), 999)];
    assert!(diff_snapshot(&history, &scraped).is_empty());
}

#[test]
fn absence_variants_across_history_and_scrape_match() {
    let mut historical = PriceRecord::new("A", day(1));
    historical.promotion_text = Some(json!("None"));
    historical.bundle_info = Some(json!(""));
    let mut scraped = PriceRecord::new("A", day(2));
    scraped.promotion_text = Some(json!(""));
    scraped.package_label = Some(json!("None"));

    assert!(diff_snapshot(&[historical], &[scraped]).is_empty());
}

#[test]
fn amount_override_and_fallback() {
    let mut historical = PriceRecord::new("A", day(1));
    historical.amount = Some(json!("500"));
    let mut scraped = PriceRecord::new("A", day(2));
    scraped.amount = Some(json!(500.0));
    assert!(diff_snapshot(&[historical.clone()], &[scraped.clone()]).is_empty());

    historical.amount = Some(json!("abc"));
    scraped.amount = Some(json!(500));
    let changes = diff_snapshot(&[historical], &[scraped]);
    let diff = &changes["A"]["amount"];
    assert_eq!(diff.historical, json!("abc"));
    assert_eq!(diff.scraped, json!(500));
}

#[test]
fn first_scraped_duplicate_is_compared() {
    let history = vec![priced("A", day(1), 100)];
    let scraped = vec![priced("A", day(2), 100), priced("A", day(2), 200)];
    assert!(diff_snapshot(&history, &scraped).is_empty());
}

// -----------------------------------------------------------------------
// rows_to_append / rows_for_run
// -----------------------------------------------------------------------

#[test]
fn rows_to_append_keeps_only_changed_skus() {
    let history = vec![priced("A", day(1), 999), priced("B", day(1), 100)];
    let scraped = vec![priced("A", day(2), 1049), priced("B", day(2), 100)];
    let changes = diff_snapshot(&history, &scraped);

    let rows = rows_to_append(&scraped, &changes);
    assert_eq!(rows, vec![priced("A", day(2), 1049)]);
}

#[test]
fn new_sku_in_existing_history_is_not_appended() {
    let history = vec![priced("A", day(1), 999)];
    let scraped = vec![priced("A", day(2), 999), priced("C", day(2), 50)];
    let changes = diff_snapshot(&history, &scraped);
    assert!(changes.is_empty());

    assert!(rows_for_run(&history, &scraped, &changes, true).is_empty());
}

#[test]
fn empty_history_is_seeded_with_first_occurrences() {
    let scraped = vec![
        priced("A", day(2), 999),
        priced("B", day(2), 1),
        priced("A", day(2), 5),
    ];
    let changes = diff_snapshot(&[], &scraped);

    let rows = rows_for_run(&[], &scraped, &changes, true);
    assert_eq!(rows, vec![priced("A", day(2), 999), priced("B", day(2), 1)]);
}

#[test]
fn seeding_can_be_disabled() {
    let scraped = vec![priced("A", day(2), 999)];
    assert!(rows_for_run(&[], &scraped, &ChangeSet::new(), false).is_empty());
}

#[test]
fn rows_for_run_with_history_matches_rows_to_append() {
    let history = vec![priced("A", day(1), 999)];
    let scraped = vec![priced("A", day(2), 1049)];
    let changes = diff_snapshot(&history, &scraped);
    assert_eq!(
        rows_for_run(&history, &scraped, &changes, true),
        rows_to_append(&scraped, &changes)
    );
}
