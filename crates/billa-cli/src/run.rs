//! Command handlers.
//!
//! A run fetches the full catalog, normalizes it, diffs it against the
//! latest history row per sku, appends the rows that changed, then records
//! the run in the log and rebuilds the report. An empty history is seeded
//! with the whole scrape. A truncated fetch is not an error; the partial
//! scrape is diffed like a complete one.

use anyhow::Context;
use chrono::Local;

use billa_core::{diff_snapshot, rows_for_run, AppConfig, Differences, RunLogEntry};
use billa_scraper::client::FetchSettings;
use billa_scraper::{normalize_records, CatalogClient};
use billa_store::{write_report, RunLog, SnapshotStore};

/// Runs one full tracking pass.
///
/// When `dry_run` is `true` nothing is written: the change summary is
/// printed and the history, log, and report are left as they are.
///
/// # Errors
///
/// Returns an error if the catalog total cannot be read, or if the history,
/// run log, or report cannot be written. Page failures after the first
/// request only shorten the scrape.
pub(crate) async fn run_tracker(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let client = CatalogClient::new(FetchSettings::from_config(config))
        .context("failed to build catalog client")?;

    let total_records = client
        .fetch_total(&config.start_url)
        .await
        .with_context(|| format!("failed to read catalog total from {}", config.start_url))?;
    tracing::info!(total_records, "catalog total fetched");

    let state = client
        .fetch_all(&config.start_url, total_records, 0, config.page_size)
        .await?;
    if state.truncated {
        tracing::warn!(
            records = state.records.len(),
            total_records,
            "catalog fetch stopped early, continuing with a partial scrape"
        );
    }
    let records_scraped = state.cursor.records_scraped;

    let scraped = normalize_records(&state.records, Local::now().date_naive());

    let store = SnapshotStore::from_config(config)?;
    let mut loaded = store.load().await;
    let rows_before = loaded.table.len() as u64;
    let history = loaded.table.records();

    let changes = diff_snapshot(&history, &scraped);
    for (sku, fields) in &changes {
        let columns: Vec<&str> = fields.keys().map(String::as_str).collect();
        tracing::info!(%sku, columns = %columns.join(","), "price record changed");
    }

    let rows = rows_for_run(&history, &scraped, &changes, config.seed_empty_history);
    if history.is_empty() && !rows.is_empty() {
        tracing::info!(rows = rows.len(), "seeding empty history");
    }

    if dry_run {
        println!(
            "dry-run: scraped {records_scraped}/{total_records} records, {} skus changed, \
             would append {} rows to {}",
            changes.len(),
            rows.len(),
            store.local_path().display()
        );
        return Ok(());
    }

    store
        .append(&mut loaded.table, &rows)
        .context("failed to save history table")?;
    let rows_after = loaded.table.len() as u64;

    let changed_skus = changes.len();
    let entry = RunLogEntry {
        timestamp: Local::now().naive_local(),
        total_records,
        records_scraped,
        rows_before,
        rows_after,
        differences: Differences::from_changes(changes),
    };
    let run_log = RunLog::new(&config.run_log_path);
    let entries = run_log.append(entry).context("failed to update run log")?;
    write_report(&config.report_path, &entries).context("failed to write report")?;

    println!(
        "run complete: scraped {records_scraped}/{total_records} records, \
         {changed_skus} skus changed, history {rows_before} -> {rows_after} rows"
    );
    Ok(())
}

/// Rebuilds the HTML report from the run log without scraping.
///
/// # Errors
///
/// Returns an error if the log cannot be read or the report cannot be written.
pub(crate) fn regenerate_report(config: &AppConfig) -> anyhow::Result<()> {
    let entries = RunLog::new(&config.run_log_path)
        .load()
        .context("failed to read run log")?;
    write_report(&config.report_path, &entries).context("failed to write report")?;
    println!(
        "report written to {} ({} entries)",
        config.report_path.display(),
        entries.len()
    );
    Ok(())
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
