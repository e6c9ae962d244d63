//! Static HTML summary of the run log.

use std::fmt::Write as _;
use std::path::Path;

use serde_json::Value;

use billa_core::{Differences, RunLogEntry};

use crate::error::StoreError;
use crate::fs::write_atomically;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Scraping Log</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; background-color: #f5f5f5; }
        .log-entry { border: 1px solid #ccc; padding: 15px; margin-bottom: 15px; background-color: white; border-radius: 5px; }
        .log-entry h3 { margin-top: 0; color: #333; }
        .differences { margin-top: 10px; padding: 10px; background-color: #f0f0f0; border-radius: 3px; }
        .differences h4 { margin-top: 0; }
    </style>
</head>
<body>
    <h1>Billa Scraper - Log Report</h1>
"#;

const PAGE_TAIL: &str = "</body>\n</html>\n";

/// Renders every entry, newest first. Entries sharing a timestamp keep
/// their log order.
#[must_use]
pub fn render_report(entries: &[RunLogEntry]) -> String {
    let mut sorted: Vec<&RunLogEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut html = String::from(PAGE_HEAD);
    for entry in sorted {
        render_entry(&mut html, entry);
    }
    html.push_str(PAGE_TAIL);
    html
}

/// Renders the report for `entries` and writes it to `path`.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be written.
pub fn write_report(path: &Path, entries: &[RunLogEntry]) -> Result<(), StoreError> {
    write_atomically(path, render_report(entries).as_bytes())?;
    tracing::info!(path = %path.display(), entries = entries.len(), "report written");
    Ok(())
}

// `write!` into a String cannot fail.
fn render_entry(html: &mut String, entry: &RunLogEntry) {
    let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
    let _ = write!(
        html,
        r#"    <div class="log-entry">
        <h3>Log Entry: {timestamp}</h3>
        <p><strong>Total Records:</strong> {}</p>
        <p><strong>Records Scraped:</strong> {}</p>
        <p><strong>Rows in History Before:</strong> {}</p>
        <p><strong>Rows in History After:</strong> {}</p>
"#,
        entry.total_records, entry.records_scraped, entry.rows_before, entry.rows_after,
    );

    match &entry.differences {
        Differences::Found(changes) if !changes.is_empty() => {
            html.push_str("        <div class=\"differences\"><h4>Differences Found:</h4>\n");
            for (sku, fields) in changes {
                let _ = writeln!(
                    html,
                    "            <p><strong>SKU: {}</strong></p><ul>",
                    html_escape(sku)
                );
                for (column, diff) in fields {
                    let _ = writeln!(
                        html,
                        "                <li>{}: Historical = {}, Scraped = {}</li>",
                        html_escape(column),
                        html_escape(&display_value(&diff.historical)),
                        html_escape(&display_value(&diff.scraped)),
                    );
                }
                html.push_str("            </ul>\n");
            }
            html.push_str("        </div>\n");
        }
        Differences::Found(_) => {}
        Differences::Message(message) => {
            let _ = writeln!(
                html,
                "        <div class=\"differences\"><p>{}</p></div>",
                html_escape(message)
            );
        }
    }
    html.push_str("    </div>\n");
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_owned(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
