//! The append-only price history table.
//!
//! Rows are held as the raw CSV cells they were read with, and written back
//! cell for cell; only rows appended in the current run are rendered from
//! [`PriceRecord`]s. The parsed view used for diffing is derived on demand.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use billa_core::record::{DATE_COLUMN, DATE_FORMAT, SKU_COLUMN};
use billa_core::{AppConfig, PriceField, PriceRecord};

use crate::error::StoreError;
use crate::fs::write_atomically;

/// Positions of the known columns in a table's header.
struct ColumnIndex {
    sku: Option<usize>,
    date: Option<usize>,
    fields: HashMap<PriceField, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Default for HistoricalTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl HistoricalTable {
    /// A table with the canonical header and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            headers: StringRecord::from(PriceField::columns()),
            rows: Vec::new(),
        }
    }

    /// Reads a CSV table. Ragged rows are kept as they are; an input
    /// without a header line yields [`Self::empty`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Csv`] on I/O failure or non-UTF-8 content.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, StoreError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Ok(Self::empty());
        }

        let rows = rdr.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Parsed view of every row that has a sku and a readable date.
    ///
    /// Columns are matched by current or legacy name; unknown columns are
    /// ignored. Rows that cannot be keyed are left out with a warning (they
    /// stay in the table).
    #[must_use]
    pub fn records(&self) -> Vec<PriceRecord> {
        let index = self.column_index();
        let (Some(sku_col), Some(date_col)) = (index.sku, index.date) else {
            if !self.rows.is_empty() {
                tracing::warn!(
                    rows = self.rows.len(),
                    "history table has no sku/date columns, ignoring its rows"
                );
            }
            return Vec::new();
        };

        let mut skipped = 0usize;
        let mut records = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let sku = row.get(sku_col).map(str::trim).unwrap_or_default();
            let date = row.get(date_col).and_then(parse_date);
            let (false, Some(date)) = (sku.is_empty(), date) else {
                skipped += 1;
                continue;
            };

            let mut record = PriceRecord::new(sku, date);
            for (&field, &col) in &index.fields {
                record.set_cell(field, row.get(col).unwrap_or_default());
            }
            records.push(record);
        }

        if skipped > 0 {
            tracing::warn!(skipped, "history rows without sku or date were ignored");
        }
        records
    }

    /// Appends `records` after the existing rows.
    ///
    /// Canonical columns missing from the header are added at the end;
    /// existing rows are not touched.
    pub fn append(&mut self, records: &[PriceRecord]) {
        self.ensure_canonical_columns();
        let index = self.column_index();
        let width = self.headers.len();

        for record in records {
            let mut cells = vec![String::new(); width];
            if let Some(col) = index.sku {
                cells[col].clone_from(&record.sku);
            }
            if let Some(col) = index.date {
                cells[col] = record.date.format(DATE_FORMAT).to_string();
            }
            for (&field, &col) in &index.fields {
                cells[col] = record.cell(field);
            }
            self.rows.push(StringRecord::from(cells));
        }
    }

    /// Serializes the header and every row as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Csv`] if a record cannot be written.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.into_inner()
            .map_err(|e| StoreError::Csv(csv::Error::from(e.into_error())))
    }

    fn ensure_canonical_columns(&mut self) {
        let index = self.column_index();
        if index.sku.is_none() {
            self.headers.push_field(SKU_COLUMN);
        }
        if index.date.is_none() {
            self.headers.push_field(DATE_COLUMN);
        }
        for field in PriceField::ALL {
            if !index.fields.contains_key(&field) {
                self.headers.push_field(field.name());
            }
        }
    }

    fn column_index(&self) -> ColumnIndex {
        let mut index = ColumnIndex {
            sku: None,
            date: None,
            fields: HashMap::new(),
        };
        for (col, header) in self.headers.iter().enumerate() {
            let header = header.trim();
            if header == SKU_COLUMN {
                index.sku.get_or_insert(col);
            } else if header == DATE_COLUMN {
                index.date.get_or_insert(col);
            } else if let Some(field) = PriceField::from_column(header) {
                // The current name wins over a legacy alias of the same field.
                if header == field.name() || !index.fields.contains_key(&field) {
                    index.fields.insert(field, col);
                }
            }
        }
        index
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time of day.
fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    NaiveDate::parse_from_str(cell, DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Where [`SnapshotStore::load`] found the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    Local,
    Remote,
    Empty,
}

#[derive(Debug)]
pub struct LoadedHistory {
    pub table: HistoricalTable,
    pub source: TableSource,
}

/// Loads and persists the history table.
///
/// The local file is authoritative. The remote copy is only consulted when
/// the local file is missing or unreadable, and everything is written back
/// to the local path.
pub struct SnapshotStore {
    local_path: PathBuf,
    remote_url: Option<String>,
    http: reqwest::Client,
}

impl SnapshotStore {
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn new(
        local_path: impl Into<PathBuf>,
        remote_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            local_path: local_path.into(),
            remote_url,
            http,
        })
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        Self::new(
            config.history_path.clone(),
            config.history_remote_url.clone(),
            Duration::from_secs(config.scraper_request_timeout_secs),
        )
    }

    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Local file, then remote URL, then an empty table. Never fails.
    ///
    /// An unreadable local file is copied to `<name>.unreadable` before
    /// falling back, since the next persist replaces it.
    pub async fn load(&self) -> LoadedHistory {
        match self.load_local() {
            Ok(Some(table)) => {
                tracing::info!(
                    path = %self.local_path.display(),
                    rows = table.len(),
                    "loaded history from local file"
                );
                return LoadedHistory {
                    table,
                    source: TableSource::Local,
                };
            }
            Ok(None) => {
                tracing::info!(
                    path = %self.local_path.display(),
                    "local history not found"
                );
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.local_path.display(),
                    error = %e,
                    "local history unreadable"
                );
                self.backup_unreadable();
            }
        }

        if let Some(url) = &self.remote_url {
            match self.load_remote(url).await {
                Ok(table) => {
                    tracing::info!(%url, rows = table.len(), "loaded history from remote copy");
                    return LoadedHistory {
                        table,
                        source: TableSource::Remote,
                    };
                }
                Err(e) => {
                    tracing::error!(%url, error = %e, "remote history unavailable");
                }
            }
        }

        tracing::info!("starting from an empty history table");
        LoadedHistory {
            table: HistoricalTable::empty(),
            source: TableSource::Empty,
        }
    }

    /// Appends `records` to `table` and persists the whole table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the table cannot be serialized or written.
    pub fn append(
        &self,
        table: &mut HistoricalTable,
        records: &[PriceRecord],
    ) -> Result<(), StoreError> {
        table.append(records);
        self.persist(table)
    }

    /// Writes `table` to the local path, replacing the file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the table cannot be serialized or written.
    pub fn persist(&self, table: &HistoricalTable) -> Result<(), StoreError> {
        let bytes = table.to_csv_bytes()?;
        write_atomically(&self.local_path, &bytes)?;
        tracing::info!(
            path = %self.local_path.display(),
            rows = table.len(),
            "history table saved"
        );
        Ok(())
    }

    fn load_local(&self) -> Result<Option<HistoricalTable>, StoreError> {
        let file = match std::fs::File::open(&self.local_path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.local_path, e)),
        };
        HistoricalTable::from_reader(io::BufReader::new(file)).map(Some)
    }

    async fn load_remote(&self, url: &str) -> Result<HistoricalTable, StoreError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        let body = response.bytes().await?;
        HistoricalTable::from_reader(body.as_ref())
    }

    fn backup_unreadable(&self) {
        let mut name = self
            .local_path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".unreadable");
        let backup = self.local_path.with_file_name(name);
        match std::fs::copy(&self.local_path, &backup) {
            Ok(_) => tracing::warn!(backup = %backup.display(), "kept a copy of the unreadable history"),
            Err(e) => tracing::warn!(error = %e, "could not back up unreadable history"),
        }
    }
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
