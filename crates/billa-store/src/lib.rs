//! File-backed persistence for the tracker: the CSV price history, the JSON
//! run log, and the HTML report generated from it.

pub mod error;
pub mod fs;
pub mod report;
pub mod run_log;
pub mod snapshot;

pub use error::StoreError;
pub use report::{render_report, write_report};
pub use run_log::RunLog;
pub use snapshot::{HistoricalTable, LoadedHistory, SnapshotStore, TableSource};
