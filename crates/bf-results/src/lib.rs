//! bf-results: text export of run snapshots and the batch summary.

pub mod export;
pub mod store;
pub mod types;

pub use export::{ExportReport, FieldKind, Snapshot, export_snapshot, file_name};
pub use store::{ResultStore, SUMMARY_FILE};
pub use types::*;

use std::path::PathBuf;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Output path {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Summary not found: {}", path.display())]
    SummaryNotFound { path: PathBuf },
}
