//! Output directory handling.

use crate::export::{ExportReport, FieldKind, Snapshot, export_snapshot, file_name};
use crate::types::BatchSummary;
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "summary.json";

/// Directory receiving the `.dat` exports and the batch summary.
#[derive(Clone, Debug)]
pub struct ResultStore {
    root_dir: PathBuf,
    tag: String,
}

impl ResultStore {
    /// Open `root_dir`, creating it (and parents) when missing.
    pub fn new(root_dir: PathBuf, tag: impl Into<String>) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir).map_err(|source| ResultsError::CreateDir {
                path: root_dir.clone(),
                source,
            })?;
        } else if !root_dir.is_dir() {
            return Err(ResultsError::NotADirectory { path: root_dir });
        }
        Ok(Self {
            root_dir,
            tag: tag.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    pub fn file_path(&self, kind: FieldKind, reynolds: f64) -> PathBuf {
        self.root_dir.join(file_name(kind, &self.tag, reynolds))
    }

    pub fn export(&self, snapshot: &Snapshot<'_>) -> ExportReport {
        export_snapshot(&self.root_dir, &self.tag, snapshot)
    }

    pub fn save_summary(&self, summary: &BatchSummary) -> ResultsResult<PathBuf> {
        let path = self.root_dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    pub fn load_summary(&self) -> ResultsResult<BatchSummary> {
        let path = self.root_dir.join(SUMMARY_FILE);
        if !path.exists() {
            return Err(ResultsError::SummaryNotFound { path });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
