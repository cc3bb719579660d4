//! Result data types.

use bf_solver::{RunReport, RunStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Grid parameters echoed into every export header and the summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridInfo {
    pub nx: usize,
    pub ny: usize,
    pub h: f64,
}

/// Record of one Reynolds number within a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub reynolds: f64,
    pub model: String,
    pub status: RunStatus,
    pub success: bool,
    pub iterations: usize,
    pub max_diff_u: f64,
    pub max_diff_w: f64,
    pub effective_tolerance: f64,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_errors: Vec<String>,
}

impl RunManifest {
    pub fn from_report(reynolds: f64, model: &str, report: &RunReport) -> Self {
        Self {
            reynolds,
            model: model.to_string(),
            status: report.status,
            success: report.status.is_success(),
            iterations: report.iterations,
            // NaN is not representable in JSON
            max_diff_u: finite_or_max(report.max_diff_u),
            max_diff_w: finite_or_max(report.max_diff_w),
            effective_tolerance: report.effective_tolerance,
            elapsed_ms: report.elapsed.as_millis() as u64,
            files: Vec::new(),
            export_errors: Vec::new(),
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self.status, RunStatus::PartialConverged(_))
    }
}

fn finite_or_max(v: f64) -> f64 {
    if v.is_finite() { v } else { f64::MAX }
}

/// Manifest of a whole batch, written as `summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    pub case_name: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub grid: GridInfo,
    pub runs: Vec<RunManifest>,
}

impl BatchSummary {
    pub fn new(case_name: impl Into<String>, grid: GridInfo) -> Self {
        Self {
            case_name: case_name.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            grid,
            runs: Vec::new(),
        }
    }

    pub fn successful(&self) -> usize {
        self.runs.iter().filter(|r| r.success).count()
    }

    pub fn total(&self) -> usize {
        self.runs.len()
    }
}
