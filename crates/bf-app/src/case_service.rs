//! Case loading, saving and introspection.

use bf_project::CaseFile;
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Short description of a case for console listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSummary {
    pub name: String,
    pub grid: (usize, usize),
    pub obstacle: (usize, usize, usize),
    pub model: &'static str,
    pub reynolds: Vec<f64>,
}

/// Load a case from YAML or JSON (by extension) and validate it.
pub fn load_case(path: &Path) -> AppResult<CaseFile> {
    Ok(bf_project::load_case(path)?)
}

/// Validate and write a case; `.json` paths are written as JSON, others as YAML.
pub fn save_case(path: &Path, case: &CaseFile) -> AppResult<()> {
    let result = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => bf_project::save_json(path, case),
        _ => bf_project::save_yaml(path, case),
    };
    result.map_err(|e| match e {
        bf_project::ProjectError::Io(source) => AppError::CaseFileWrite {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })
}

pub fn validate_case(case: &CaseFile) -> AppResult<()> {
    Ok(bf_project::validate_case(case)?)
}

pub fn summarize(case: &CaseFile) -> CaseSummary {
    CaseSummary {
        name: case.name.clone(),
        grid: (case.domain.nx, case.domain.ny),
        obstacle: (case.obstacle.start, case.obstacle.length, case.obstacle.height),
        model: case.flow.model.as_str(),
        reynolds: case.reynolds.clone(),
    }
}
