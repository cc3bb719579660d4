//! Error types for the bf-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Case error: {0}")]
    Case(String),

    #[error("Failed to write case file: {path}")]
    CaseFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Case validation failed: {0}")]
    Validation(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for bf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<bf_project::ProjectError> for AppError {
    fn from(err: bf_project::ProjectError) -> Self {
        match err {
            bf_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Case(other.to_string()),
        }
    }
}

impl From<bf_project::ValidationError> for AppError {
    fn from(err: bf_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<bf_solver::SolverError> for AppError {
    fn from(err: bf_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<bf_results::ResultsError> for AppError {
    fn from(err: bf_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
