//! Error types for solver setup.
//!
//! Numerical outcomes (divergence, stagnation, iteration cap) are not errors;
//! they are reported through [`crate::RunStatus`].

use bf_core::BfError;
use thiserror::Error;

/// Errors that can occur while configuring a run.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid geometry: {what}")]
    Geometry { what: String },

    #[error("Invalid configuration: {what}")]
    Config { what: String },

    #[error("No Reynolds regime covers Re = {reynolds}")]
    NoRegime { reynolds: f64 },

    #[error("Core error: {0}")]
    Core(#[from] BfError),
}

pub type SolverResult<T> = Result<T, SolverError>;
