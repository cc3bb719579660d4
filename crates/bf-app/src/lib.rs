//! Application service layer for beamflow.
//!
//! Turns case files into solver runs, exports the results and reports
//! progress to the frontend.

pub mod case_compile;
pub mod case_service;
pub mod error;
pub mod progress;
pub mod run_service;

pub use case_compile::{compile_domain, grid_info, regime_table, sim_config};
pub use case_service::{CaseSummary, load_case, save_case, summarize, validate_case};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use run_service::{BatchOutcome, RunOptions, run_batch, run_case};
