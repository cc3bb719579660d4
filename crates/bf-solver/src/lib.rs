//! Steady vorticity / stream-function solver for channel flow past a beam.
//!
//! The unknowns are the stream function psi and the vorticity w on a uniform
//! grid. Each iteration enforces the boundary conditions, relaxes psi and w
//! by successive over-relaxation and measures the largest change; the
//! [`ConvergenceController`] turns those deltas into a [`RunStatus`].
//! Numerical tuning that depends on the Reynolds number lives in a single
//! [`RegimeTable`].

pub mod boundary;
pub mod controller;
pub mod error;
pub mod field;
pub mod geometry;
pub mod params;
pub mod post;
pub mod regime;
pub mod relax;

pub use boundary::BoundaryEnforcer;
pub use controller::{
    CancelToken, ConvergenceController, IterationReport, PartialReason, RunReport, RunStatus,
    Solution, StagnationTracker, max_changes, max_changes_par, solve, solve_with_progress,
};
pub use error::{SolverError, SolverResult};
pub use field::{Field, FlowState};
pub use geometry::{Domain, Obstacle};
pub use params::{FlowModel, FreeSurface, SimConfig, SimParams, SweepMode, Viscosity};
pub use post::{VelocityOptions, VelocitySample, denormalize, normalize, velocity_field};
pub use regime::{CornerBlend, CornerSmoothing, RegimeBound, RegimeParams, RegimeRow, RegimeTable};
pub use relax::Relaxation;
