//! Translate a case file into solver inputs.

use bf_project::CaseFile;
use bf_results::GridInfo;
use bf_solver::{CornerSmoothing, Domain, RegimeTable, SimConfig, Viscosity};

use crate::error::AppResult;

pub fn compile_domain(case: &CaseFile) -> AppResult<Domain> {
    Ok(Domain::new(case.domain.nx, case.domain.ny, case.obstacle)?)
}

pub fn grid_info(case: &CaseFile) -> GridInfo {
    GridInfo {
        nx: case.domain.nx,
        ny: case.domain.ny,
        h: case.domain.spacing_m,
    }
}

/// Regime table of the case (or the built-in one) with the case's corner constants.
pub fn regime_table(case: &CaseFile) -> RegimeTable {
    let table = case.regimes.clone().unwrap_or_default();
    table.with_corner_constants(
        case.corner.favored_weight,
        CornerSmoothing {
            spike_threshold: case.corner.spike_threshold,
            keep_weight: case.corner.keep_weight,
        },
    )
}

/// Solver configuration for one Reynolds number of the case.
pub fn sim_config(case: &CaseFile, reynolds: f64) -> SimConfig {
    let solver = &case.solver;
    SimConfig {
        spacing: bf_core::m(case.domain.spacing_m),
        inlet_velocity: bf_core::mps(case.flow.inlet_velocity_mps),
        viscosity: Viscosity::Reynolds(reynolds),
        model: case.flow.model,
        free_surface: case.flow.free_surface,
        omega: solver.omega,
        tolerance: solver.tolerance,
        max_iterations: solver.max_iterations,
        sweep: solver.sweep,
        stagnation_floor: solver.stagnation_floor,
        stagnation_epsilon: solver.stagnation_epsilon,
        reenforce_after_sweep: solver.reenforce_after_sweep,
        regimes: regime_table(case),
    }
}
