//! Outer iteration loop and termination policy.

use crate::boundary::BoundaryEnforcer;
use crate::error::SolverResult;
use crate::field::FlowState;
use crate::geometry::Domain;
use crate::params::{SimConfig, SimParams, SweepMode};
use crate::relax::Relaxation;
use bf_core::{Real, nan_max};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Why a run was accepted without meeting the strict tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialReason {
    /// Stream function converged while the vorticity delta stopped moving.
    Stagnation,
    /// Iteration cap reached with the stream-function delta inside the
    /// relaxed acceptance bound.
    IterationCap,
}

/// Terminal state of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RunStatus {
    Converged,
    PartialConverged(PartialReason),
    Diverged,
    IterationCapReached,
    Cancelled,
}

impl RunStatus {
    /// Converged and partially converged runs carry usable fields.
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Converged | RunStatus::PartialConverged(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Converged => "converged",
            RunStatus::PartialConverged(PartialReason::Stagnation) => "partial (stagnation)",
            RunStatus::PartialConverged(PartialReason::IterationCap) => "partial (iteration cap)",
            RunStatus::Diverged => "diverged",
            RunStatus::IterationCapReached => "iteration cap reached",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

/// Periodic progress sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationReport {
    pub iteration: usize,
    pub max_diff_u: Real,
    pub max_diff_w: Real,
}

/// Outcome of [`ConvergenceController::run`].
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub status: RunStatus,
    pub iterations: usize,
    /// Largest psi change in the last iteration.
    pub max_diff_u: Real,
    /// Largest vorticity change in the last iteration.
    pub max_diff_w: Real,
    pub effective_tolerance: Real,
    pub mesh_reynolds: Real,
    pub elapsed: Duration,
}

/// Shared flag used to stop a run from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counts consecutive iterations whose vorticity delta did not move.
#[derive(Clone, Debug)]
pub struct StagnationTracker {
    last: Option<Real>,
    count: usize,
    patience: usize,
    epsilon: Real,
}

impl StagnationTracker {
    pub fn new(patience: usize, epsilon: Real) -> Self {
        Self {
            last: None,
            count: 0,
            patience,
            epsilon,
        }
    }

    /// Record a delta; true once more than `patience` consecutive deltas
    /// matched their predecessor.
    pub fn observe(&mut self, max_diff_w: Real) -> bool {
        match self.last {
            Some(prev) if (max_diff_w - prev).abs() < self.epsilon => self.count += 1,
            _ => self.count = 0,
        }
        self.last = Some(max_diff_w);
        self.count > self.patience
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Drives boundary enforcement and relaxation until a terminal status.
#[derive(Clone, Debug)]
pub struct ConvergenceController {
    domain: Domain,
    params: SimParams,
    cancel: Option<CancelToken>,
    deadline: Option<Duration>,
}

impl ConvergenceController {
    pub fn new(domain: Domain, params: SimParams) -> Self {
        Self {
            domain,
            params,
            cancel: None,
            deadline: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Wall-clock budget, checked once per iteration.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn run(&self, state: &mut FlowState) -> RunReport {
        self.run_with_progress(state, None)
    }

    /// Relax `state` in place. `progress` is called every report interval.
    pub fn run_with_progress(
        &self,
        state: &mut FlowState,
        mut progress: Option<&mut dyn FnMut(IterationReport)>,
    ) -> RunReport {
        let p = &self.params;
        let domain = &self.domain;
        let regime = &p.regime;
        let eff_tol = p.effective_tolerance;
        let enforcer = BoundaryEnforcer::new(p);
        let relaxation = Relaxation::new(p);
        let mut previous = state.clone();
        let mut stagnation = StagnationTracker::new(regime.stagnation_patience, p.stagnation_epsilon);
        let start = Instant::now();

        tracing::info!(
            model = p.model.as_str(),
            mesh_reynolds = p.mesh_reynolds,
            omega = p.omega,
            effective_tolerance = eff_tol,
            max_iterations = p.max_iterations,
            "starting relaxation"
        );

        let mut max_diff_u = Real::INFINITY;
        let mut max_diff_w = Real::INFINITY;
        let mut iter = 0;
        let status = loop {
            if self.interrupted(start) {
                tracing::warn!(iteration = iter, "run cancelled");
                break RunStatus::Cancelled;
            }

            enforcer.apply(domain, state);
            previous.stream.copy_from(&state.stream);
            previous.vorticity.copy_from(&state.vorticity);

            relaxation.step(domain, state);
            if p.reenforce_after_sweep {
                enforcer.apply(domain, state);
            }

            (max_diff_u, max_diff_w) = self.max_changes(state, &previous);
            iter += 1;

            if iter % regime.report_interval == 0 {
                tracing::info!(iteration = iter, max_diff_u, max_diff_w, "progress");
                if let Some(cb) = progress.as_mut() {
                    cb(IterationReport {
                        iteration: iter,
                        max_diff_u,
                        max_diff_w,
                    });
                }
            }

            if max_diff_u.is_nan()
                || max_diff_w.is_nan()
                || max_diff_u > regime.divergence_threshold
                || max_diff_w > regime.divergence_threshold
            {
                tracing::warn!(iteration = iter, max_diff_u, max_diff_w, "relaxation diverged");
                break RunStatus::Diverged;
            }

            if max_diff_u < eff_tol && max_diff_w < eff_tol {
                break RunStatus::Converged;
            }

            if max_diff_u < eff_tol && iter > p.stagnation_floor && stagnation.observe(max_diff_w) {
                tracing::warn!(
                    iteration = iter,
                    max_diff_w,
                    "stream function converged, vorticity stagnant; accepting partial solution"
                );
                break RunStatus::PartialConverged(PartialReason::Stagnation);
            }

            if iter >= p.max_iterations {
                let acceptance = eff_tol * regime.acceptance_multiplier;
                if max_diff_u < acceptance {
                    tracing::warn!(
                        iteration = iter,
                        max_diff_u,
                        acceptance,
                        "iteration cap reached; accepting partial solution"
                    );
                    break RunStatus::PartialConverged(PartialReason::IterationCap);
                }
                tracing::warn!(iteration = iter, max_diff_u, max_diff_w, "iteration cap reached");
                break RunStatus::IterationCapReached;
            }
        };

        let report = RunReport {
            status,
            iterations: iter,
            max_diff_u,
            max_diff_w,
            effective_tolerance: eff_tol,
            mesh_reynolds: p.mesh_reynolds,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            status = report.status.as_str(),
            iterations = report.iterations,
            max_diff_u,
            max_diff_w,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "relaxation finished"
        );
        report
    }

    fn interrupted(&self, start: Instant) -> bool {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return true;
        }
        self.deadline.is_some_and(|d| start.elapsed() >= d)
    }

    fn max_changes(&self, state: &FlowState, previous: &FlowState) -> (Real, Real) {
        match self.params.sweep {
            SweepMode::GaussSeidel => max_changes(&self.domain, state, previous),
            SweepMode::RedBlack => max_changes_par(&self.domain, state, previous),
        }
    }
}

/// Largest absolute change of psi and vorticity over the fluid interior.
/// A NaN anywhere yields NaN.
pub fn max_changes(domain: &Domain, state: &FlowState, previous: &FlowState) -> (Real, Real) {
    domain.fluid_interior().fold((0.0, 0.0), |(du, dw), (i, j)| {
        (
            nan_max(du, (state.stream[(i, j)] - previous.stream[(i, j)]).abs()),
            nan_max(dw, (state.vorticity[(i, j)] - previous.vorticity[(i, j)]).abs()),
        )
    })
}

/// Parallel form of [`max_changes`], reducing one row per task.
pub fn max_changes_par(domain: &Domain, state: &FlowState, previous: &FlowState) -> (Real, Real) {
    let ny = domain.ny();
    (1..domain.nx())
        .into_par_iter()
        .map(|i| {
            (1..ny)
                .filter(|&j| !domain.is_solid(i, j))
                .fold((0.0, 0.0), |(du, dw), j| {
                    (
                        nan_max(du, (state.stream[(i, j)] - previous.stream[(i, j)]).abs()),
                        nan_max(dw, (state.vorticity[(i, j)] - previous.vorticity[(i, j)]).abs()),
                    )
                })
        })
        .reduce(|| (0.0, 0.0), |a, b| (nan_max(a.0, b.0), nan_max(a.1, b.1)))
}

/// Final fields and report of a standalone run.
#[derive(Clone, Debug)]
pub struct Solution {
    pub state: FlowState,
    pub params: SimParams,
    pub report: RunReport,
}

/// Configure, initialise with the free-stream guess and relax.
pub fn solve(domain: &Domain, config: &SimConfig) -> SolverResult<Solution> {
    solve_with_progress(domain, config, None)
}

pub fn solve_with_progress(
    domain: &Domain,
    config: &SimConfig,
    progress: Option<&mut dyn FnMut(IterationReport)>,
) -> SolverResult<Solution> {
    let params = SimParams::from_config(config)?;
    let mut state = FlowState::new(domain);
    BoundaryEnforcer::new(&params).initialize(domain, &mut state);
    let report = ConvergenceController::new(*domain, params).run_with_progress(&mut state, progress);
    Ok(Solution {
        state,
        params,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Obstacle;

    fn domain() -> Domain {
        Domain::new(
            30,
            12,
            Obstacle {
                start: 6,
                length: 4,
                height: 4,
            },
        )
        .unwrap()
    }

    #[test]
    fn stagnation_requires_more_than_patience_repeats() {
        let mut t = StagnationTracker::new(3, 1e-15);
        assert!(!t.observe(0.5));
        assert!(!t.observe(0.5));
        assert!(!t.observe(0.5));
        assert!(!t.observe(0.5));
        assert_eq!(t.count(), 3);
        assert!(t.observe(0.5));
    }

    #[test]
    fn stagnation_resets_on_movement() {
        let mut t = StagnationTracker::new(1, 1e-15);
        t.observe(0.5);
        t.observe(0.5);
        assert_eq!(t.count(), 1);
        t.observe(0.4);
        assert_eq!(t.count(), 0);
    }

    #[test]
    fn max_changes_ignore_obstacle_and_propagate_nan() {
        let d = domain();
        let prev = FlowState::new(&d);
        let mut cur = prev.clone();
        cur.stream[(8, 2)] = 100.0;
        cur.vorticity[(15, 5)] = -0.25;
        cur.stream[(20, 6)] = 0.5;
        assert_eq!(max_changes(&d, &cur, &prev), (0.5, 0.25));
        assert_eq!(max_changes_par(&d, &cur, &prev), (0.5, 0.25));

        cur.vorticity[(3, 3)] = f64::NAN;
        assert!(max_changes(&d, &cur, &prev).1.is_nan());
        assert!(max_changes_par(&d, &cur, &prev).1.is_nan());
    }

    #[test]
    fn status_success_flags() {
        assert!(RunStatus::Converged.is_success());
        assert!(RunStatus::PartialConverged(PartialReason::Stagnation).is_success());
        assert!(RunStatus::PartialConverged(PartialReason::IterationCap).is_success());
        assert!(!RunStatus::Diverged.is_success());
        assert!(!RunStatus::IterationCapReached.is_success());
        assert!(!RunStatus::Cancelled.is_success());
    }

    #[test]
    fn cancelled_token_stops_before_first_iteration() {
        let d = domain();
        let params = SimParams::from_config(&SimConfig::viscous(0.5)).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let mut state = FlowState::new(&d);
        let report = ConvergenceController::new(d, params)
            .with_cancel(token)
            .run(&mut state);
        assert_eq!(report.status, RunStatus::Cancelled);
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn zero_deadline_cancels() {
        let d = domain();
        let params = SimParams::from_config(&SimConfig::viscous(0.5)).unwrap();
        let mut state = FlowState::new(&d);
        let report = ConvergenceController::new(d, params)
            .with_deadline(Duration::ZERO)
            .run(&mut state);
        assert_eq!(report.status, RunStatus::Cancelled);
    }

    #[test]
    fn cap_with_large_residual_is_a_failure() {
        let d = domain();
        let cfg = SimConfig {
            max_iterations: 3,
            ..SimConfig::viscous(0.5)
        };
        let solution = solve(&d, &cfg).unwrap();
        // the first sweeps move psi by far more than 1e-8 * 1000
        assert_eq!(solution.report.status, RunStatus::IterationCapReached);
        assert_eq!(solution.report.iterations, 3);
    }

    #[test]
    fn cap_within_acceptance_is_partial() {
        let d = domain();
        let cfg = SimConfig {
            max_iterations: 3,
            tolerance: 10.0,
            ..SimConfig::viscous(0.5)
        };
        // loose enough that the first iteration already converges
        let solution = solve(&d, &cfg).unwrap();
        assert_eq!(solution.report.status, RunStatus::Converged);

        let cfg = SimConfig {
            max_iterations: 2,
            tolerance: 1e-2,
            ..SimConfig::viscous(0.5)
        };
        let solution = solve(&d, &cfg).unwrap();
        assert_eq!(
            solution.report.status,
            RunStatus::PartialConverged(PartialReason::IterationCap)
        );
    }

    #[test]
    fn progress_callback_fires_on_report_interval() {
        let d = domain();
        let cfg = SimConfig {
            max_iterations: 10_000,
            ..SimConfig::viscous(0.5)
        };
        let mut seen = Vec::new();
        let mut cb = |r: IterationReport| seen.push(r.iteration);
        let solution = solve_with_progress(&d, &cfg, Some(&mut cb)).unwrap();
        let expected: Vec<usize> = (1..=solution.report.iterations / 5000).map(|k| k * 5000).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn diverging_omega_is_flagged() {
        let d = domain();
        let cfg = SimConfig {
            omega: Some(2.5),
            max_iterations: 5000,
            ..SimConfig::viscous(0.5)
        };
        let solution = solve(&d, &cfg).unwrap();
        assert_eq!(solution.report.status, RunStatus::Diverged);
    }
}
