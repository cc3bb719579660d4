//! Run configuration and the parameters derived from it.

use crate::error::{SolverError, SolverResult};
use crate::regime::{RegimeParams, RegimeTable};
use bf_core::units::{Length, Velocity, kinematic_viscosity_for, unitless};
use bf_core::{Real, ensure_positive};
use serde::{Deserialize, Serialize};
use uom::si::length::meter;
use uom::si::velocity::meter_per_second;

/// Which equations are relaxed.
///
/// Only the boundary treatment and the vorticity sweep differ between the
/// two; the iteration loop is shared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowModel {
    /// Irrotational flow: Laplace equation for psi, vorticity stays zero.
    PotentialFlow,
    /// Coupled stream-function / vorticity-transport equations.
    #[default]
    ViscousVorticity,
}

impl FlowModel {
    pub fn has_vorticity(&self) -> bool {
        matches!(self, FlowModel::ViscousVorticity)
    }

    pub fn default_free_surface(&self) -> FreeSurface {
        match self {
            FlowModel::PotentialFlow => FreeSurface::Pinned,
            FlowModel::ViscousVorticity => FreeSurface::Extrapolate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowModel::PotentialFlow => "potential_flow",
            FlowModel::ViscousVorticity => "viscous_vorticity",
        }
    }
}

/// Stream-function condition on the top row `j = ny`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeSurface {
    /// `psi[i][ny] = psi[i][ny-1] + v0*h`
    Extrapolate,
    /// `psi[i][ny] = ny*v0`
    Pinned,
}

/// Update order of the stream-function sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// Lexicographic in-place sweep, `i` outer, `j` inner.
    #[default]
    GaussSeidel,
    /// Two-colour sweep, each colour updated in parallel.
    RedBlack,
}

/// How the kinematic viscosity is specified.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viscosity {
    /// Target mesh Reynolds number; nu = v0*h/Re.
    Reynolds(Real),
    /// Kinematic viscosity in m^2/s.
    Kinematic(Real),
}

/// User-facing configuration of a single run.
#[derive(Clone, Debug)]
pub struct SimConfig {
    pub spacing: Length,
    pub inlet_velocity: Velocity,
    pub viscosity: Viscosity,
    pub model: FlowModel,
    /// Defaults to the model's own condition.
    pub free_surface: Option<FreeSurface>,
    /// Overrides the regime table's relaxation factor.
    pub omega: Option<Real>,
    pub tolerance: Real,
    pub max_iterations: usize,
    pub sweep: SweepMode,
    /// Iterations that must pass before stagnation may end a run.
    pub stagnation_floor: usize,
    /// Two vorticity deltas closer than this count as unchanged.
    pub stagnation_epsilon: Real,
    /// Defaults to `true` for the viscous model.
    pub reenforce_after_sweep: Option<bool>,
    pub regimes: RegimeTable,
}

impl SimConfig {
    /// Reference configuration for a viscous run at the given Reynolds number.
    pub fn viscous(reynolds: Real) -> Self {
        Self {
            spacing: bf_core::m(1.0),
            inlet_velocity: bf_core::mps(1.0),
            viscosity: Viscosity::Reynolds(reynolds),
            model: FlowModel::ViscousVorticity,
            free_surface: None,
            omega: None,
            tolerance: 1e-8,
            max_iterations: 350_000,
            sweep: SweepMode::GaussSeidel,
            stagnation_floor: 50_000,
            stagnation_epsilon: 1e-15,
            reenforce_after_sweep: None,
            regimes: RegimeTable::default(),
        }
    }

    /// Reference configuration for the potential-flow model.
    pub fn potential() -> Self {
        Self {
            model: FlowModel::PotentialFlow,
            omega: Some(0.1),
            tolerance: 1e-5,
            ..Self::viscous(0.5)
        }
    }
}

/// Numeric parameters of a run, derived once from [`SimConfig`].
#[derive(Clone, Copy, Debug)]
pub struct SimParams {
    /// Grid spacing.
    pub h: Real,
    /// Inlet velocity.
    pub v0: Real,
    /// Kinematic viscosity.
    pub nu: Real,
    /// `v0*h/nu`
    pub mesh_reynolds: Real,
    pub omega: Real,
    pub tolerance: Real,
    /// `tolerance` scaled by the regime's multiplier.
    pub effective_tolerance: Real,
    pub max_iterations: usize,
    pub model: FlowModel,
    pub free_surface: FreeSurface,
    pub sweep: SweepMode,
    pub reenforce_after_sweep: bool,
    pub stagnation_floor: usize,
    pub stagnation_epsilon: Real,
    pub regime: RegimeParams,
}

impl SimParams {
    pub fn from_config(cfg: &SimConfig) -> SolverResult<Self> {
        let h = ensure_positive(cfg.spacing.get::<meter>(), "grid spacing")?;
        let v0 = ensure_positive(cfg.inlet_velocity.get::<meter_per_second>(), "inlet velocity")?;
        let nu = match cfg.viscosity {
            Viscosity::Reynolds(re) => {
                let re = ensure_positive(re, "Reynolds number")?;
                kinematic_viscosity_for(cfg.inlet_velocity, cfg.spacing, unitless(re))
            }
            Viscosity::Kinematic(nu) => nu,
        };
        let nu = ensure_positive(nu, "kinematic viscosity")?;
        let mesh_reynolds = v0 * h / nu;

        let tolerance = ensure_positive(cfg.tolerance, "tolerance")?;
        if cfg.max_iterations == 0 {
            return Err(SolverError::Config {
                what: "max_iterations must be positive".to_string(),
            });
        }
        let stagnation_epsilon = ensure_positive(cfg.stagnation_epsilon, "stagnation epsilon")?;

        let regime = *cfg.regimes.lookup(mesh_reynolds)?;
        let omega = match cfg.omega {
            Some(w) => ensure_positive(w, "relaxation factor")?,
            None => regime.omega,
        };
        tracing::debug!(
            mesh_reynolds,
            omega,
            stability_factor = regime.stability_factor,
            tolerance_multiplier = regime.tolerance_multiplier,
            "regime selected"
        );

        Ok(Self {
            h,
            v0,
            nu,
            mesh_reynolds,
            omega,
            tolerance,
            effective_tolerance: tolerance * regime.tolerance_multiplier,
            max_iterations: cfg.max_iterations,
            model: cfg.model,
            free_surface: cfg.free_surface.unwrap_or(cfg.model.default_free_surface()),
            sweep: cfg.sweep,
            reenforce_after_sweep: cfg
                .reenforce_after_sweep
                .unwrap_or(cfg.model.has_vorticity()),
            stagnation_floor: cfg.stagnation_floor,
            stagnation_epsilon,
            regime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viscosity_is_derived_from_reynolds() {
        let p = SimParams::from_config(&SimConfig::viscous(0.5)).unwrap();
        assert!((p.nu - 2.0).abs() < 1e-12);
        assert!((p.mesh_reynolds - 0.5).abs() < 1e-12);
        assert_eq!(p.omega, 0.1);
        assert_eq!(p.effective_tolerance, 1e-8);
        assert!(p.reenforce_after_sweep);
        assert_eq!(p.free_surface, FreeSurface::Extrapolate);
    }

    #[test]
    fn explicit_omega_overrides_table() {
        let cfg = SimConfig {
            omega: Some(0.05),
            ..SimConfig::viscous(5.0)
        };
        let p = SimParams::from_config(&cfg).unwrap();
        assert_eq!(p.omega, 0.05);
        assert!((p.effective_tolerance - 2e-6).abs() < 1e-18);
    }

    #[test]
    fn kinematic_viscosity_sets_mesh_reynolds() {
        let cfg = SimConfig {
            viscosity: Viscosity::Kinematic(1.0),
            ..SimConfig::viscous(0.5)
        };
        let p = SimParams::from_config(&cfg).unwrap();
        assert_eq!(p.mesh_reynolds, 1.0);
        assert_eq!(p.omega, 0.08);
    }

    #[test]
    fn non_positive_inputs_fail_fast() {
        let bad_h = SimConfig {
            spacing: bf_core::m(0.0),
            ..SimConfig::viscous(0.5)
        };
        assert!(SimParams::from_config(&bad_h).is_err());

        let bad_nu = SimConfig {
            viscosity: Viscosity::Kinematic(-1.0),
            ..SimConfig::viscous(0.5)
        };
        assert!(SimParams::from_config(&bad_nu).is_err());

        let bad_cap = SimConfig {
            max_iterations: 0,
            ..SimConfig::viscous(0.5)
        };
        assert!(SimParams::from_config(&bad_cap).is_err());
    }

    #[test]
    fn potential_defaults_pin_free_surface() {
        let p = SimParams::from_config(&SimConfig::potential()).unwrap();
        assert_eq!(p.free_surface, FreeSurface::Pinned);
        assert!(!p.reenforce_after_sweep);
        assert_eq!(p.omega, 0.1);
    }
}
