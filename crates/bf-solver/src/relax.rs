//! SOR sweeps over the fluid interior.

use crate::field::{Field, FlowState};
use crate::geometry::Domain;
use crate::params::{SimParams, SweepMode};
use bf_core::Real;
use rayon::prelude::*;

/// One relaxation step: psi sweep followed (viscous model) by the vorticity sweep.
#[derive(Clone, Copy, Debug)]
pub struct Relaxation {
    omega: Real,
    h2: Real,
    mesh_reynolds: Real,
    stability_factor: Real,
    sweep: SweepMode,
    vorticity: bool,
}

impl Relaxation {
    pub fn new(params: &SimParams) -> Self {
        Self {
            omega: params.omega,
            h2: params.h * params.h,
            mesh_reynolds: params.mesh_reynolds,
            stability_factor: params.regime.stability_factor,
            sweep: params.sweep,
            vorticity: params.model.has_vorticity(),
        }
    }

    pub fn step(&self, domain: &Domain, state: &mut FlowState) {
        self.sweep_stream(domain, state);
        if self.vorticity {
            self.sweep_vorticity(domain, state);
        }
    }

    /// `psi += omega * ((psiE + psiW + psiN + psiS + h^2*w)/4 - psi)`
    pub fn sweep_stream(&self, domain: &Domain, state: &mut FlowState) {
        match self.sweep {
            SweepMode::GaussSeidel => self.stream_gauss_seidel(domain, state),
            SweepMode::RedBlack => {
                self.stream_colour(domain, state, 0);
                self.stream_colour(domain, state, 1);
            }
        }
    }

    fn stream_gauss_seidel(&self, domain: &Domain, state: &mut FlowState) {
        let FlowState { stream: u, vorticity: w } = state;
        for i in 1..domain.nx() {
            for j in 1..domain.ny() {
                if domain.is_solid(i, j) {
                    continue;
                }
                u[(i, j)] += self.omega * (self.stream_target(u, w, i, j) - u[(i, j)]);
            }
        }
    }

    /// Update every cell with `(i + j) % 2 == colour`. Cells of one colour only
    /// read the other colour, so they are computed in parallel from the current
    /// field and then written back.
    fn stream_colour(&self, domain: &Domain, state: &mut FlowState, colour: usize) {
        let (nx, ny) = (domain.nx(), domain.ny());
        let updates: Vec<(usize, usize, Real)> = {
            let u = &state.stream;
            let w = &state.vorticity;
            (1..nx)
                .into_par_iter()
                .flat_map_iter(|i| {
                    let first = if (i + 1) % 2 == colour { 1 } else { 2 };
                    (first..ny)
                        .step_by(2)
                        .filter(move |&j| !domain.is_solid(i, j))
                        .map(move |j| {
                            let next = u[(i, j)] + self.omega * (self.stream_target(u, w, i, j) - u[(i, j)]);
                            (i, j, next)
                        })
                })
                .collect()
        };
        for (i, j, v) in updates {
            state.stream[(i, j)] = v;
        }
    }

    #[inline]
    fn stream_target(&self, u: &Field, w: &Field, i: usize, j: usize) -> Real {
        0.25 * (u[(i + 1, j)] + u[(i - 1, j)] + u[(i, j + 1)] + u[(i, j - 1)] + self.h2 * w[(i, j)])
    }

    /// Vorticity transport. Cells on the first and last interior ring use the
    /// diffusion-only update; elsewhere the convective term is damped by the
    /// regime's stability factor.
    pub fn sweep_vorticity(&self, domain: &Domain, state: &mut FlowState) {
        let (nx, ny) = (domain.nx(), domain.ny());
        let FlowState { stream: u, vorticity: w } = state;
        let convective = self.stability_factor * self.mesh_reynolds / 4.0;

        for i in 1..nx {
            for j in 1..ny {
                if domain.is_solid(i, j) {
                    continue;
                }
                let sum = w[(i + 1, j)] + w[(i - 1, j)] + w[(i, j + 1)] + w[(i, j - 1)];
                let target = if i == 1 || i == nx - 1 || j == 1 || j == ny - 1 {
                    0.25 * sum
                } else {
                    let a2 = (u[(i, j + 1)] - u[(i, j - 1)]) * (w[(i + 1, j)] - w[(i - 1, j)]);
                    let a3 = (u[(i + 1, j)] - u[(i - 1, j)]) * (w[(i, j + 1)] - w[(i, j - 1)]);
                    0.25 * (sum - convective * (a2 - a3))
                };
                w[(i, j)] += self.omega * (target - w[(i, j)]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryEnforcer;
    use crate::geometry::Obstacle;
    use crate::params::SimConfig;

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

    fn params(sweep: SweepMode) -> SimParams {
        let mut p = SimParams::from_config(&SimConfig::viscous(0.5)).unwrap();
        p.sweep = sweep;
        p
    }

    #[test]
    fn linear_stream_is_a_fixed_point() {
        // psi = j is harmonic and w = 0, so every update is zero
        let open = Domain::new(
            30,
            12,
            Obstacle {
                start: 2,
                length: 0,
                height: 0,
            },
        )
        .unwrap();
        for sweep in [SweepMode::GaussSeidel, SweepMode::RedBlack] {
            let mut s = FlowState::new(&open);
            s.stream = Field::from_fn(30, 12, |_, j| j as f64);
            let before = s.stream.clone();
            Relaxation::new(&params(sweep)).sweep_stream(&open, &mut s);
            assert_eq!(s.stream, before);
        }
    }

    #[test]
    fn obstacle_cells_are_skipped() {
        let d = domain();
        for sweep in [SweepMode::GaussSeidel, SweepMode::RedBlack] {
            let mut s = FlowState::new(&d);
            s.stream = Field::from_fn(30, 12, |i, j| if d.is_solid(i, j) { 0.0 } else { j as f64 });
            Relaxation::new(&params(sweep)).step(&d, &mut s);
            assert_eq!(s.stream[(8, 2)], 0.0);
            assert_eq!(s.vorticity[(8, 2)], 0.0);
        }
    }

    #[test]
    fn red_black_reaches_the_gauss_seidel_solution() {
        let d = domain();
        let mut p_gs = SimParams::from_config(&SimConfig::potential()).unwrap();
        p_gs.omega = 1.0;
        let p_rb = SimParams {
            sweep: SweepMode::RedBlack,
            ..p_gs
        };
        let enforcer = BoundaryEnforcer::new(&p_gs);

        let mut a = FlowState::new(&d);
        enforcer.initialize(&d, &mut a);
        let mut b = a.clone();
        for _ in 0..4000 {
            Relaxation::new(&p_gs).sweep_stream(&d, &mut a);
            enforcer.apply(&d, &mut a);
            Relaxation::new(&p_rb).sweep_stream(&d, &mut b);
            enforcer.apply(&d, &mut b);
        }
        for (x, y) in a.stream.as_matrix().iter().zip(b.stream.as_matrix().iter()) {
            assert!((x - y).abs() < 1e-6, "{x} vs {y}");
        }
    }

    #[test]
    fn vorticity_sweep_relaxes_spike_towards_neighbours() {
        let d = domain();
        let p = params(SweepMode::GaussSeidel);
        let mut s = FlowState::new(&d);
        s.vorticity[(20, 8)] = 1.0;
        Relaxation::new(&p).sweep_vorticity(&d, &mut s);
        let w = s.vorticity[(20, 8)];
        assert!(w < 1.0 && w > 0.9, "{w}");
        assert!(s.vorticity[(21, 8)] > 0.0);
        assert!(s.vorticity[(19, 8)] > 0.0);
    }

    #[test]
    fn potential_step_keeps_vorticity_zero() {
        let d = domain();
        let p = SimParams::from_config(&SimConfig::potential()).unwrap();
        let mut s = FlowState::new(&d);
        BoundaryEnforcer::new(&p).initialize(&d, &mut s);
        Relaxation::new(&p).step(&d, &mut s);
        assert!(s.vorticity.as_matrix().iter().all(|&w| w == 0.0));
    }
}
