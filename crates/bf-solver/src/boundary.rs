//! Boundary conditions on the channel edges and on the obstacle surface.

use crate::field::{Field, FlowState};
use crate::geometry::Domain;
use crate::params::{FlowModel, FreeSurface, SimParams};
use crate::regime::{CornerBlend, CornerSmoothing};
use bf_core::Real;

/// Imposes every boundary condition of the selected [`FlowModel`] on a state.
#[derive(Clone, Copy, Debug)]
pub struct BoundaryEnforcer {
    model: FlowModel,
    free_surface: FreeSurface,
    h: Real,
    v0: Real,
    corner_blend: CornerBlend,
    corner_smoothing: Option<CornerSmoothing>,
}

impl BoundaryEnforcer {
    pub fn new(params: &SimParams) -> Self {
        Self {
            model: params.model,
            free_surface: params.free_surface,
            h: params.h,
            v0: params.v0,
            corner_blend: params.regime.corner_blend,
            corner_smoothing: params.regime.corner_smoothing,
        }
    }

    /// Free-stream initial guess: `psi = j*v0` in the fluid, zero in the
    /// obstacle, zero vorticity everywhere; then all conditions applied.
    pub fn initialize(&self, domain: &Domain, state: &mut FlowState) {
        let v0 = self.v0;
        state.stream = Field::from_fn(domain.nx(), domain.ny(), |i, j| {
            if domain.is_solid(i, j) { 0.0 } else { j as Real * v0 }
        });
        state.vorticity.fill(0.0);
        self.apply(domain, state);
    }

    /// Apply edge, obstacle, no-slip and corner conditions in place.
    ///
    /// psi edges are settled first so every wall-vorticity estimate reads
    /// final psi values; the outlet vorticity copy runs last for the same
    /// reason. Without corner smoothing a second call changes nothing.
    pub fn apply(&self, domain: &Domain, state: &mut FlowState) {
        self.apply_stream_edges(domain, &mut state.stream);
        self.apply_vorticity_edges(domain, &mut state.vorticity);
        self.pin_obstacle(domain, state);
        if self.model.has_vorticity() {
            self.apply_no_slip(domain, state);
            self.apply_corners(domain, state);
        }
        let (nx, ny) = (domain.nx(), domain.ny());
        for j in 1..ny {
            state.vorticity[(nx, j)] = state.vorticity[(nx - 1, j)];
        }
    }

    fn apply_stream_edges(&self, domain: &Domain, psi: &mut Field) {
        let (nx, ny) = (domain.nx(), domain.ny());

        // Outlet
        for j in 1..ny {
            psi[(nx, j)] = psi[(nx - 1, j)];
        }

        // Free surface
        for i in 0..=nx {
            if domain.is_solid(i, ny) {
                continue;
            }
            psi[(i, ny)] = match self.free_surface {
                FreeSurface::Extrapolate => psi[(i, ny - 1)] + self.v0 * self.h,
                FreeSurface::Pinned => ny as Real * self.v0,
            };
        }

        // Inlet
        for j in 0..=ny {
            psi[(0, j)] = j as Real * self.v0;
            if self.model.has_vorticity() {
                psi[(1, j)] = psi[(0, j)];
            }
        }

        // Centerline
        for i in 0..=nx {
            if !domain.is_solid(i, 0) {
                psi[(i, 0)] = 0.0;
            }
        }
    }

    fn apply_vorticity_edges(&self, domain: &Domain, w: &mut Field) {
        let (nx, ny) = (domain.nx(), domain.ny());
        if self.model.has_vorticity() {
            for i in 0..=nx {
                w[(i, ny - 1)] = 0.0;
            }
            for j in 0..=ny {
                w[(0, j)] = 0.0;
            }
        }
        for i in 0..=nx {
            if !domain.is_solid(i, 0) {
                w[(i, 0)] = 0.0;
            }
        }
    }

    fn pin_obstacle(&self, domain: &Domain, state: &mut FlowState) {
        let o = domain.obstacle();
        for i in o.start..=o.end() {
            for j in 0..=o.height {
                state.stream[(i, j)] = 0.0;
                state.vorticity[(i, j)] = 0.0;
            }
        }
    }

    /// Wall vorticity `-2*psi/h^2` on the fluid cells hugging each face,
    /// taken from psi one cell further out.
    fn apply_no_slip(&self, domain: &Domain, state: &mut FlowState) {
        let o = domain.obstacle();
        let ny = domain.ny();
        let inv_h2 = 1.0 / (self.h * self.h);
        let FlowState { stream, vorticity } = state;

        for j in 1..=o.height.min(ny - 1) {
            vorticity[(o.start - 1, j)] = -2.0 * stream[(o.start - 2, j)] * inv_h2;
            vorticity[(o.end() + 1, j)] = -2.0 * stream[(o.end() + 2, j)] * inv_h2;
        }
        for i in o.start..=o.end() {
            vorticity[(i, o.height + 1)] = -2.0 * stream[(i, o.height + 2)] * inv_h2;
        }
    }

    fn apply_corners(&self, domain: &Domain, state: &mut FlowState) {
        let o = domain.obstacle();
        let inv_h2 = 1.0 / (self.h * self.h);
        let jc = o.height + 1;
        // (corner column, column one further out)
        let corners = [(o.start - 1, o.start - 2), (o.end() + 1, o.end() + 2)];

        for (ic, i_out) in corners {
            let from_vertical = -2.0 * state.stream[(i_out, jc)] * inv_h2;
            let from_horizontal = -2.0 * state.stream[(ic, jc + 1)] * inv_h2;
            state.vorticity[(ic, jc)] = self.corner_blend.blend(from_vertical, from_horizontal);
        }

        if let Some(smoothing) = self.corner_smoothing {
            for (ic, _) in corners {
                smooth_around(domain, &mut state.vorticity, ic, jc, smoothing);
            }
        }
    }
}

/// Re-average spikes in the 3x3 block centred on `(ic, jc)` against their
/// fluid neighbours.
fn smooth_around(domain: &Domain, w: &mut Field, ic: usize, jc: usize, s: CornerSmoothing) {
    let (nx, ny) = (domain.nx() as isize, domain.ny() as isize);
    let fluid = |i: isize, j: isize| {
        i >= 0 && i <= nx && j >= 0 && j <= ny && !domain.is_solid(i as usize, j as usize)
    };

    for di in -1..=1 {
        for dj in -1..=1 {
            let ii = ic as isize + di;
            let jj = jc as isize + dj;
            if ii <= 0 || ii >= nx || jj <= 0 || jj >= ny || !fluid(ii, jj) {
                continue;
            }
            let (iu, ju) = (ii as usize, jj as usize);
            if w[(iu, ju)].abs() <= s.spike_threshold {
                continue;
            }

            let mut sum = 0.0;
            let mut count = 0usize;
            for ddi in -1..=1 {
                for ddj in -1..=1 {
                    if ddi == 0 && ddj == 0 {
                        continue;
                    }
                    let (ni, nj) = (ii + ddi, jj + ddj);
                    if fluid(ni, nj) {
                        sum += w[(ni as usize, nj as usize)];
                        count += 1;
                    }
                }
            }
            if count > 0 {
                w[(iu, ju)] = s.keep_weight * w[(iu, ju)] + (1.0 - s.keep_weight) * (sum / count as Real);
            }
        }
    }
}
