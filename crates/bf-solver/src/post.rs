//! Post-processing of a relaxed state: normalisation and velocity recovery.

use crate::field::Field;
use crate::geometry::Domain;
use crate::params::FlowModel;
use bf_core::{Real, nan_max};
use serde::{Deserialize, Serialize};

/// Divide psi by `v0*h` in place.
pub fn normalize(stream: &mut Field, v0: Real, h: Real) {
    stream.scale_mut(1.0 / (v0 * h));
}

/// Inverse of [`normalize`].
pub fn denormalize(stream: &mut Field, v0: Real, h: Real) {
    stream.scale_mut(v0 * h);
}

/// Sampling window and scaling of [`velocity_field`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VelocityOptions {
    /// Cells closer than this to the domain edge are skipped.
    pub margin: usize,
    /// Scale components by the largest magnitude (direction plot).
    pub normalize_by_max: bool,
}

impl VelocityOptions {
    pub fn for_model(model: FlowModel) -> Self {
        match model {
            FlowModel::PotentialFlow => Self {
                margin: 2,
                normalize_by_max: true,
            },
            FlowModel::ViscousVorticity => Self {
                margin: 1,
                normalize_by_max: false,
            },
        }
    }
}

impl Default for VelocityOptions {
    fn default() -> Self {
        Self::for_model(FlowModel::ViscousVorticity)
    }
}

/// Velocity recovered at one fluid node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VelocitySample {
    pub i: usize,
    pub j: usize,
    /// `i*h`
    pub x: Real,
    /// `j*h`
    pub y: Real,
    pub vx: Real,
    pub vy: Real,
    pub magnitude: Real,
}

/// Max magnitudes below this are not used for scaling.
const MIN_SCALE: Real = 1e-8;

/// Central differences `vx = dpsi/dy`, `vy = -dpsi/dx` at every fluid node
/// inside the margin window, `i` outer.
pub fn velocity_field(
    stream: &Field,
    domain: &Domain,
    h: Real,
    options: VelocityOptions,
) -> Vec<VelocitySample> {
    let m = options.margin.max(1);
    let (nx, ny) = (domain.nx(), domain.ny());
    let inv_2h = 1.0 / (2.0 * h);

    let mut samples = Vec::new();
    for i in m..nx.saturating_sub(m) {
        for j in m..ny.saturating_sub(m) {
            if domain.is_solid(i, j) {
                continue;
            }
            let vx = (stream[(i, j + 1)] - stream[(i, j - 1)]) * inv_2h;
            let vy = -(stream[(i + 1, j)] - stream[(i - 1, j)]) * inv_2h;
            samples.push(VelocitySample {
                i,
                j,
                x: i as Real * h,
                y: j as Real * h,
                vx,
                vy,
                magnitude: vx.hypot(vy),
            });
        }
    }

    if options.normalize_by_max {
        let max_mag = samples.iter().fold(0.0, |acc, s| nan_max(acc, s.magnitude));
        if max_mag > MIN_SCALE {
            for s in &mut samples {
                s.vx /= max_mag;
                s.vy /= max_mag;
                s.magnitude /= max_mag;
            }
        }
    }
    samples
}
