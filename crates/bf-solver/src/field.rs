//! Grid state: the stream-function and vorticity fields.

use crate::geometry::Domain;
use bf_core::Real;
use nalgebra::DMatrix;
use std::ops::{Index, IndexMut};

/// Dense scalar field over `[0, nx] x [0, ny]`, indexed `(i, j)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    data: DMatrix<Real>,
}

impl Field {
    pub fn zeros(nx: usize, ny: usize) -> Self {
        Self {
            data: DMatrix::zeros(nx + 1, ny + 1),
        }
    }

    /// Build a field by evaluating `f(i, j)` at every node.
    pub fn from_fn(nx: usize, ny: usize, f: impl FnMut(usize, usize) -> Real) -> Self {
        Self {
            data: DMatrix::from_fn(nx + 1, ny + 1, f),
        }
    }

    /// Largest `i` index.
    #[inline]
    pub fn nx(&self) -> usize {
        self.data.nrows() - 1
    }

    /// Largest `j` index.
    #[inline]
    pub fn ny(&self) -> usize {
        self.data.ncols() - 1
    }

    pub fn fill(&mut self, value: Real) {
        self.data.fill(value);
    }

    /// Overwrite the contents with `other` without reallocating.
    pub fn copy_from(&mut self, other: &Field) {
        self.data.copy_from(&other.data);
    }

    pub fn scale_mut(&mut self, factor: Real) {
        self.data *= factor;
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    pub fn as_matrix(&self) -> &DMatrix<Real> {
        &self.data
    }
}

impl Index<(usize, usize)> for Field {
    type Output = Real;

    #[inline]
    fn index(&self, idx: (usize, usize)) -> &Real {
        &self.data[idx]
    }
}

impl IndexMut<(usize, usize)> for Field {
    #[inline]
    fn index_mut(&mut self, idx: (usize, usize)) -> &mut Real {
        &mut self.data[idx]
    }
}

/// Owned simulation state for one run: psi (stream function) and vorticity.
#[derive(Clone, Debug)]
pub struct FlowState {
    pub stream: Field,
    pub vorticity: Field,
}

impl FlowState {
    /// Zero-initialised state sized for `domain`.
    pub fn new(domain: &Domain) -> Self {
        Self {
            stream: Field::zeros(domain.nx(), domain.ny()),
            vorticity: Field::zeros(domain.nx(), domain.ny()),
        }
    }

    /// Zero both fields before reusing the state for another run.
    pub fn reset(&mut self) {
        self.stream.fill(0.0);
        self.vorticity.fill(0.0);
    }

    pub fn is_finite(&self) -> bool {
        self.stream.is_finite() && self.vorticity.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Obstacle;

    #[test]
    fn bounds_are_inclusive() {
        let mut f = Field::zeros(70, 20);
        assert_eq!(f.nx(), 70);
        assert_eq!(f.ny(), 20);
        f[(70, 20)] = 1.5;
        assert_eq!(f[(70, 20)], 1.5);
    }

    #[test]
    fn reset_zeroes_both_fields() {
        let domain = Domain::new(
            30,
            12,
            Obstacle {
                start: 5,
                length: 4,
                height: 4,
            },
        )
        .unwrap();
        let mut state = FlowState::new(&domain);
        state.stream[(3, 3)] = 2.0;
        state.vorticity[(4, 4)] = -1.0;
        state.reset();
        assert!(state.stream.as_matrix().iter().all(|&v| v == 0.0));
        assert!(state.vorticity.as_matrix().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn copy_from_keeps_shape() {
        let src = Field::from_fn(5, 4, |i, j| (i * 10 + j) as f64);
        let mut dst = Field::zeros(5, 4);
        dst.copy_from(&src);
        assert_eq!(dst, src);
        assert_eq!(dst[(3, 2)], 32.0);
    }

    #[test]
    fn non_finite_is_detected() {
        let mut f = Field::zeros(4, 4);
        assert!(f.is_finite());
        f[(2, 2)] = f64::NAN;
        assert!(!f.is_finite());
    }
}
