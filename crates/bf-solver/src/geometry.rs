//! Channel grid and the rectangular obstacle inside it.

use crate::error::{SolverError, SolverResult};
use serde::{Deserialize, Serialize};

/// Axis-aligned obstacle sitting on the centerline: `start <= i <= start + length`,
/// `0 <= j <= height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub start: usize,
    pub length: usize,
    pub height: usize,
}

impl Obstacle {
    /// Last column covered by the obstacle (inclusive). Saturates on
    /// overflow; [`Domain::new`] rejects such obstacles.
    #[inline]
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.length)
    }

    #[inline]
    pub fn contains(&self, i: usize, j: usize) -> bool {
        i >= self.start && i <= self.end() && j <= self.height
    }
}

/// Index domain `[0, nx] x [0, ny]` with its obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Domain {
    nx: usize,
    ny: usize,
    obstacle: Obstacle,
}

impl Domain {
    /// Build a domain, rejecting geometry that does not leave room for the
    /// one-sided no-slip stencils around the obstacle.
    pub fn new(nx: usize, ny: usize, obstacle: Obstacle) -> SolverResult<Self> {
        if nx < 4 || ny < 4 {
            return Err(SolverError::Geometry {
                what: format!("grid {nx}x{ny} is too small (need at least 4x4)"),
            });
        }
        if obstacle.start < 2 {
            return Err(SolverError::Geometry {
                what: format!(
                    "obstacle start {} leaves no fluid column ahead of it (need >= 2)",
                    obstacle.start
                ),
            });
        }
        let fits_length = obstacle
            .start
            .checked_add(obstacle.length)
            .and_then(|end| end.checked_add(2))
            .is_some_and(|needed| needed <= nx);
        if !fits_length {
            return Err(SolverError::Geometry {
                what: format!(
                    "obstacle end {} does not fit before the outlet (need end + 2 <= Nx = {nx})",
                    obstacle.end()
                ),
            });
        }
        if obstacle.height.checked_add(2).is_none_or(|needed| needed > ny) {
            return Err(SolverError::Geometry {
                what: format!(
                    "obstacle height {} does not fit below the free surface (need H + 2 <= Ny = {ny})",
                    obstacle.height
                ),
            });
        }
        Ok(Self { nx, ny, obstacle })
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.ny
    }

    #[inline]
    pub fn obstacle(&self) -> Obstacle {
        self.obstacle
    }

    #[inline]
    pub fn is_solid(&self, i: usize, j: usize) -> bool {
        self.obstacle.contains(i, j)
    }

    /// Interior cells (`1..nx`, `1..ny`) outside the obstacle, in sweep order.
    pub fn fluid_interior(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (1..self.nx)
            .flat_map(move |i| (1..self.ny).map(move |j| (i, j)))
            .filter(move |&(i, j)| !self.is_solid(i, j))
    }
}
