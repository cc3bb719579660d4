//! Reynolds-dependent tuning table.
//!
//! Every stabiliser that depends on the target Reynolds number (relaxation
//! factor, damping of the convective term, tolerance scaling, divergence
//! threshold, stagnation patience, corner treatment) lives in one ordered
//! table that is looked up once per run.

use crate::error::{SolverError, SolverResult};
use bf_core::Real;
use serde::{Deserialize, Serialize};

/// Upper bound of a table row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeBound {
    /// `Re <= value`
    AtMost(Real),
    /// `Re < value`
    Below(Real),
    Unbounded,
}

impl RegimeBound {
    pub fn admits(&self, reynolds: Real) -> bool {
        match *self {
            RegimeBound::AtMost(v) => reynolds <= v,
            RegimeBound::Below(v) => reynolds < v,
            RegimeBound::Unbounded => true,
        }
    }

    fn value(&self) -> Real {
        match *self {
            RegimeBound::AtMost(v) | RegimeBound::Below(v) => v,
            RegimeBound::Unbounded => Real::INFINITY,
        }
    }
}

/// How the two one-sided wall-vorticity estimates at an obstacle corner are combined.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CornerBlend {
    /// Plain average.
    Symmetric,
    /// The smaller-magnitude estimate receives `weight`, the other `1 - weight`.
    FavorSmaller { weight: Real },
}

impl CornerBlend {
    pub fn blend(&self, vertical: Real, horizontal: Real) -> Real {
        match *self {
            CornerBlend::Symmetric => 0.5 * (vertical + horizontal),
            CornerBlend::FavorSmaller { weight } => {
                if vertical.abs() < horizontal.abs() {
                    weight * vertical + (1.0 - weight) * horizontal
                } else {
                    (1.0 - weight) * vertical + weight * horizontal
                }
            }
        }
    }
}

/// Spike filter applied to the 3x3 block around each obstacle corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerSmoothing {
    /// Cells with `|w|` above this are re-averaged.
    pub spike_threshold: Real,
    /// Weight kept by the original value; the neighbour mean gets the rest.
    pub keep_weight: Real,
}

impl Default for CornerSmoothing {
    fn default() -> Self {
        Self {
            spike_threshold: 2.0,
            keep_weight: 0.6,
        }
    }
}

/// Parameters selected by a table row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegimeParams {
    pub omega: Real,
    /// Damping multiplier on the convective term of the vorticity update.
    pub stability_factor: Real,
    pub tolerance_multiplier: Real,
    pub divergence_threshold: Real,
    /// Consecutive stagnant iterations before partial acceptance.
    pub stagnation_patience: usize,
    /// Multiplier on the effective tolerance used when the cap is reached.
    pub acceptance_multiplier: Real,
    pub report_interval: usize,
    pub corner_blend: CornerBlend,
    #[serde(default)]
    pub corner_smoothing: Option<CornerSmoothing>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegimeRow {
    pub upper: RegimeBound,
    pub params: RegimeParams,
}

/// Ordered `(upper bound -> parameters)` rows; the first admitting row wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegimeTable {
    rows: Vec<RegimeRow>,
}

impl RegimeTable {
    /// Build a table, checking that bounds never decrease.
    pub fn new(rows: Vec<RegimeRow>) -> SolverResult<Self> {
        if rows.is_empty() {
            return Err(SolverError::Config {
                what: "regime table has no rows".to_string(),
            });
        }
        for pair in rows.windows(2) {
            if pair[1].upper.value() < pair[0].upper.value() {
                return Err(SolverError::Config {
                    what: format!(
                        "regime bounds must be ascending ({:?} follows {:?})",
                        pair[1].upper, pair[0].upper
                    ),
                });
            }
        }
        for row in &rows {
            let p = &row.params;
            if !(p.omega > 0.0 && p.omega.is_finite()) {
                return Err(SolverError::Config {
                    what: format!("regime omega must be positive, got {}", p.omega),
                });
            }
            if p.report_interval == 0 {
                return Err(SolverError::Config {
                    what: "regime report_interval must be positive".to_string(),
                });
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[RegimeRow] {
        &self.rows
    }

    pub fn lookup(&self, reynolds: Real) -> SolverResult<&RegimeParams> {
        self.rows
            .iter()
            .find(|row| row.upper.admits(reynolds))
            .map(|row| &row.params)
            .ok_or(SolverError::NoRegime { reynolds })
    }

    /// Replace the corner constants in every row, keeping each row's choice of
    /// symmetric vs. favoured blending and whether smoothing is active.
    pub fn with_corner_constants(mut self, favored_weight: Real, smoothing: CornerSmoothing) -> Self {
        for row in &mut self.rows {
            if let CornerBlend::FavorSmaller { weight } = &mut row.params.corner_blend {
                *weight = favored_weight;
            }
            if let Some(s) = &mut row.params.corner_smoothing {
                *s = smoothing;
            }
        }
        self
    }
}

impl Default for RegimeTable {
    fn default() -> Self {
        let low = RegimeParams {
            omega: 0.1,
            stability_factor: 1.0,
            tolerance_multiplier: 1.0,
            divergence_threshold: 1000.0,
            stagnation_patience: 3000,
            acceptance_multiplier: 1000.0,
            report_interval: 5000,
            corner_blend: CornerBlend::Symmetric,
            corner_smoothing: None,
        };
        let high = RegimeParams {
            omega: 0.012,
            stability_factor: 0.4,
            tolerance_multiplier: 200.0,
            divergence_threshold: 50.0,
            stagnation_patience: 8000,
            acceptance_multiplier: 20_000.0,
            report_interval: 3000,
            corner_blend: CornerBlend::FavorSmaller { weight: 0.7 },
            corner_smoothing: Some(CornerSmoothing::default()),
        };
        let row = |upper, params| RegimeRow { upper, params };
        Self {
            rows: vec![
                row(RegimeBound::AtMost(0.5), low),
                row(RegimeBound::AtMost(1.0), RegimeParams { omega: 0.08, ..low }),
                row(RegimeBound::AtMost(1.5), RegimeParams { omega: 0.04, ..low }),
                row(
                    RegimeBound::AtMost(2.0),
                    RegimeParams {
                        omega: 0.04,
                        stability_factor: 0.8,
                        tolerance_multiplier: 10.0,
                        ..low
                    },
                ),
                row(
                    RegimeBound::Below(5.0),
                    RegimeParams {
                        omega: 0.012,
                        stability_factor: 0.7,
                        tolerance_multiplier: 50.0,
                        ..low
                    },
                ),
                row(RegimeBound::AtMost(5.0), high),
                row(RegimeBound::AtMost(10.0), RegimeParams { omega: 0.008, ..high }),
                row(RegimeBound::Unbounded, RegimeParams { omega: 0.005, ..high }),
            ],
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn omega_never_grows_with_reynolds(a in 0.01_f64..100.0, b in 0.01_f64..100.0) {
            let t = RegimeTable::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(t.lookup(hi).unwrap().omega <= t.lookup(lo).unwrap().omega);
            prop_assert!(
                t.lookup(hi).unwrap().tolerance_multiplier
                    >= t.lookup(lo).unwrap().tolerance_multiplier
            );
        }
    }
}
