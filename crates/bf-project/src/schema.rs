//! Case file schema definitions.

use bf_solver::{FlowModel, FreeSurface, Obstacle, RegimeTable, SweepMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const LATEST_VERSION: u32 = 1;

/// One case: a fixed geometry relaxed at every listed Reynolds number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseFile {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub domain: DomainDef,
    #[serde(default = "default_obstacle")]
    pub obstacle: Obstacle,
    #[serde(default)]
    pub flow: FlowDef,
    #[serde(default)]
    pub solver: SolverDef,
    #[serde(default = "default_reynolds")]
    pub reynolds: Vec<f64>,
    #[serde(default)]
    pub output: OutputDef,
    /// Replaces the built-in Reynolds regime table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regimes: Option<RegimeTable>,
    #[serde(default)]
    pub corner: CornerDef,
}

impl Default for CaseFile {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            name: "beam-channel".to_string(),
            domain: DomainDef::default(),
            obstacle: default_obstacle(),
            flow: FlowDef::default(),
            solver: SolverDef::default(),
            reynolds: default_reynolds(),
            output: OutputDef::default(),
            regimes: None,
            corner: CornerDef::default(),
        }
    }
}

fn default_obstacle() -> Obstacle {
    Obstacle {
        start: 10,
        length: 8,
        height: 8,
    }
}

fn default_reynolds() -> Vec<f64> {
    vec![0.5, 1.0, 2.0, 5.0]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainDef {
    pub nx: usize,
    pub ny: usize,
    pub spacing_m: f64,
}

impl Default for DomainDef {
    fn default() -> Self {
        Self {
            nx: 160,
            ny: 30,
            spacing_m: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowDef {
    pub inlet_velocity_mps: f64,
    #[serde(default)]
    pub model: FlowModel,
    /// Falls back to the model's own condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_surface: Option<FreeSurface>,
}

impl Default for FlowDef {
    fn default() -> Self {
        Self {
            inlet_velocity_mps: 1.0,
            model: FlowModel::default(),
            free_surface: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Overrides the regime table's relaxation factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omega: Option<f64>,
    #[serde(default)]
    pub sweep: SweepMode,
    #[serde(default = "default_stagnation_floor")]
    pub stagnation_floor: usize,
    #[serde(default = "default_stagnation_epsilon")]
    pub stagnation_epsilon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reenforce_after_sweep: Option<bool>,
    /// Wall-clock budget per Reynolds number, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_s: Option<f64>,
}

fn default_stagnation_floor() -> usize {
    50_000
}

fn default_stagnation_epsilon() -> f64 {
    1e-15
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 350_000,
            omega: None,
            sweep: SweepMode::default(),
            stagnation_floor: default_stagnation_floor(),
            stagnation_epsilon: default_stagnation_epsilon(),
            reenforce_after_sweep: None,
            deadline_s: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputDef {
    pub directory: PathBuf,
    /// Inserted between `_Re_` and the Reynolds number in file names.
    #[serde(default)]
    pub file_tag: String,
}

impl Default for OutputDef {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("Datos"),
            file_tag: "NBS".to_string(),
        }
    }
}

/// Corner treatment constants applied to every regime that uses them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CornerDef {
    pub favored_weight: f64,
    pub spike_threshold: f64,
    pub keep_weight: f64,
}

impl Default for CornerDef {
    fn default() -> Self {
        Self {
            favored_weight: 0.7,
            spike_threshold: 2.0,
            keep_weight: 0.6,
        }
    }
}
