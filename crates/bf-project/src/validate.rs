//! Case validation logic.

use crate::schema::{CaseFile, LATEST_VERSION};
use bf_solver::Domain;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid geometry: {what}")]
    Geometry { what: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive and finite"))
    }
}

fn unit_interval(field: &str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, value, "must lie in [0, 1]"))
    }
}

pub fn validate_case(case: &CaseFile) -> Result<(), ValidationError> {
    if case.version == 0 || case.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }

    Domain::new(case.domain.nx, case.domain.ny, case.obstacle).map_err(|e| {
        ValidationError::Geometry {
            what: e.to_string(),
        }
    })?;
    positive("domain.spacing_m", case.domain.spacing_m)?;
    positive("flow.inlet_velocity_mps", case.flow.inlet_velocity_mps)?;

    let solver = &case.solver;
    positive("solver.tolerance", solver.tolerance)?;
    if solver.max_iterations == 0 {
        return Err(invalid("solver.max_iterations", 0, "must be positive"));
    }
    if let Some(omega) = solver.omega {
        positive("solver.omega", omega)?;
    }
    positive("solver.stagnation_epsilon", solver.stagnation_epsilon)?;
    if let Some(deadline) = solver.deadline_s {
        positive("solver.deadline_s", deadline)?;
        if std::time::Duration::try_from_secs_f64(deadline).is_err() {
            return Err(invalid("solver.deadline_s", deadline, "too large for a duration"));
        }
    }

    if case.reynolds.is_empty() {
        return Err(invalid("reynolds", "[]", "at least one Reynolds number is required"));
    }
    for re in &case.reynolds {
        positive("reynolds", *re)?;
    }

    if let Some(table) = &case.regimes {
        // serde bypasses the table constructor, so re-check it here
        bf_solver::RegimeTable::new(table.rows().to_vec())
            .map_err(|e| invalid("regimes", table.rows().len(), &e.to_string()))?;
        for re in &case.reynolds {
            if table.lookup(*re).is_err() {
                return Err(invalid("reynolds", re, "not covered by the regime table"));
            }
        }
    }

    unit_interval("corner.favored_weight", case.corner.favored_weight)?;
    unit_interval("corner.keep_weight", case.corner.keep_weight)?;
    positive("corner.spike_threshold", case.corner.spike_threshold)?;

    if case.output.directory.as_os_str().is_empty() {
        return Err(invalid("output.directory", "\"\"", "must not be empty"));
    }

    Ok(())
}
