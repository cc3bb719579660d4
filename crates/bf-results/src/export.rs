//! Plain-text `.dat` snapshots of a converged run.
//!
//! Every file starts with three `#` comment lines (title with the Reynolds
//! number, column format, grid parameters) followed by one space separated
//! row per node with six decimals.

use crate::ResultsResult;
use crate::types::GridInfo;
use bf_solver::{Field, VelocitySample};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// The three exported quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    StreamFunction,
    Vorticity,
    Velocity,
}

impl FieldKind {
    pub const ALL: [FieldKind; 3] = [
        FieldKind::StreamFunction,
        FieldKind::Vorticity,
        FieldKind::Velocity,
    ];

    pub fn file_prefix(&self) -> &'static str {
        match self {
            FieldKind::StreamFunction => "streamfunction",
            FieldKind::Vorticity => "vorticity",
            FieldKind::Velocity => "velocity_field",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            FieldKind::StreamFunction => "Stream function",
            FieldKind::Vorticity => "Vorticity",
            FieldKind::Velocity => "Velocity field",
        }
    }

    fn columns(&self) -> &'static str {
        match self {
            FieldKind::StreamFunction => "x y psi",
            FieldKind::Vorticity => "x y omega",
            FieldKind::Velocity => "x y vx vy velocity_magnitude",
        }
    }
}

/// `<prefix>_Re_<tag><re with one decimal>.dat`
pub fn file_name(kind: FieldKind, tag: &str, reynolds: f64) -> String {
    format!("{}_Re_{tag}{reynolds:.1}.dat", kind.file_prefix())
}

fn write_header(out: &mut impl Write, kind: FieldKind, reynolds: f64, grid: GridInfo) -> std::io::Result<()> {
    writeln!(out, "# {} - Re = {reynolds}", kind.title())?;
    writeln!(out, "# Format: {}", kind.columns())?;
    writeln!(out, "# Parameters: Nx={} Ny={} h={}", grid.nx, grid.ny, grid.h)
}

/// Rows `x y value` for `0 <= i < nx`, `0 <= j < ny`.
pub fn write_scalar_field(
    out: &mut impl Write,
    kind: FieldKind,
    field: &Field,
    reynolds: f64,
    grid: GridInfo,
) -> std::io::Result<()> {
    write_header(out, kind, reynolds, grid)?;
    for i in 0..grid.nx {
        for j in 0..grid.ny {
            let x = i as f64 * grid.h;
            let y = j as f64 * grid.h;
            writeln!(out, "{x:.6} {y:.6} {:.6}", field[(i, j)])?;
        }
    }
    Ok(())
}

/// Rows `x y vx vy |v|`, one per sample.
pub fn write_velocity_field(
    out: &mut impl Write,
    samples: &[VelocitySample],
    reynolds: f64,
    grid: GridInfo,
) -> std::io::Result<()> {
    write_header(out, FieldKind::Velocity, reynolds, grid)?;
    for s in samples {
        writeln!(
            out,
            "{:.6} {:.6} {:.6} {:.6} {:.6}",
            s.x, s.y, s.vx, s.vy, s.magnitude
        )?;
    }
    Ok(())
}

/// Fields of one run ready for export.
pub struct Snapshot<'a> {
    pub reynolds: f64,
    pub grid: GridInfo,
    pub stream: &'a Field,
    pub vorticity: &'a Field,
    pub velocity: &'a [VelocitySample],
}

/// Which files were written and which failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

fn write_file(path: &Path, kind: FieldKind, snap: &Snapshot<'_>) -> ResultsResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    match kind {
        FieldKind::StreamFunction => {
            write_scalar_field(&mut out, kind, snap.stream, snap.reynolds, snap.grid)?
        }
        FieldKind::Vorticity => {
            write_scalar_field(&mut out, kind, snap.vorticity, snap.reynolds, snap.grid)?
        }
        FieldKind::Velocity => write_velocity_field(&mut out, snap.velocity, snap.reynolds, snap.grid)?,
    }
    out.flush()?;
    Ok(())
}

/// Write all three files into `dir`. A failing file is logged and skipped;
/// the others are still attempted.
pub fn export_snapshot(dir: &Path, tag: &str, snap: &Snapshot<'_>) -> ExportReport {
    let mut report = ExportReport::default();
    for kind in FieldKind::ALL {
        let path = dir.join(file_name(kind, tag, snap.reynolds));
        match write_file(&path, kind, snap) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "exported {}", kind.file_prefix());
                report.written.push(path);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "export failed");
                report.failed.push((path, e.to_string()));
            }
        }
    }
    report
}
