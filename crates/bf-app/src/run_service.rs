//! Run execution: one Reynolds number at a time, or a whole case as a batch.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use bf_project::CaseFile;
use bf_results::{BatchSummary, ResultStore, RunManifest, Snapshot};
use bf_solver::{
    BoundaryEnforcer, CancelToken, ConvergenceController, Domain, FlowModel, FlowState,
    IterationReport, SimParams, SweepMode, VelocityOptions, normalize, velocity_field,
};

use crate::case_compile::{compile_domain, grid_info, sim_config};
use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage};

/// Command-line style overrides applied on top of a case file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub output_dir: Option<PathBuf>,
    pub reynolds: Option<Vec<f64>>,
    pub model: Option<FlowModel>,
    /// Use the red-black parallel stream sweep.
    pub parallel: bool,
    pub max_iterations: Option<usize>,
    pub cancel: Option<CancelToken>,
}

impl RunOptions {
    /// The case with these overrides applied. The result is validated again.
    pub fn apply_to(&self, case: &CaseFile) -> AppResult<CaseFile> {
        let mut case = case.clone();
        if let Some(dir) = &self.output_dir {
            case.output.directory = dir.clone();
        }
        if let Some(reynolds) = &self.reynolds {
            if reynolds.is_empty() {
                return Err(AppError::InvalidInput(
                    "at least one Reynolds number is required".to_string(),
                ));
            }
            case.reynolds = reynolds.clone();
        }
        if let Some(model) = self.model {
            case.flow.model = model;
        }
        if self.parallel {
            case.solver.sweep = SweepMode::RedBlack;
        }
        if let Some(max) = self.max_iterations {
            case.solver.max_iterations = max;
        }
        bf_project::validate_case(&case)?;
        Ok(case)
    }
}

/// Result of [`run_batch`].
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub summary: BatchSummary,
    pub summary_path: PathBuf,
    /// Reynolds numbers whose run could not be configured.
    pub errors: Vec<(f64, String)>,
}

impl BatchOutcome {
    pub fn successful(&self) -> usize {
        self.summary.successful()
    }

    pub fn total(&self) -> usize {
        self.summary.total() + self.errors.len()
    }
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    reynolds: f64,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    iteration: Option<IterationReport>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            reynolds,
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            iteration,
        });
    }
}

/// Relax `case` at one Reynolds number, reusing `state`, and export the fields
/// into `store` when the run ends successfully.
pub fn run_case(
    case: &CaseFile,
    reynolds: f64,
    store: &ResultStore,
    state: &mut FlowState,
    cancel: Option<&CancelToken>,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunManifest> {
    run_case_inner(case, reynolds, store, state, cancel, &mut progress_cb)
}

fn run_case_inner(
    case: &CaseFile,
    reynolds: f64,
    store: &ResultStore,
    state: &mut FlowState,
    cancel: Option<&CancelToken>,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunManifest> {
    let started = Instant::now();
    emit_progress(progress_cb, reynolds, RunStage::Configuring, started, None, None);

    let domain = compile_domain(case)?;
    if (state.stream.nx(), state.stream.ny()) != (domain.nx(), domain.ny()) {
        *state = FlowState::new(&domain);
    } else {
        state.reset();
    }
    let params = SimParams::from_config(&sim_config(case, reynolds))?;
    tracing::info!(
        reynolds,
        model = params.model.as_str(),
        omega = params.omega,
        nu = params.nu,
        "starting run"
    );
    BoundaryEnforcer::new(&params).initialize(&domain, state);

    let mut controller = ConvergenceController::new(domain, params);
    if let Some(token) = cancel {
        controller = controller.with_cancel(token.clone());
    }
    if let Some(secs) = case.solver.deadline_s {
        let deadline = Duration::try_from_secs_f64(secs).map_err(|e| {
            AppError::InvalidInput(format!("solver.deadline_s = {secs}: {e}"))
        })?;
        controller = controller.with_deadline(deadline);
    }

    emit_progress(progress_cb, reynolds, RunStage::Relaxing, started, None, None);
    let report = {
        let mut forward = |it: IterationReport| {
            emit_progress(&mut *progress_cb, reynolds, RunStage::Relaxing, started, None, Some(it));
        };
        controller.run_with_progress(state, Some(&mut forward))
    };

    let mut manifest = RunManifest::from_report(reynolds, params.model.as_str(), &report);
    if !report.status.is_success() {
        tracing::warn!(reynolds, status = report.status.as_str(), "run not exported");
        emit_progress(
            progress_cb,
            reynolds,
            RunStage::Failed,
            started,
            Some(report.status.as_str().to_string()),
            None,
        );
        return Ok(manifest);
    }

    emit_progress(progress_cb, reynolds, RunStage::Exporting, started, None, None);
    export_state(&domain, &params, state, case, reynolds, store, &mut manifest);

    emit_progress(
        progress_cb,
        reynolds,
        RunStage::Completed,
        started,
        Some(report.status.as_str().to_string()),
        None,
    );
    Ok(manifest)
}

fn export_state(
    domain: &Domain,
    params: &SimParams,
    state: &mut FlowState,
    case: &CaseFile,
    reynolds: f64,
    store: &ResultStore,
    manifest: &mut RunManifest,
) {
    normalize(&mut state.stream, params.v0, params.h);
    let velocity = velocity_field(
        &state.stream,
        domain,
        params.h,
        VelocityOptions::for_model(params.model),
    );
    let exported = store.export(&Snapshot {
        reynolds,
        grid: grid_info(case),
        stream: &state.stream,
        vorticity: &state.vorticity,
        velocity: &velocity,
    });
    manifest.files = exported.written;
    manifest.export_errors = exported
        .failed
        .into_iter()
        .map(|(path, e)| format!("{}: {e}", path.display()))
        .collect();
}

/// Run every Reynolds number of the case (after applying `options`) and write
/// the batch summary. Only an unusable output directory or summary file is
/// fatal; failed runs are recorded and the batch continues.
pub fn run_batch(
    case: &CaseFile,
    options: &RunOptions,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<BatchOutcome> {
    let case = options.apply_to(case)?;
    let store = ResultStore::new(case.output.directory.clone(), case.output.file_tag.clone())?;
    let domain = compile_domain(&case)?;
    let mut state = FlowState::new(&domain);
    let mut summary = BatchSummary::new(case.name.clone(), grid_info(&case));
    let mut errors = Vec::new();

    for &reynolds in &case.reynolds {
        if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            tracing::warn!(reynolds, "batch cancelled");
            break;
        }
        match run_case_inner(
            &case,
            reynolds,
            &store,
            &mut state,
            options.cancel.as_ref(),
            &mut progress_cb,
        ) {
            Ok(manifest) => summary.runs.push(manifest),
            Err(e) => {
                tracing::error!(reynolds, error = %e, "run could not be configured");
                errors.push((reynolds, e.to_string()));
            }
        }
    }

    let summary_path = store.save_summary(&summary)?;
    tracing::info!(
        successful = summary.successful(),
        total = summary.total(),
        path = %summary_path.display(),
        "batch finished"
    );
    Ok(BatchOutcome {
        summary,
        summary_path,
        errors,
    })
}
