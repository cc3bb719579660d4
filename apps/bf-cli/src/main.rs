use bf_app::{
    AppResult, RunOptions, RunProgressEvent, RunStage, case_service, run_service,
};
use bf_project::CaseFile;
use bf_solver::FlowModel;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "bf-cli")]
#[command(about = "beamflow - steady channel flow past a submerged beam", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relax a case at every Reynolds number and export the fields
    Run {
        /// Case file (YAML or JSON); the reference case is used when omitted
        case_path: Option<PathBuf>,
        /// Output directory, overriding the case
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Reynolds numbers to run, overriding the case
        #[arg(long = "re", num_args = 1..)]
        reynolds: Option<Vec<f64>>,
        /// Flow model, overriding the case
        #[arg(long, value_enum)]
        model: Option<ModelArg>,
        /// Use the parallel red-black stream sweep
        #[arg(long)]
        parallel: bool,
        /// Iteration cap, overriding the case
        #[arg(long)]
        max_iterations: Option<usize>,
    },
    /// Validate a case file
    Validate {
        /// Path to the case file
        case_path: PathBuf,
    },
    /// Write the reference case to a file
    Init {
        /// Destination (`.json` for JSON, YAML otherwise)
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Potential,
    Viscous,
}

impl From<ModelArg> for FlowModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Potential => FlowModel::PotentialFlow,
            ModelArg::Viscous => FlowModel::ViscousVorticity,
        }
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            case_path,
            out,
            reynolds,
            model,
            parallel,
            max_iterations,
        } => {
            let options = RunOptions {
                output_dir: out,
                reynolds,
                model: model.map(FlowModel::from),
                parallel,
                max_iterations,
                cancel: None,
            };
            cmd_run(case_path.as_deref(), &options)
        }
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Init { path } => cmd_init(&path),
    }
}

fn cmd_run(case_path: Option<&Path>, options: &RunOptions) -> AppResult<()> {
    let case = match case_path {
        Some(path) => {
            println!("Loading case: {}", path.display());
            case_service::load_case(path)?
        }
        None => CaseFile::default(),
    };
    let summary = case_service::summarize(&case);
    println!(
        "Case '{}': grid {}x{}, beam at i={} (length {}, height {}), model {}",
        summary.name,
        summary.grid.0,
        summary.grid.1,
        summary.obstacle.0,
        summary.obstacle.1,
        summary.obstacle.2,
        summary.model
    );

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let outcome = run_service::run_batch(
        &case,
        options,
        Some(&mut |event: RunProgressEvent| {
            let emit_now = last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    for run in &outcome.summary.runs {
        let mark = if run.success { "✓" } else { "✗" };
        println!(
            "{mark} Re = {:<6} {:<20} iterations={:<7} max|dpsi|={:.3e} max|dw|={:.3e} ({:.1}s)",
            run.reynolds,
            run.status.as_str(),
            run.iterations,
            run.max_diff_u,
            run.max_diff_w,
            run.elapsed_ms as f64 / 1000.0
        );
        for err in &run.export_errors {
            println!("    export failed: {err}");
        }
    }
    for (re, err) in &outcome.errors {
        println!("✗ Re = {re:<6} {err}");
    }

    println!();
    println!("Successful runs: {}/{}", outcome.successful(), outcome.total());
    println!("Summary: {}", outcome.summary_path.display());
    Ok(())
}

fn cmd_validate(case_path: &Path) -> AppResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = case_service::load_case(case_path)?;
    case_service::validate_case(&case)?;
    println!("✓ Case is valid ({} Reynolds numbers)", case.reynolds.len());
    Ok(())
}

fn cmd_init(path: &Path) -> AppResult<()> {
    case_service::save_case(path, &CaseFile::default())?;
    println!("✓ Wrote reference case to {}", path.display());
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} Re={}  {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.reynolds,
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(it) = &event.iteration {
        line.push_str(&format!(
            "  iter={}  dpsi={:.2e}  dw={:.2e}",
            it.iteration, it.max_diff_u, it.max_diff_w
        ));
    }
    if let Some(msg) = &event.message {
        line.push_str("  ");
        line.push_str(msg);
    }
    if matches!(event.stage, RunStage::Completed | RunStage::Failed) {
        line.push('\n');
    }
    print!("{line}");
    let _ = io::stdout().flush();
}
