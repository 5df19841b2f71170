use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use wf_app::{AppError, AppResult, RunOptions, run_service, study_service};

#[derive(Parser)]
#[command(name = "wf-cli")]
#[command(about = "WaterFlow CLI - Water treatment flowsheet solver and sweep tool", long_about = None)]
struct Cli {
    /// Directory of technology parameter files (defaults to the built-in set)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate study file syntax and structure
    Validate {
        /// Path to the study YAML or JSON file
        study_path: PathBuf,
    },
    /// Build, initialize and solve the study's treatment train
    Solve {
        /// Path to the study YAML or JSON file
        study_path: PathBuf,
        /// Print the unit and costing reports
        #[arg(long)]
        report: bool,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// Run the parameter sweep declared by the study
    Sweep {
        /// Path to the study YAML or JSON file
        study_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Solve samples in parallel
        #[arg(long)]
        parallel: bool,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List cached runs for a study
    Runs {
        /// Path to the study YAML or JSON file
        study_path: PathBuf,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the study YAML or JSON file
        study_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Print the parameters of one technology
    Database {
        /// Technology name, e.g. reverse_osmosis
        tech: String,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let options = RunOptions {
        database_dir: cli.database,
        ..RunOptions::default()
    };

    match cli.command {
        Commands::Validate { study_path } => cmd_validate(&study_path, &options),
        Commands::Solve {
            study_path,
            report,
            no_cache,
        } => cmd_solve(
            &study_path,
            report,
            &RunOptions {
                use_cache: !no_cache,
                ..options
            },
        ),
        Commands::Sweep {
            study_path,
            no_cache,
            parallel,
            output,
        } => cmd_sweep(
            &study_path,
            output.as_deref(),
            &RunOptions {
                use_cache: !no_cache,
                parallel,
                ..options
            },
        ),
        Commands::Runs { study_path } => cmd_runs(&study_path),
        Commands::ShowRun { study_path, run_id } => cmd_show_run(&study_path, &run_id),
        Commands::Database { tech } => cmd_database(&tech, &options),
    }
}

fn cmd_validate(study_path: &Path, options: &RunOptions) -> AppResult<()> {
    println!("Validating study: {}", study_path.display());
    let study = study_service::load_study(study_path)?;
    study_service::validate_study(&study)?;
    let summary = study_service::summarize(&study, &options.database()?)?;
    println!("✓ Study is valid");
    println!("  Name: {}", summary.name);
    println!("  Solutes: {}", summary.solutes.join(", "));
    println!("  Units: {}", summary.units.join(", "));
    println!("  Degrees of freedom: {}", summary.degrees_of_freedom);
    println!("  Costing: {}", if summary.has_costing { "yes" } else { "no" });
    if let Some(samples) = summary.sweep_samples {
        println!("  Sweep samples: {}", samples);
    }
    Ok(())
}

fn cmd_solve(study_path: &Path, report: bool, options: &RunOptions) -> AppResult<()> {
    println!("Solving study: {}", study_path.display());
    let response = run_service::solve_study(study_path, options)?;

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Solve completed: {}", response.run_id);
    }
    if let Some(status) = response.status {
        println!(
            "  Termination: {}  iterations={}  residual={:.3e}",
            status.termination, status.iterations, status.residual_norm
        );
    }

    println!("\nResults:");
    for line in response.results_csv.lines().skip(1) {
        if let Some((name, value)) = line.split_once(',') {
            println!("  {:<30} {}", name, value);
        }
    }

    if report {
        println!();
        print!("{}", response.report);
    }
    Ok(())
}

fn cmd_sweep(study_path: &Path, output: Option<&Path>, options: &RunOptions) -> AppResult<()> {
    println!("Running sweep for study: {}", study_path.display());
    let response = run_service::sweep_study(study_path, options)?;
    debug!(run_id = %response.run_id, "sweep finished");

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Sweep completed: {}", response.run_id);
    }
    if response.failed > 0 {
        println!("  {} sample(s) did not converge", response.failed);
    }

    if let Some(path) = output {
        std::fs::write(path, &response.results_csv)?;
        println!(
            "✓ Exported {} samples to {}",
            response.results_csv.lines().count().saturating_sub(1),
            path.display()
        );
    } else {
        print!("{}", response.results_csv);
    }
    Ok(())
}

fn cmd_runs(study_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(study_path)?;

    if runs.is_empty() {
        println!("No cached runs found for study: {}", study_path.display());
    } else {
        println!("Cached runs:");
        for manifest in runs {
            println!(
                "  {} ({}, {:?})",
                manifest.run_id, manifest.timestamp, manifest.run_type
            );
        }
    }
    Ok(())
}

fn cmd_show_run(study_path: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);
    let run = run_service::load_run(study_path, run_id)?;

    println!("\nRun Summary:");
    println!("  Study: {}", run.manifest.study_name);
    println!("  Timestamp: {}", run.manifest.timestamp);
    println!("  Type: {:?}", run.manifest.run_type);
    println!("  Solver version: {}", run.manifest.solver_version);

    println!("\nResults:");
    print!("{}", run.results_csv);
    if let Some(report) = run.report {
        println!();
        print!("{}", report);
    }
    Ok(())
}

fn cmd_database(tech: &str, options: &RunOptions) -> AppResult<()> {
    let db = options.database()?;
    let params = db
        .get_unit_operation_parameters(tech)
        .map_err(AppError::from)?;

    println!("Technology: {}", tech);
    for (name, entry) in params.entries() {
        println!("  {:<45} {:>12} {}", name, entry.value, entry.units);
    }
    Ok(())
}
