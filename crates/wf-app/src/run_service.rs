//! Run execution and caching service.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use wf_core::{kgps, pa};
use wf_flowsheet::builder::PRODUCT;
use wf_flowsheet::{
    Case, Database, FeedSpec, InitializeOptions, PumpSpec, TrainConfig, WATER, add_costing,
    costing_report, initialize, unit_report,
};
use wf_project::{Study, SweepDef};
use wf_results::{RunManifest, RunStore, RunType};
use wf_solver::{SOLVER_VERSION, SolveStatus, SolverError, SolverOptions};
use wf_sweep::{ResultTable, run_sweep, run_sweep_parallel, run_sweep_with_retry};

use crate::error::{AppError, AppResult};
use crate::study_service;

/// Options for solve and sweep runs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    /// Run sweep samples on the rayon pool.
    pub parallel: bool,
    /// Parameter database directory; the embedded set when absent.
    pub database_dir: Option<PathBuf>,
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            parallel: false,
            database_dir: None,
            solver_version: SOLVER_VERSION.to_string(),
        }
    }
}

impl RunOptions {
    pub fn database(&self) -> AppResult<Database> {
        Ok(match &self.database_dir {
            Some(dir) => Database::from_dir(dir)?,
            None => Database::embedded()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SolveResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    /// Solver status of a fresh run; `None` when loaded from cache.
    pub status: Option<SolveStatus>,
    /// Unit reports followed by the costing report.
    pub report: String,
    /// `name,value` lines of the headline results.
    pub results_csv: String,
}

#[derive(Debug, Clone)]
pub struct SweepResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub results_csv: String,
    pub failed: usize,
}

/// A run read back from the store.
#[derive(Debug, Clone)]
pub struct StoredRun {
    pub manifest: RunManifest,
    pub results_csv: String,
    pub report: Option<String>,
}

/// Train configuration described by a study.
pub fn train_config(study: &Study) -> TrainConfig {
    let mut flow_mass_comp = vec![(WATER.to_string(), kgps(study.feed.water_kg_s))];
    flow_mass_comp.extend(
        study
            .feed
            .solutes
            .iter()
            .map(|s| (s.name.clone(), kgps(s.flow_kg_s))),
    );
    let train = &study.train;
    TrainConfig {
        feed: FeedSpec {
            flow_mass_comp,
            pressure: pa(study.feed.pressure_pa),
        },
        pump: PumpSpec {
            outlet_pressure: pa(train.pump.outlet_pressure_pa),
            efficiency: train.pump.efficiency,
        },
        pretreatment: train.pretreatment,
        adsorption: train.adsorption,
        dewatering: train.dewatering,
        recycle: train.recycle_fraction,
        use_default_removal: train.use_default_removal,
    }
}

/// Build the study's train, with costing when the study asks for it.
pub fn build_case(study: &Study, db: &Database) -> AppResult<Case> {
    let mut case = wf_flowsheet::build_case(&study.name, &train_config(study), db)?;
    if let Some(params) = &study.costing {
        add_costing(&mut case, params, db, PRODUCT)?;
    }
    Ok(case)
}

/// Initialize and scale a freshly built case.
fn prepare(case: &mut Case, solver: &SolverOptions) -> AppResult<()> {
    let init = initialize(
        case,
        &InitializeOptions {
            solver: solver.clone(),
            ..InitializeOptions::default()
        },
    )?;
    if !init.unconverged.is_empty() {
        warn!(units = ?init.unconverged, "initialization left blocks unconverged");
    }
    case.calculate_scaling_factors(solver.fd_epsilon)?;
    Ok(())
}

fn full_report(case: &Case) -> AppResult<String> {
    let mut report = String::new();
    for unit in case.units() {
        report.push_str(&unit_report(case, &unit.name)?);
    }
    if let Some(costing) = case.costing() {
        report.push_str(&costing_report(&costing.summary(case.model())?));
    }
    Ok(report)
}

fn headline_csv(case: &Case) -> AppResult<String> {
    let mut rows = vec![(
        "product_flow_vol".to_string(),
        case.model()
            .eval_named(&format!("fs.{PRODUCT}.inlet.flow_vol"))
            .map_err(wf_flowsheet::FlowsheetError::from)?,
    )];
    if let Some(costing) = case.costing() {
        let s = costing.summary(case.model())?;
        rows.extend([
            ("capital_cost_total".to_string(), s.capital_cost_total),
            ("operating_cost_total".to_string(), s.operating_cost_total),
            ("electricity_total".to_string(), s.electricity_total),
            ("annual_water_production".to_string(), s.annual_water_production),
            ("LCOW".to_string(), s.lcow),
            ("specific_energy_consumption".to_string(), s.specific_energy_consumption),
            ("system_recovery".to_string(), s.system_recovery),
        ]);
    }
    let mut csv = String::from("name,value\n");
    for (name, value) in rows {
        csv.push_str(&format!("{name},{value}\n"));
    }
    Ok(csv)
}

/// Solve a study once, or load the cached run.
pub fn solve_study(study_path: &Path, options: &RunOptions) -> AppResult<SolveResponse> {
    let study = study_service::load_study(study_path)?;
    let db = options.database()?;
    let run_id = wf_results::compute_run_id(&study, &db, "solve", &options.solver_version);
    let store = RunStore::for_study(study_path)?;

    if options.use_cache && store.has_run(&run_id) {
        let manifest = store.load_manifest(&run_id)?;
        let results_csv = store.load_results(&run_id)?;
        let report = store.load_report(&run_id)?.unwrap_or_default();
        info!(run_id = %run_id, "loaded cached solve");
        return Ok(SolveResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            status: None,
            report,
            results_csv,
        });
    }

    let mut case = build_case(&study, &db)?;
    prepare(&mut case, &study.solver)?;
    let status = case.solve(&study.solver, true)?;

    let report = full_report(&case)?;
    let results_csv = headline_csv(&case)?;
    let manifest = RunManifest::now(
        run_id.clone(),
        &study.name,
        RunType::Solve,
        &options.solver_version,
    );
    store.save_run(&manifest, &results_csv, Some(&report))?;
    info!(run_id = %run_id, iterations = status.iterations, "solve stored");

    Ok(SolveResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        status: Some(status),
        report,
        results_csv,
    })
}

/// Run every sample on the prepared case.
///
/// Scale factors stay those computed for the baseline in [`prepare`]; samples
/// are not rescaled. A failed sample is retried only when the study sets
/// `reinitialize`, which re-runs the initializer and routes the sweep through
/// [`run_sweep_with_retry`].
fn execute_sweep(
    case: &mut Case,
    sweep: &SweepDef,
    solver: &SolverOptions,
    parallel: bool,
) -> AppResult<ResultTable> {
    let optimize = |case: &mut Case| -> Result<SolveStatus, SolverError> {
        case.solve(solver, false).map_err(SolverError::from)
    };
    let table = if parallel {
        if sweep.reinitialize {
            return Err(AppError::InvalidInput(
                "reinitialize is not supported for parallel sweeps".to_string(),
            ));
        }
        run_sweep_parallel(case, &sweep.spec, optimize)?
    } else if sweep.reinitialize {
        let init = InitializeOptions {
            solver: solver.clone(),
            ..InitializeOptions::default()
        };
        run_sweep_with_retry(case, &sweep.spec, optimize, |case: &mut Case| {
            initialize(case, &init).map(|_| ())
        })?
    } else {
        run_sweep(case, &sweep.spec, optimize)?
    };
    Ok(table)
}

/// Run the study's sweep, or load the cached run.
pub fn sweep_study(study_path: &Path, options: &RunOptions) -> AppResult<SweepResponse> {
    let study = study_service::load_study(study_path)?;
    let sweep = study
        .sweep
        .as_ref()
        .ok_or_else(|| AppError::InvalidInput(format!("study '{}' declares no sweep", study.name)))?;
    let db = options.database()?;
    let run_id = wf_results::compute_run_id(&study, &db, "sweep", &options.solver_version);
    let store = RunStore::for_study(study_path)?;

    if options.use_cache && store.has_run(&run_id) {
        let manifest = store.load_manifest(&run_id)?;
        let results_csv = store.load_results(&run_id)?;
        let failed = match manifest.run_type {
            RunType::Sweep { failed, .. } => failed,
            RunType::Solve => 0,
        };
        info!(run_id = %run_id, "loaded cached sweep");
        return Ok(SweepResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            results_csv,
            failed,
        });
    }

    let mut case = build_case(&study, &db)?;
    prepare(&mut case, &study.solver)?;
    let table = execute_sweep(&mut case, sweep, &study.solver, options.parallel)?;

    let results_csv = table.to_delimited(',');
    let manifest = RunManifest::now(
        run_id.clone(),
        &study.name,
        RunType::Sweep {
            samples: table.len(),
            failed: table.failed_count(),
        },
        &options.solver_version,
    );
    store.save_run(&manifest, &results_csv, None)?;
    info!(run_id = %run_id, samples = table.len(), "sweep stored");

    Ok(SweepResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        results_csv,
        failed: table.failed_count(),
    })
}

/// Runs stored for the study at `study_path`, oldest first.
pub fn list_runs(study_path: &Path) -> AppResult<Vec<RunManifest>> {
    let study = study_service::load_study(study_path)?;
    let store = RunStore::for_study(study_path)?;
    Ok(store.list_runs(&study.name)?)
}

pub fn load_run(study_path: &Path, run_id: &str) -> AppResult<StoredRun> {
    let store = RunStore::for_study(study_path)?;
    Ok(StoredRun {
        manifest: store.load_manifest(run_id)?,
        results_csv: store.load_results(run_id)?,
        report: store.load_report(run_id)?,
    })
}
