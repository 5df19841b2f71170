//! Sweep execution.
//!
//! Setup resolves every field once and releases the target variables.
//! Each sample then fixes the targets at its values and calls the optimize
//! callable; a non-optimal status or a convergence error records NaN for
//! every output, any other error aborts the sweep. Target variables get
//! their original fixed status and value back when the sweep ends.

use std::collections::HashSet;
use std::fmt::Display;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use wf_core::VarId;
use wf_model::{Handle, Model};
use wf_solver::{SolveStatus, SolverError};

use crate::case::SweepCase;
use crate::error::{SweepError, SweepResult};
use crate::sampling::Grid;
use crate::spec::SweepSpec;
use crate::table::{ResultRow, ResultTable};

#[derive(Debug, Clone)]
struct Target {
    var: VarId,
    fixed: bool,
    value: Option<f64>,
}

/// Field names resolved to model handles.
#[derive(Debug, Clone)]
struct Resolved {
    targets: Vec<Target>,
    outputs: Vec<Handle>,
    grid: Grid,
    /// Values after setup; failed samples roll back to them.
    baseline: Vec<Option<f64>>,
}

fn resolve(model: &Model, spec: &SweepSpec) -> SweepResult<Resolved> {
    let grid = spec.grid()?;

    let mut targets = Vec::with_capacity(spec.inputs.len());
    let mut seen = HashSet::new();
    for field in &spec.inputs {
        let var = match model.lookup(&field.target) {
            Some(Handle::Var(id)) => id,
            Some(_) => {
                return Err(SweepError::NotAVariable {
                    field: field.name.clone(),
                    reference: field.target.clone(),
                });
            }
            None => {
                return Err(SweepError::UnresolvedTarget {
                    field: field.name.clone(),
                    reference: field.target.clone(),
                });
            }
        };
        if !seen.insert(var) {
            return Err(SweepError::DuplicateTarget {
                field: field.name.clone(),
                reference: field.target.clone(),
            });
        }
        targets.push(Target {
            var,
            fixed: model.is_fixed(var),
            value: model.value(var),
        });
    }

    let mut outputs = Vec::with_capacity(spec.outputs.len());
    for field in &spec.outputs {
        let handle = model
            .lookup(&field.reference)
            .ok_or_else(|| SweepError::UnresolvedOutput {
                field: field.name.clone(),
                reference: field.reference.clone(),
            })?;
        outputs.push(handle);
    }

    Ok(Resolved {
        targets,
        outputs,
        grid,
        baseline: model.snapshot_values(),
    })
}

fn setup<C: SweepCase>(case: &mut C, spec: &SweepSpec) -> SweepResult<Resolved> {
    let resolved = resolve(case.model(), spec)?;
    let model = case.model_mut();
    for t in &resolved.targets {
        model.unfix(t.var);
    }
    debug!(
        inputs = resolved.targets.len(),
        outputs = resolved.outputs.len(),
        samples = resolved.grid.len(),
        "sweep setup"
    );
    Ok(resolved)
}

fn restore_targets<C: SweepCase>(case: &mut C, resolved: &Resolved) {
    let model = case.model_mut();
    for t in &resolved.targets {
        match (t.fixed, t.value) {
            (true, Some(v)) => model.fix(t.var, v),
            (_, value) => {
                model.unfix(t.var);
                if let Some(v) = value {
                    model.set_value(t.var, v);
                }
            }
        }
    }
}

/// Run optimize once; `Ok(false)` is a tolerated failure.
fn attempt<C, F>(case: &mut C, optimize: &mut F, sample: usize) -> SweepResult<bool>
where
    F: FnMut(&mut C) -> Result<SolveStatus, SolverError>,
{
    match optimize(case) {
        Ok(status) => {
            if !status.is_optimal() {
                debug!(sample, termination = %status.termination, "sample did not converge");
            }
            Ok(status.is_optimal())
        }
        Err(e) if e.is_convergence_failure() => {
            debug!(sample, error = %e, "sample did not converge");
            Ok(false)
        }
        Err(source) => Err(SweepError::Optimize { sample, source }),
    }
}

fn run_sample<C, F, R, E>(
    case: &mut C,
    resolved: &Resolved,
    sample: usize,
    optimize: &mut F,
    mut reinitialize: Option<&mut R>,
) -> SweepResult<ResultRow>
where
    C: SweepCase,
    F: FnMut(&mut C) -> Result<SolveStatus, SolverError>,
    R: FnMut(&mut C) -> Result<(), E>,
    E: Display,
{
    let inputs = resolved.grid.sample(sample);
    {
        let model = case.model_mut();
        for (t, &v) in resolved.targets.iter().zip(&inputs) {
            model.fix(t.var, v);
        }
    }

    let mut converged = attempt(case, optimize, sample)?;
    if !converged && let Some(reinit) = reinitialize.as_mut() {
        case.model_mut().restore_values(&resolved.baseline);
        let model = case.model_mut();
        for (t, &v) in resolved.targets.iter().zip(&inputs) {
            model.fix(t.var, v);
        }
        match reinit(case) {
            Ok(()) => converged = attempt(case, optimize, sample)?,
            Err(e) => debug!(sample, error = %e, "reinitialization failed"),
        }
    }

    let outputs = if converged {
        let model = case.model();
        resolved
            .outputs
            .iter()
            .map(|&h| {
                model
                    .eval_handle(h)
                    .ok()
                    .filter(|v| v.is_finite())
                    .unwrap_or(f64::NAN)
            })
            .collect()
    } else {
        case.model_mut().restore_values(&resolved.baseline);
        vec![f64::NAN; resolved.outputs.len()]
    };

    Ok(ResultRow {
        sample,
        inputs,
        outputs,
        converged,
    })
}

fn finish(spec: &SweepSpec, resolved: Resolved, rows: Vec<ResultRow>) -> ResultTable {
    let mut table = ResultTable::new(
        spec.inputs.iter().map(|f| f.name.clone()).collect(),
        spec.outputs.iter().map(|f| f.name.clone()).collect(),
        rows,
        resolved.grid,
    );
    if spec.interpolate {
        table.interpolate_failed();
    }

    let failed = table.failed_count();
    if failed > 0 {
        warn!(failed, samples = table.len(), "sweep samples did not converge");
    }
    info!(samples = table.len(), failed, "sweep finished");
    table
}

fn run_sequential<C, F, R, E>(
    case: &mut C,
    spec: &SweepSpec,
    mut optimize: F,
    mut reinitialize: Option<R>,
) -> SweepResult<ResultTable>
where
    C: SweepCase,
    F: FnMut(&mut C) -> Result<SolveStatus, SolverError>,
    R: FnMut(&mut C) -> Result<(), E>,
    E: Display,
{
    let resolved = setup(case, spec)?;
    let mut rows = Vec::with_capacity(resolved.grid.len());
    let mut outcome = Ok(());
    for sample in 0..resolved.grid.len() {
        match run_sample(case, &resolved, sample, &mut optimize, reinitialize.as_mut()) {
            Ok(row) => rows.push(row),
            Err(e) => {
                outcome = Err(e);
                break;
            }
        }
    }
    restore_targets(case, &resolved);
    outcome?;
    Ok(finish(spec, resolved, rows))
}

/// Run every sample of `spec` on `case`, in order.
///
/// `optimize` wraps whatever makes one sample converge (initialize, scale,
/// solve); extra arguments are captured by the closure.
pub fn run_sweep<C, F>(case: &mut C, spec: &SweepSpec, optimize: F) -> SweepResult<ResultTable>
where
    C: SweepCase,
    F: FnMut(&mut C) -> Result<SolveStatus, SolverError>,
{
    run_sequential(
        case,
        spec,
        optimize,
        None::<fn(&mut C) -> Result<(), SolverError>>,
    )
}

/// As [`run_sweep`], but a failed sample is rolled back, `reinitialize`d
/// and optimized once more before it is recorded as failed.
pub fn run_sweep_with_retry<C, F, R, E>(
    case: &mut C,
    spec: &SweepSpec,
    optimize: F,
    reinitialize: R,
) -> SweepResult<ResultTable>
where
    C: SweepCase,
    F: FnMut(&mut C) -> Result<SolveStatus, SolverError>,
    R: FnMut(&mut C) -> Result<(), E>,
    E: Display,
{
    run_sequential(case, spec, optimize, Some(reinitialize))
}

/// Run samples on the rayon pool, each worker on its own clone of `case`.
///
/// Every sample starts from the post-setup state, so rows do not depend on
/// scheduling; they are returned in sample order.
pub fn run_sweep_parallel<C, F>(case: &mut C, spec: &SweepSpec, optimize: F) -> SweepResult<ResultTable>
where
    C: SweepCase + Clone + Send + Sync,
    F: Fn(&mut C) -> Result<SolveStatus, SolverError> + Sync,
{
    let resolved = setup(case, spec)?;
    let template: &C = case;
    let rows: SweepResult<Vec<ResultRow>> = (0..resolved.grid.len())
        .into_par_iter()
        .map_init(
            || template.clone(),
            |local, sample| {
                local.model_mut().restore_values(&resolved.baseline);
                let mut f = |c: &mut C| optimize(c);
                run_sample(
                    local,
                    &resolved,
                    sample,
                    &mut f,
                    None::<&mut fn(&mut C) -> Result<(), SolverError>>,
                )
            },
        )
        .collect();
    restore_targets(case, &resolved);
    Ok(finish(spec, resolved, rows?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::Sampling;
    use wf_model::{Expr, Variable};
    use wf_solver::{SolverOptions, TerminationCondition, solve};

    /// y == x, y in [0, 3], x fixed at 1.
    fn bounded_copy() -> Model {
        let mut m = Model::new();
        let x = m.add_var(Variable::new("x").value(1.0).fixed()).unwrap();
        let y = m
            .add_var(Variable::new("y").value(1.0).bounds(Some(0.0), Some(3.0)))
            .unwrap();
        m.add_constraint("copy", Expr::var(y), Expr::var(x)).unwrap();
        m.add_expression("twice_y", Expr::var(y) * 2.0, None).unwrap();
        m
    }

    fn optimize(m: &mut Model) -> Result<SolveStatus, SolverError> {
        solve(m, &SolverOptions::default(), false)
    }

    #[test]
    fn setup_errors_run_no_sample() {
        let mut m = bounded_copy();
        let mut calls = 0;
        let mut count = |m: &mut Model| {
            calls += 1;
            optimize(m)
        };

        let spec = SweepSpec::default().input("x", "nope", Sampling::linear(0.0, 1.0, 2));
        assert!(matches!(
            run_sweep(&mut m, &spec, &mut count),
            Err(SweepError::UnresolvedTarget { .. })
        ));

        let spec = SweepSpec::default().input("x", "copy", Sampling::linear(0.0, 1.0, 2));
        assert!(matches!(
            run_sweep(&mut m, &spec, &mut count),
            Err(SweepError::NotAVariable { .. })
        ));

        let spec = SweepSpec::default()
            .input("a", "x", Sampling::linear(0.0, 1.0, 2))
            .input("b", "x", Sampling::linear(0.0, 1.0, 2));
        assert!(matches!(
            run_sweep(&mut m, &spec, &mut count),
            Err(SweepError::DuplicateTarget { .. })
        ));

        let spec = SweepSpec::default()
            .input("x", "x", Sampling::linear(0.0, 1.0, 2))
            .output("z", "missing");
        let err = run_sweep(&mut m, &spec, &mut count).unwrap_err();
        assert!(err.is_setup_error());
        assert!(err.to_string().contains("missing"));

        assert_eq!(calls, 0);
        assert!(m.is_fixed(m.var_id("x").unwrap()));
    }

    #[test]
    fn non_convergence_becomes_nan() {
        let mut m = bounded_copy();
        let spec = SweepSpec::default()
            .input("x", "x", Sampling::list(vec![1.0, 4.0, 2.0]))
            .output("y", "y")
            .output("twice_y", "twice_y");
        let table = run_sweep(&mut m, &spec, optimize).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.failed_count(), 1);
        let y = table.column("y").unwrap();
        assert!((y[0] - 1.0).abs() < 1e-9);
        assert!(y[1].is_nan());
        assert!((y[2] - 2.0).abs() < 1e-9);
        assert!(table.column("twice_y").unwrap()[1].is_nan());
        assert_eq!(table.column("x").unwrap(), vec![1.0, 4.0, 2.0]);
    }

    #[test]
    fn convergence_error_is_tolerated_other_errors_abort() {
        let mut m = bounded_copy();
        let spec = SweepSpec::default()
            .input("x", "x", Sampling::list(vec![1.0, 4.0]))
            .output("y", "y");

        let table = run_sweep(&mut m, &spec, |m: &mut Model| {
            solve(m, &SolverOptions::default(), true)
        })
        .unwrap();
        assert_eq!(table.failed_count(), 1);

        let err = run_sweep(&mut m, &spec, |_: &mut Model| {
            Err(SolverError::Numeric {
                what: "broken".into(),
            })
        })
        .unwrap_err();
        assert!(matches!(err, SweepError::Optimize { sample: 0, .. }));
        // targets restored after the aborted sweep
        let x = m.var_id("x").unwrap();
        assert!(m.is_fixed(x));
        assert_eq!(m.value(x), Some(1.0));
    }

    #[test]
    fn targets_restored_after_sweep() {
        let mut m = bounded_copy();
        let spec = SweepSpec::default()
            .input("x", "x", Sampling::linear(0.5, 2.5, 3))
            .output("y", "y");
        run_sweep(&mut m, &spec, optimize).unwrap();
        let x = m.var_id("x").unwrap();
        assert!(m.is_fixed(x));
        assert_eq!(m.value(x), Some(1.0));
    }

    #[test]
    fn retry_runs_reinitialize_on_failure() {
        let mut m = bounded_copy();
        let spec = SweepSpec::default()
            .input("x", "x", Sampling::list(vec![1.0, 2.0]))
            .output("y", "y");
        let mut first = true;
        let flaky = |m: &mut Model| {
            if first && m.value(m.var_id("x").unwrap()) == Some(2.0) {
                first = false;
                return Ok(SolveStatus {
                    termination: TerminationCondition::MaxIterations,
                    iterations: 100,
                    residual_norm: 1.0,
                });
            }
            optimize(m)
        };
        let mut reinits = 0;
        let table = run_sweep_with_retry(&mut m, &spec, flaky, |_: &mut Model| {
            reinits += 1;
            Ok::<(), String>(())
        })
        .unwrap();
        assert_eq!(reinits, 1);
        assert_eq!(table.failed_count(), 0);
        assert!((table.column("y").unwrap()[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_matches_sequential() {
        let spec = SweepSpec::default()
            .input("x", "x", Sampling::linear(0.1, 5.0, 11))
            .output("y", "y");
        let mut a = bounded_copy();
        let mut b = bounded_copy();
        let seq = run_sweep(&mut a, &spec, optimize).unwrap();
        let par = run_sweep_parallel(&mut b, &spec, optimize).unwrap();
        assert_eq!(seq.len(), par.len());
        for (r, s) in seq.rows().iter().zip(par.rows()) {
            assert_eq!(r.inputs, s.inputs);
            assert_eq!(r.converged, s.converged);
            for (u, v) in r.outputs.iter().zip(&s.outputs) {
                assert!((u.is_nan() && v.is_nan()) || (u - v).abs() < 1e-9);
            }
        }
    }
}
