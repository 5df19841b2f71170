//! End-to-end sweeps on a bounded model and on a flowsheet case.

use wf_flowsheet::{Case, ComponentList, Database, InitializeOptions, UnitKind, initialize};
use wf_model::{Expr, Model, Variable};
use wf_solver::{SolveStatus, SolverError, SolverOptions, TerminationCondition, solve};
use wf_sweep::{SampleMode, Sampling, SweepSpec, run_sweep};

/// y == x with y bounded to [0, 3]; sampling x above 3 is infeasible.
fn bounded_copy() -> Model {
    let mut m = Model::new();
    let x = m.add_var(Variable::new("x").value(1.0).fixed()).unwrap();
    let y = m
        .add_var(Variable::new("y").value(1.0).bounds(Some(0.0), Some(3.0)))
        .unwrap();
    m.add_constraint("copy", Expr::var(y), Expr::var(x)).unwrap();
    m
}

fn optimize(m: &mut Model) -> Result<SolveStatus, SolverError> {
    solve(m, &SolverOptions::default(), false)
}

#[test]
fn eleven_samples_with_infeasible_tail() {
    let mut m = bounded_copy();
    let spec = SweepSpec::default()
        .input("x", "x", Sampling::linear(0.1, 5.0, 11))
        .output("y", "y");
    let table = run_sweep(&mut m, &spec, optimize).unwrap();

    assert_eq!(table.len(), 11);
    let x = table.column("x").unwrap();
    let y = table.column("y").unwrap();
    assert_eq!(x[0], 0.1);
    assert_eq!(x[10], 5.0);
    for (xi, yi) in x.iter().zip(&y) {
        if *xi > 3.0 {
            assert!(yi.is_nan(), "x = {xi} should have failed");
        } else {
            assert!((yi - xi).abs() < 1e-8);
        }
    }
    // 3.04 through 5.0
    assert_eq!(table.failed_count(), 5);
}

#[test]
fn interior_failure_is_interpolated() {
    let mut m = bounded_copy();
    let spec = SweepSpec::default()
        .input("x", "x", Sampling::linear(0.0, 2.0, 5))
        .output("y", "y")
        .with_interpolation();
    // force the middle sample to fail
    let table = run_sweep(&mut m, &spec, |m: &mut Model| {
        if m.value(m.var_id("x").unwrap()) == Some(1.0) {
            return Ok(SolveStatus {
                termination: TerminationCondition::MaxIterations,
                iterations: 100,
                residual_norm: 1.0,
            });
        }
        optimize(m)
    })
    .unwrap();

    assert_eq!(table.failed_count(), 1);
    assert!(!table.rows()[2].converged);
    let y = table.column("y").unwrap();
    assert!((y[2] - 1.0).abs() < 1e-8);
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
    }
}

/// s == a + b with a and b fixed.
fn sum_model() -> Model {
    let mut m = Model::new();
    let a = m.add_var(Variable::new("a").value(0.0).fixed()).unwrap();
    let b = m.add_var(Variable::new("b").value(0.0).fixed()).unwrap();
    let s = m.add_var(Variable::new("s").value(0.0)).unwrap();
    m.add_constraint("sum", Expr::var(s), Expr::var(a) + Expr::var(b))
        .unwrap();
    m
}

#[test]
fn cartesian_and_paired_row_counts() {
    let mut m = sum_model();

    let cartesian = SweepSpec::default()
        .input("a", "a", Sampling::linear(0.0, 1.0, 3))
        .input("b", "b", Sampling::list(vec![10.0, 20.0]))
        .output("s", "s");
    let table = run_sweep(&mut m, &cartesian, optimize).unwrap();
    assert_eq!(table.len(), 6);
    assert_close(
        &table.column("s").unwrap(),
        &[10.0, 20.0, 10.5, 20.5, 11.0, 21.0],
    );

    let paired = SweepSpec::new(SampleMode::Paired)
        .input("a", "a", Sampling::linear(0.0, 1.0, 2))
        .input("b", "b", Sampling::list(vec![10.0, 20.0]))
        .output("s", "s");
    let table = run_sweep(&mut m, &paired, optimize).unwrap();
    assert_eq!(table.len(), 2);
    assert_close(&table.column("s").unwrap(), &[10.0, 21.0]);
}

#[test]
fn seeded_monte_carlo_sweep_is_reproducible() {
    let spec = SweepSpec::new(SampleMode::Paired)
        .input("a", "a", Sampling::latin_hypercube(0.0, 1.0, 12))
        .input("b", "b", Sampling::normal(10.0, 2.0, 12))
        .output("s", "s")
        .with_seed(1);

    let first = run_sweep(&mut sum_model(), &spec, optimize).unwrap();
    let second = run_sweep(&mut sum_model(), &spec, optimize).unwrap();
    assert_eq!(first.failed_count(), 0);
    assert_eq!(first, second);
    assert_eq!(first.to_delimited(','), second.to_delimited(','));

    let a = first.column("a").unwrap();
    let b = first.column("b").unwrap();
    let s = first.column("s").unwrap();
    for i in 0..12 {
        assert!((s[i] - (a[i] + b[i])).abs() < 1e-8);
    }

    let reseeded = run_sweep(&mut sum_model(), &spec.clone().with_seed(2), optimize).unwrap();
    assert_ne!(reseeded.column("a"), first.column("a"));
}

fn uf_case() -> Case {
    let db = Database::embedded().unwrap();
    let mut case = Case::new("uf", ComponentList::new(["tss"]).unwrap());
    case.add_unit("feed", UnitKind::Feed).unwrap();
    case.add_unit(
        "unit",
        UnitKind::Separator {
            tech: "ultra_filtration".into(),
        },
    )
    .unwrap();
    case.add_unit("product", UnitKind::Product).unwrap();
    case.add_unit("waste", UnitKind::Product).unwrap();
    case.connect("feed", "outlet", "unit", "inlet").unwrap();
    case.connect("unit", "treated", "product", "inlet").unwrap();
    case.connect("unit", "byproduct", "waste", "inlet").unwrap();
    case.seal().unwrap();
    case.load_parameters_from_database("unit", &db, false)
        .unwrap();
    case.fix_feed(
        "feed",
        &[("H2O".into(), 10.0), ("tss".into(), 1.0)],
        101_325.0,
    )
    .unwrap();
    case
}

#[test]
fn flowsheet_sweep_over_recovery() {
    let mut case = uf_case();
    let spec = SweepSpec::default()
        .input(
            "recovery",
            "fs.unit.recovery_frac_mass_H2O",
            Sampling::linear(0.5, 0.9, 5),
        )
        .output("treated_water", "fs.product.inlet.flow_mass_comp[H2O]")
        .output("treated_flow", "fs.unit.treated.flow_vol");

    let table = run_sweep(&mut case, &spec, |case: &mut Case| {
        initialize(case, &InitializeOptions::default())?;
        case.solve(&SolverOptions::default(), false)
            .map_err(SolverError::from)
    })
    .unwrap();

    assert_eq!(table.failed_count(), 0);
    let recovery = table.column("recovery").unwrap();
    let water = table.column("treated_water").unwrap();
    for (r, w) in recovery.iter().zip(&water) {
        assert!((w - 10.0 * r).abs() < 1e-8);
    }
    // recovery is back at its database value
    let r = case
        .model()
        .var_id("fs.unit.recovery_frac_mass_H2O")
        .unwrap();
    assert!(case.model().is_fixed(r));
    assert_eq!(case.model().value(r), Some(0.95));
}
