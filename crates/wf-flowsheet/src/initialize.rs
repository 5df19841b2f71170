//! Sequential-modular initialization of a sealed case.
//!
//! Blocks are visited in topological order. Each block receives its inlet
//! state from upstream, runs its initialization hook, then solves its own
//! equations with the inlet state held. Recycle loops are closed by
//! repeating the pass and substituting tear-arc values until they settle.

use tracing::{debug, info, warn};
use wf_core::constants::P_ATM_PA;
use wf_core::{BlockId, VarId};
use wf_model::{Model, ModelError};
use wf_solver::{SolverError, SolverOptions, SubSystem, solve_subsystem};

use crate::case::{Case, Link};
use crate::error::FlowsheetResult;
use crate::unit::{Unit, current};

#[derive(Debug, Clone, PartialEq)]
pub struct InitializeOptions {
    pub solver: SolverOptions,
    /// Upper bound on sequential passes when the case has tear arcs.
    pub max_tear_passes: usize,
    /// Relative tear mismatch below which passes stop.
    pub tear_tolerance: f64,
}

impl Default for InitializeOptions {
    fn default() -> Self {
        Self {
            solver: SolverOptions::default(),
            max_tear_passes: 50,
            tear_tolerance: 1e-8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializeReport {
    pub passes: usize,
    pub tear_residual: f64,
    /// Units whose block-local solve did not converge on the last pass.
    pub unconverged: Vec<String>,
}

/// Initialize every block of `case` in topological order.
///
/// Returns `Uninitialized` when a block needs a value nobody set (a feed
/// state or fixed performance variable left empty). A block whose local
/// solve fails keeps its best guess and is listed in the report.
pub fn initialize(case: &mut Case, options: &InitializeOptions) -> FlowsheetResult<InitializeReport> {
    let order = case.graph()?.topological_order().to_vec();
    let units: Vec<Unit> = order
        .iter()
        .filter_map(|&b| case.unit_by_block(b).cloned())
        .collect();
    let links = case.links().to_vec();
    let has_tears = links.iter().any(|l| l.tear);
    let feed_pressure = feed_pressure(case);
    let model = case.model_mut();

    check_specification(model, &units)?;
    for link in links.iter().filter(|l| l.tear) {
        seed_tear(model, link, feed_pressure);
    }

    let mut passes = 0;
    let mut tear_residual = 0.0;
    let mut unconverged = Vec::new();
    loop {
        passes += 1;
        unconverged.clear();
        for unit in &units {
            propagate_inlets(model, unit.block, &links)?;
            if !initialize_block(model, unit, &options.solver)? {
                unconverged.push(unit.name.clone());
            }
        }
        if !has_tears {
            break;
        }

        tear_residual = tear_mismatch(model, &links)?;
        debug!(pass = passes, residual = tear_residual, "tear pass");
        if tear_residual <= options.tear_tolerance {
            break;
        }
        if passes >= options.max_tear_passes {
            warn!(
                passes,
                residual = tear_residual,
                "tear streams did not settle; continuing with last pass"
            );
            break;
        }
        for link in links.iter().filter(|l| l.tear) {
            copy_state(model, link)?;
        }
    }

    info!(
        blocks = units.len(),
        passes,
        unconverged = unconverged.len(),
        "initialized case"
    );
    Ok(InitializeReport {
        passes,
        tear_residual,
        unconverged,
    })
}

fn feed_pressure(case: &Case) -> f64 {
    case.graph()
        .ok()
        .and_then(|g| case.unit_by_block(g.feed()))
        .and_then(|feed| feed.outlets().next())
        .and_then(|port| case.model().value(port.state.pressure))
        .unwrap_or(P_ATM_PA)
}

/// Fixed performance variables need values; free ones are reported.
fn check_specification(model: &Model, units: &[Unit]) -> FlowsheetResult<()> {
    for unit in units {
        for &v in &unit.capabilities.fixed_performance_vars {
            let var = model.var(v);
            if var.value.is_none() {
                return Err(ModelError::Uninitialized {
                    name: var.name.clone(),
                }
                .into());
            }
            if !var.fixed {
                warn!(unit = %unit.name, variable = %var.name, "performance variable is not fixed");
            }
        }
    }
    Ok(())
}

/// Zero flow at the feed pressure for tear destinations without a guess.
fn seed_tear(model: &mut Model, link: &Link, pressure: f64) {
    for &v in &link.destination.flow_mass_comp {
        if model.value(v).is_none() {
            model.set_value(v, 0.0);
        }
    }
    if model.value(link.destination.pressure).is_none() {
        model.set_value(link.destination.pressure, pressure);
    }
}

fn copy_state(model: &mut Model, link: &Link) -> FlowsheetResult<()> {
    let pairs: Vec<(VarId, VarId)> = link.source.vars().zip(link.destination.vars()).collect();
    for (src, dst) in pairs {
        let v = current(model, src)?;
        model.set_value(dst, v);
    }
    Ok(())
}

/// Copy upstream outlet values into the inlets of `block` (tear arcs excepted).
fn propagate_inlets(model: &mut Model, block: BlockId, links: &[Link]) -> FlowsheetResult<()> {
    for link in links
        .iter()
        .filter(|l| l.destination_unit == block && !l.tear)
    {
        copy_state(model, link)?;
    }
    Ok(())
}

/// Hook, then a block-local solve with the inlet state held.
/// Returns whether the local solve converged.
fn initialize_block(model: &mut Model, unit: &Unit, options: &SolverOptions) -> FlowsheetResult<bool> {
    if let Some(hook) = unit.capabilities.initialize {
        hook(unit, model)?;
    }

    let system = SubSystem::for_constraints(model, unit.constraints.clone(), &unit.inlet_vars());
    if system.is_empty() {
        return Ok(true);
    }
    match solve_subsystem(model, &system, options) {
        Ok(status) if status.is_optimal() => {
            debug!(unit = %unit.name, iterations = status.iterations, "block initialized");
            Ok(true)
        }
        Ok(status) => {
            warn!(
                unit = %unit.name,
                termination = %status.termination,
                "block initialization did not converge; keeping best guess"
            );
            Ok(false)
        }
        Err(SolverError::Model(e)) => Err(e.into()),
        Err(e) => {
            warn!(unit = %unit.name, error = %e, "block initialization failed; keeping best guess");
            Ok(false)
        }
    }
}

/// Largest relative difference between tear sources and destinations.
fn tear_mismatch(model: &Model, links: &[Link]) -> FlowsheetResult<f64> {
    let mut worst: f64 = 0.0;
    for link in links.iter().filter(|l| l.tear) {
        for (src, dst) in link.source.vars().zip(link.destination.vars()) {
            let s = current(model, src)?;
            let d = current(model, dst)?;
            worst = worst.max((s - d).abs() / (1.0 + s.abs()));
        }
    }
    Ok(worst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::error::FlowsheetError;
    use crate::stream::ComponentList;
    use crate::unit::UnitKind;

    fn separator_case(feed: bool) -> Case {
        let mut case = Case::new("init", ComponentList::new(["tss"]).unwrap());
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
        case.load_parameters_from_database("unit", &Database::embedded().unwrap(), false)
            .unwrap();
        if feed {
            case.fix_feed(
                "feed",
                &[("H2O".into(), 10.0), ("tss".into(), 1.0)],
                101_325.0,
            )
            .unwrap();
        }
        case
    }

    #[test]
    fn propagates_and_solves_blocks() {
        let mut case = separator_case(true);
        let report = initialize(&mut case, &InitializeOptions::default()).unwrap();
        assert_eq!(report.passes, 1);
        assert!(report.unconverged.is_empty());

        let m = case.model();
        let treated = m.eval_named("fs.product.inlet.flow_mass_comp[H2O]").unwrap();
        assert!((treated - 9.5).abs() < 1e-9);
        let sludge = m.eval_named("fs.waste.inlet.flow_mass_comp[tss]").unwrap();
        assert!((sludge - 0.97).abs() < 1e-9);
        assert!(m.max_residual().unwrap() < 1e-8);
    }

    #[test]
    fn missing_feed_is_uninitialized() {
        let mut case = separator_case(false);
        let err = initialize(&mut case, &InitializeOptions::default()).unwrap_err();
        assert_eq!(
            err,
            FlowsheetError::Model(ModelError::Uninitialized {
                name: "fs.feed.outlet.flow_mass_comp[H2O]".into()
            })
        );
    }

    #[test]
    fn requires_sealed_case() {
        let mut case = Case::new("open", ComponentList::new(["tss"]).unwrap());
        case.add_unit("feed", UnitKind::Feed).unwrap();
        assert_eq!(
            initialize(&mut case, &InitializeOptions::default()).unwrap_err(),
            FlowsheetError::NotSealed
        );
    }
}
