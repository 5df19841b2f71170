//! High-pressure pump feeding the membrane stage.
//!
//! ```text
//! outlet[j] = inlet[j]
//! deltaP    = P_out - P_in
//! W * eta   = Q_in * deltaP
//! ```
//!
//! The outlet pressure and efficiency are the unit's specification.

use wf_model::{Expr, Model, ModelResult, Variable};

use crate::stream::ComponentList;
use crate::unit::{Capabilities, PerfVar, Unit, UnitParts, UnitPort, current};

pub(crate) fn build(
    model: &mut Model,
    prefix: &str,
    ports: &[UnitPort],
    components: &ComponentList,
) -> ModelResult<UnitParts> {
    let inlet = &ports[0].state;
    let outlet = &ports[1].state;

    let work = model.add_var(
        Variable::new(format!("{prefix}.work_mechanical"))
            .lower(0.0)
            .units("W")
            .scale_hint(1e3),
    )?;
    let efficiency = model.add_var(
        Variable::new(format!("{prefix}.efficiency_pump"))
            .bounds(Some(1e-8), Some(1.0))
            .units("dimensionless"),
    )?;
    let delta_p = model.add_var(
        Variable::new(format!("{prefix}.deltaP"))
            .units("Pa")
            .scale_hint(1e5),
    )?;

    let mut constraints = Vec::new();
    for (c, j) in components.names().enumerate() {
        constraints.push(model.add_constraint(
            format!("{prefix}.material_balance[{j}]"),
            Expr::var(outlet.flow_mass_comp[c]),
            Expr::var(inlet.flow_mass_comp[c]),
        )?);
    }
    constraints.push(model.add_constraint(
        format!("{prefix}.pressure_change"),
        Expr::var(delta_p),
        Expr::var(outlet.pressure) - Expr::var(inlet.pressure),
    )?);
    constraints.push(model.add_constraint(
        format!("{prefix}.work_equation"),
        Expr::var(work) * Expr::var(efficiency),
        inlet.flow_vol_expr() * Expr::var(delta_p),
    )?);

    Ok(UnitParts {
        performance: vec![
            PerfVar::new("Efficiency", efficiency),
            PerfVar::new("Mechanical Work", work),
            PerfVar::new("Pressure Change", delta_p),
        ],
        constraints,
        capabilities: Capabilities {
            fixed_performance_vars: vec![efficiency, outlet.pressure],
            initialize: Some(initialize),
            scaling: None,
            flow_rate: Some(inlet_flow),
        },
    })
}

fn inlet_flow(unit: &Unit) -> Expr {
    unit.ports[0].state.flow_vol_expr()
}

fn initialize(unit: &Unit, model: &mut Model) -> ModelResult<()> {
    let inlet = unit.ports[0].state.clone();
    let outlet = unit.ports[1].state.clone();
    for (&i, &o) in inlet.flow_mass_comp.iter().zip(&outlet.flow_mass_comp) {
        let m = current(model, i)?;
        model.set_value(o, m);
    }

    let dp = current(model, outlet.pressure)? - current(model, inlet.pressure)?;
    let [efficiency, work, delta_p] = [0, 1, 2].map(|k| unit.performance[k].var);
    model.set_value(delta_p, dp);
    let eta = current(model, efficiency)?;
    if eta > 0.0 {
        let q = inlet.flow_vol_value(model)?;
        model.set_value(work, q * dp / eta);
    }
    Ok(())
}
