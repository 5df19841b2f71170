//! Stream mixer and splitter.
//!
//! The mixer takes the pressure of its first inlet. The splitter carries one
//! split fraction per outlet except the last, which takes the remainder.

use wf_graph::PortKind;
use wf_model::{Expr, Model, ModelError, ModelResult, Variable};

use crate::stream::ComponentList;
use crate::unit::{Capabilities, PerfVar, Unit, UnitParts, UnitPort, current};

pub(crate) fn build_mixer(
    model: &mut Model,
    prefix: &str,
    ports: &[UnitPort],
    components: &ComponentList,
) -> ModelResult<UnitParts> {
    let inlets: Vec<_> = ports.iter().filter(|p| p.kind == PortKind::Inlet).collect();
    let outlet = &ports[inlets.len()].state;

    let mut constraints = Vec::new();
    for (c, j) in components.names().enumerate() {
        constraints.push(model.add_constraint(
            format!("{prefix}.material_balance[{j}]"),
            Expr::var(outlet.flow_mass_comp[c]),
            Expr::sum(inlets.iter().map(|p| Expr::var(p.state.flow_mass_comp[c]))),
        )?);
    }
    constraints.push(model.add_constraint(
        format!("{prefix}.pressure_equality"),
        Expr::var(outlet.pressure),
        Expr::var(inlets[0].state.pressure),
    )?);

    Ok(UnitParts {
        performance: Vec::new(),
        constraints,
        capabilities: Capabilities {
            initialize: Some(initialize_mixer),
            ..Capabilities::default()
        },
    })
}

fn initialize_mixer(unit: &Unit, model: &mut Model) -> ModelResult<()> {
    let inlets: Vec<_> = unit.inlets().map(|p| p.state.clone()).collect();
    let Some(outlet) = unit.outlets().next().map(|p| p.state.clone()) else {
        return Ok(());
    };
    for (c, &o) in outlet.flow_mass_comp.iter().enumerate() {
        let mut total = 0.0;
        for inlet in &inlets {
            total += current(model, inlet.flow_mass_comp[c])?;
        }
        model.set_value(o, total);
    }
    let p = current(model, inlets[0].pressure)?;
    model.set_value(outlet.pressure, p);
    Ok(())
}

pub(crate) fn build_splitter(
    model: &mut Model,
    prefix: &str,
    ports: &[UnitPort],
    components: &ComponentList,
) -> ModelResult<UnitParts> {
    let inlet = &ports[0].state;
    let outlets = &ports[1..];
    if outlets.len() < 2 {
        return Err(ModelError::InvalidHandle {
            what: format!("{prefix} needs at least two outlets"),
        });
    }
    let split = &outlets[..outlets.len() - 1];

    let mut fractions = Vec::with_capacity(split.len());
    for port in split {
        fractions.push(model.add_var(
            Variable::new(format!("{prefix}.split_fraction[{}]", port.name))
                .bounds(Some(0.0), Some(1.0))
                .units("dimensionless"),
        )?);
    }

    let mut constraints = Vec::new();
    for (port, &frac) in split.iter().zip(&fractions) {
        for (c, j) in components.names().enumerate() {
            constraints.push(model.add_constraint(
                format!("{prefix}.split_equation[{},{j}]", port.name),
                Expr::var(port.state.flow_mass_comp[c]),
                Expr::var(frac) * Expr::var(inlet.flow_mass_comp[c]),
            )?);
        }
    }
    for (c, j) in components.names().enumerate() {
        constraints.push(model.add_constraint(
            format!("{prefix}.material_balance[{j}]"),
            Expr::var(inlet.flow_mass_comp[c]),
            Expr::sum(outlets.iter().map(|p| Expr::var(p.state.flow_mass_comp[c]))),
        )?);
    }
    for port in outlets {
        constraints.push(model.add_constraint(
            format!("{prefix}.pressure_equality[{}]", port.name),
            Expr::var(port.state.pressure),
            Expr::var(inlet.pressure),
        )?);
    }

    let performance = split
        .iter()
        .zip(&fractions)
        .map(|(p, &f)| PerfVar::new(format!("Split Fraction [{}]", p.name), f))
        .collect();

    Ok(UnitParts {
        performance,
        constraints,
        capabilities: Capabilities {
            fixed_performance_vars: fractions,
            ..Capabilities::default()
        },
    })
}
