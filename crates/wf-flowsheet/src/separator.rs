//! Zero-order separator (ultrafiltration, media filtration, GAC, RO,
//! dewatering).
//!
//! ## Model
//!
//! ```text
//! treated[H2O]  = recovery * inlet[H2O]
//! byproduct[j]  = removal[j] * inlet[j]             (solutes)
//! inlet[j]      = treated[j] + byproduct[j]         (all components)
//! P_treated     = P_byproduct = P_inlet
//! electricity   = intensity * Q_inlet * 3600        (kW)
//! ```

use wf_core::constants::seconds_per_hour;
use wf_model::{Expr, Model, ModelResult, Variable};

use crate::database::Database;
use crate::error::{FlowsheetError, FlowsheetResult};
use crate::stream::{ComponentList, WATER};
use crate::unit::{Capabilities, PerfVar, Unit, UnitParts, UnitPort, current};

const INLET: usize = 0;
const TREATED: usize = 1;
const BYPRODUCT: usize = 2;

pub(crate) fn build(
    model: &mut Model,
    prefix: &str,
    ports: &[UnitPort],
    components: &ComponentList,
) -> ModelResult<UnitParts> {
    let inlet = &ports[INLET].state;
    let treated = &ports[TREATED].state;
    let byproduct = &ports[BYPRODUCT].state;

    let recovery = model.add_var(
        Variable::new(format!("{prefix}.recovery_frac_mass_H2O"))
            .bounds(Some(1e-8), Some(1.0000001))
            .units("dimensionless"),
    )?;
    let mut removal = Vec::with_capacity(components.solutes().len());
    for j in components.solutes() {
        removal.push(model.add_var(
            Variable::new(format!("{prefix}.removal_frac_mass_solute[{j}]"))
                .lower(0.0)
                .units("dimensionless"),
        )?);
    }
    let intensity = model.add_var(
        Variable::new(format!("{prefix}.energy_electric_flow_vol_inlet")).units("kWh/m^3"),
    )?;
    let electricity = model.add_var(
        Variable::new(format!("{prefix}.electricity"))
            .lower(0.0)
            .units("kW"),
    )?;

    let mut constraints = Vec::new();
    constraints.push(model.add_constraint(
        format!("{prefix}.water_recovery_equation"),
        Expr::var(treated.flow_mass_comp[0]),
        Expr::var(recovery) * Expr::var(inlet.flow_mass_comp[0]),
    )?);
    for (k, j) in components.solutes().iter().enumerate() {
        constraints.push(model.add_constraint(
            format!("{prefix}.solute_removal_equation[{j}]"),
            Expr::var(byproduct.flow_mass_comp[k + 1]),
            Expr::var(removal[k]) * Expr::var(inlet.flow_mass_comp[k + 1]),
        )?);
    }
    for (c, j) in components.names().enumerate() {
        constraints.push(model.add_constraint(
            format!("{prefix}.mass_balance[{j}]"),
            Expr::var(inlet.flow_mass_comp[c]),
            Expr::var(treated.flow_mass_comp[c]) + Expr::var(byproduct.flow_mass_comp[c]),
        )?);
    }
    for port in [&ports[TREATED], &ports[BYPRODUCT]] {
        constraints.push(model.add_constraint(
            format!("{prefix}.pressure_balance[{}]", port.name),
            Expr::var(port.state.pressure),
            Expr::var(inlet.pressure),
        )?);
    }
    constraints.push(model.add_constraint(
        format!("{prefix}.electricity_consumption"),
        Expr::var(electricity),
        Expr::var(intensity) * inlet.flow_vol_expr() * seconds_per_hour(),
    )?);

    let mut performance = vec![
        PerfVar::new("Electricity Demand", electricity),
        PerfVar::new("Electricity Intensity", intensity),
        PerfVar::new("Water Recovery", recovery),
    ];
    for (j, &r) in components.solutes().iter().zip(&removal) {
        performance.push(PerfVar::new(format!("Solute Removal [{j}]"), r));
    }

    let mut fixed_performance_vars = vec![recovery, intensity];
    fixed_performance_vars.extend(removal.iter().copied());

    Ok(UnitParts {
        performance,
        constraints,
        capabilities: Capabilities {
            fixed_performance_vars,
            initialize: Some(initialize),
            scaling: Some(scale),
            flow_rate: Some(inlet_flow),
        },
    })
}

/// Fix recovery, removal and energy intensity from the database entry.
pub(crate) fn load_parameters(
    unit: &Unit,
    model: &mut Model,
    db: &Database,
    components: &ComponentList,
    use_default_removal: bool,
) -> FlowsheetResult<()> {
    let tech = unit.tech().ok_or_else(|| FlowsheetError::WrongUnitKind {
        unit: unit.name.clone(),
        expected: "separator",
    })?;
    let params = db.get_unit_operation_parameters(tech)?;
    let path = unit.path();

    let recovery = model.var_id(&format!("{path}.recovery_frac_mass_{WATER}"))?;
    model.fix(recovery, params.recovery_frac_mass_h2o.value);
    let intensity = model.var_id(&format!("{path}.energy_electric_flow_vol_inlet"))?;
    model.fix(intensity, params.energy_electric_flow_vol_inlet.value);
    for j in components.solutes() {
        let removal = model.var_id(&format!("{path}.removal_frac_mass_solute[{j}]"))?;
        model.fix(removal, params.removal_for(j, use_default_removal)?);
    }
    Ok(())
}

fn inlet_flow(unit: &Unit) -> Expr {
    unit.ports[INLET].state.flow_vol_expr()
}

/// Fraction of inlet component `c` leaving with the treated stream.
fn treated_fraction(unit: &Unit, model: &Model, c: usize) -> ModelResult<f64> {
    // performance: demand, intensity, recovery, then one removal per solute
    if c == 0 {
        return current(model, unit.performance[2].var);
    }
    Ok(1.0 - current(model, unit.performance[c + 2].var)?)
}

/// Closed-form outlet state from the inlet state and fixed performance.
fn initialize(unit: &Unit, model: &mut Model) -> ModelResult<()> {
    let inlet = unit.ports[INLET].state.clone();
    let treated = unit.ports[TREATED].state.clone();
    let byproduct = unit.ports[BYPRODUCT].state.clone();

    for c in 0..inlet.flow_mass_comp.len() {
        let m_in = current(model, inlet.flow_mass_comp[c])?;
        let to_treated = treated_fraction(unit, model, c)? * m_in;
        model.set_value(treated.flow_mass_comp[c], to_treated);
        model.set_value(byproduct.flow_mass_comp[c], m_in - to_treated);
    }
    let p_in = current(model, inlet.pressure)?;
    model.set_value(treated.pressure, p_in);
    model.set_value(byproduct.pressure, p_in);

    if let (Some(electricity), Some(intensity)) = (
        unit.performance_var("Electricity Demand"),
        unit.performance_var("Electricity Intensity"),
    ) {
        let q = inlet.flow_vol_value(model)?;
        let e = current(model, intensity)? * q * seconds_per_hour();
        model.set_value(electricity, e);
    }
    Ok(())
}

/// Hint outlet flow magnitudes from the inlet state; high removal leaves
/// treated solute flows orders of magnitude below the inlet.
fn scale(unit: &Unit, model: &mut Model) {
    let inlet = &unit.ports[INLET].state;
    let treated = &unit.ports[TREATED].state;
    let byproduct = &unit.ports[BYPRODUCT].state;
    for c in 0..inlet.flow_mass_comp.len() {
        let (Some(m_in), Ok(frac)) = (
            model.value(inlet.flow_mass_comp[c]),
            treated_fraction(unit, model, c),
        ) else {
            continue;
        };
        for (var, m) in [
            (treated.flow_mass_comp[c], frac * m_in),
            (byproduct.flow_mass_comp[c], (1.0 - frac) * m_in),
        ] {
            if m.abs() > 0.0 && m.is_finite() {
                model.var_mut(var).scale_hint = Some(m.abs().max(1e-8));
            }
        }
    }
}
