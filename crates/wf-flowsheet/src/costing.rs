//! Post-solve costing: closed-form expressions over the solved case.
//!
//! Economic parameters are fixed variables under `costing_param.`; unit and
//! system indicators are named expressions under `costing.`, so they can be
//! referenced as sweep outputs and are evaluated without iteration.
//!
//! ```text
//! capital_cost_total    = sum(unit capital)
//! investment_cost_total = capital_cost_total * factor_total_investment
//! operating_cost_MLC    = investment_cost_total * factor_MLC
//! operating_cost_total  = sum(unit operating) + operating_cost_MLC
//! LCOW = (investment_cost_total * factor_capital_annualization
//!         + operating_cost_total) / annual_water_production
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use wf_core::ExprId;
use wf_core::constants::{seconds_per_hour, seconds_per_year};
use wf_model::{Expr, Handle, Model, Variable};

use crate::case::Case;
use crate::database::Database;
use crate::error::{FlowsheetError, FlowsheetResult};
use crate::unit::{Unit, UnitKind};

/// Litres per cubic metre, for permeate flux given in L/m^2/hr.
const LITRES_PER_M3: f64 = 1000.0;

/// Economic assumptions shared by every unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostingParameters {
    /// Fraction of the year the plant operates.
    pub load_factor: f64,
    /// Investment cost per equipment cost.
    pub factor_total_investment: f64,
    /// Maintenance-labor-chemical cost, fraction of investment per year.
    #[serde(rename = "factor_MLC")]
    pub factor_mlc: f64,
    /// Capital annualization, fraction of investment per year.
    pub factor_capital_annualization: f64,
    /// Fraction of membrane area replaced per year.
    pub factor_membrane_replacement: f64,
    /// $/kWh
    pub electricity_cost: f64,
    /// $/m^2
    #[serde(rename = "RO_mem_cost")]
    pub ro_mem_cost: f64,
    /// $/W
    pub hp_pump_cost: f64,
}

impl Default for CostingParameters {
    fn default() -> Self {
        Self {
            load_factor: 0.9,
            factor_total_investment: 2.0,
            factor_mlc: 0.03,
            factor_capital_annualization: 0.1,
            factor_membrane_replacement: 0.2,
            electricity_cost: 0.07,
            ro_mem_cost: 30.0,
            hp_pump_cost: 53.0 / 1e5 * 3600.0,
        }
    }
}

impl CostingParameters {
    fn entries(&self) -> [(&'static str, f64, &'static str); 8] {
        [
            ("load_factor", self.load_factor, "dimensionless"),
            ("factor_total_investment", self.factor_total_investment, "dimensionless"),
            ("factor_MLC", self.factor_mlc, "1/year"),
            ("factor_capital_annualization", self.factor_capital_annualization, "1/year"),
            ("factor_membrane_replacement", self.factor_membrane_replacement, "1/year"),
            ("electricity_cost", self.electricity_cost, "USD/kWh"),
            ("RO_mem_cost", self.ro_mem_cost, "USD/m^2"),
            ("hp_pump_cost", self.hp_pump_cost, "USD/W"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitCosting {
    pub unit: String,
    pub capital_cost: ExprId,
    pub operating_cost: ExprId,
}

/// Handles of the costing expressions registered on a case.
#[derive(Debug, Clone, PartialEq)]
pub struct Costing {
    pub units: Vec<UnitCosting>,
    pub capital_cost_total: ExprId,
    pub investment_cost_total: ExprId,
    pub operating_cost_mlc: ExprId,
    pub operating_cost_total: ExprId,
    pub electricity_total: ExprId,
    pub annual_water_production: ExprId,
    pub lcow: ExprId,
    pub specific_energy_consumption: ExprId,
    pub system_recovery: ExprId,
}

/// Evaluated system indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostingSummary {
    pub capital_cost_total: f64,
    pub investment_cost_total: f64,
    pub operating_cost_mlc: f64,
    pub operating_cost_total: f64,
    /// kW
    pub electricity_total: f64,
    /// m^3/year
    pub annual_water_production: f64,
    /// $/m^3
    pub lcow: f64,
    /// kWh/m^3 of product
    pub specific_energy_consumption: f64,
    pub system_recovery: f64,
}

impl Costing {
    pub fn summary(&self, model: &Model) -> FlowsheetResult<CostingSummary> {
        let eval = |id: ExprId| model.eval_handle(Handle::Expr(id));
        Ok(CostingSummary {
            capital_cost_total: eval(self.capital_cost_total)?,
            investment_cost_total: eval(self.investment_cost_total)?,
            operating_cost_mlc: eval(self.operating_cost_mlc)?,
            operating_cost_total: eval(self.operating_cost_total)?,
            electricity_total: eval(self.electricity_total)?,
            annual_water_production: eval(self.annual_water_production)?,
            lcow: eval(self.lcow)?,
            specific_energy_consumption: eval(self.specific_energy_consumption)?,
            system_recovery: eval(self.system_recovery)?,
        })
    }
}

/// Per-unit capital, operating cost and electricity (kW) expressions.
struct UnitTerms {
    capital: Expr,
    operating: Expr,
    electricity: Option<Expr>,
}

/// Register costing parameters and expressions on `case`.
///
/// `product` names the sink whose inflow is the plant's water production.
pub fn add_costing(
    case: &mut Case,
    params: &CostingParameters,
    db: &Database,
    product: &str,
) -> FlowsheetResult<()> {
    if case.costing().is_some() {
        return Err(FlowsheetError::Config {
            what: "costing is already attached to this case".to_string(),
        });
    }
    let product_flow = product_unit_flow(case.unit(product)?)?;
    let feed_flow = {
        let graph = case.graph()?;
        let feed = case
            .unit_by_block(graph.feed())
            .and_then(|u| u.outlets().next())
            .ok_or_else(|| FlowsheetError::Config {
                what: "case has no feed outlet".to_string(),
            })?;
        feed.state.flow_vol_expr()
    };
    let units: Vec<Unit> = case.units().to_vec();
    let model = case.model_mut();

    let mut p = std::collections::HashMap::new();
    for (name, value, units) in params.entries() {
        let id = model.add_var(
            Variable::new(format!("costing_param.{name}"))
                .value(value)
                .fixed()
                .units(units),
        )?;
        p.insert(name, Expr::var(id));
    }
    let param = |name: &str| p.get(name).cloned().unwrap_or(Expr::constant(0.0));
    let operating_hours = seconds_per_year() / seconds_per_hour() * param("load_factor");

    let mut unit_costings = Vec::new();
    let mut capital_terms = Vec::new();
    let mut operating_terms = Vec::new();
    let mut electricity_terms = Vec::new();
    for unit in &units {
        let Some(terms) = unit_terms(unit, db, &param, &operating_hours)? else {
            continue;
        };
        let path = format!("costing.{}", unit.name);
        let capital_cost =
            model.add_expression(format!("{path}.capital_cost"), terms.capital, Some("USD"))?;
        let operating_cost = model.add_expression(
            format!("{path}.operating_cost"),
            terms.operating,
            Some("USD/year"),
        )?;
        capital_terms.push(expr_of(model, capital_cost));
        operating_terms.push(expr_of(model, operating_cost));
        electricity_terms.extend(terms.electricity);
        unit_costings.push(UnitCosting {
            unit: unit.name.clone(),
            capital_cost,
            operating_cost,
        });
    }

    let capital_total = Expr::sum(capital_terms);
    let investment = capital_total.clone() * param("factor_total_investment");
    let mlc = investment.clone() * param("factor_MLC");
    operating_terms.push(mlc.clone());
    let operating_total = Expr::sum(operating_terms);
    let electricity = Expr::sum(electricity_terms);
    let annual_production = product_flow.clone() * seconds_per_year() * param("load_factor");
    let lcow = (investment.clone() * param("factor_capital_annualization") + operating_total.clone())
        / annual_production.clone();
    let sec = electricity.clone() / (product_flow.clone() * seconds_per_hour());
    let recovery = product_flow / feed_flow;

    let costing = Costing {
        capital_cost_total: model.add_expression("costing.capital_cost_total", capital_total, Some("USD"))?,
        investment_cost_total: model.add_expression(
            "costing.investment_cost_total",
            investment,
            Some("USD"),
        )?,
        operating_cost_mlc: model.add_expression("costing.operating_cost_MLC", mlc, Some("USD/year"))?,
        operating_cost_total: model.add_expression(
            "costing.operating_cost_total",
            operating_total,
            Some("USD/year"),
        )?,
        electricity_total: model.add_expression("costing.electricity_total", electricity, Some("kW"))?,
        annual_water_production: model.add_expression(
            "costing.annual_water_production",
            annual_production,
            Some("m^3/year"),
        )?,
        lcow: model.add_expression("costing.LCOW", lcow, Some("USD/m^3"))?,
        specific_energy_consumption: model.add_expression(
            "costing.specific_energy_consumption",
            sec,
            Some("kWh/m^3"),
        )?,
        system_recovery: model.add_expression(
            "costing.system_recovery",
            recovery,
            Some("dimensionless"),
        )?,
        units: unit_costings,
    };
    debug!(units = costing.units.len(), "attached costing");
    case.set_costing(costing);
    Ok(())
}

fn expr_of(model: &Model, id: ExprId) -> Expr {
    model.expression(id).expr.clone()
}

fn product_unit_flow(unit: &Unit) -> FlowsheetResult<Expr> {
    if unit.kind != UnitKind::Product {
        return Err(FlowsheetError::WrongUnitKind {
            unit: unit.name.clone(),
            expected: "product",
        });
    }
    unit.inlets()
        .next()
        .map(|p| p.state.flow_vol_expr())
        .ok_or_else(|| FlowsheetError::Config {
            what: format!("product '{}' has no inlet", unit.name),
        })
}

fn unit_terms(
    unit: &Unit,
    db: &Database,
    param: &impl Fn(&str) -> Expr,
    operating_hours: &Expr,
) -> FlowsheetResult<Option<UnitTerms>> {
    match &unit.kind {
        UnitKind::Separator { tech } => {
            let params = db.get_unit_operation_parameters(tech)?;
            let electricity = unit
                .performance_var("Electricity Demand")
                .map(Expr::var)
                .unwrap_or(Expr::constant(0.0));
            let mut capital = Vec::new();
            let mut operating = vec![
                electricity.clone() * operating_hours.clone() * param("electricity_cost"),
            ];

            if let Some(cost) = &params.capital_cost {
                let flow = unit.flow_rate().ok_or_else(|| FlowsheetError::Config {
                    what: format!("unit '{}' has no flow rate for costing", unit.name),
                })?;
                let flow_m3_hr = flow * seconds_per_hour();
                capital.push(
                    (flow_m3_hr / cost.reference_state.value).powf(cost.capital_b_parameter.value)
                        * cost.capital_a_parameter.value,
                );
            }
            if let Some(flux) = &params.flux_vol_permeate {
                // membrane area from permeate flow over design flux
                let permeate = unit
                    .port("treated")
                    .map(|p| p.state.flow_vol_expr())
                    .ok_or_else(|| FlowsheetError::Config {
                        what: format!("unit '{}' has no treated outlet", unit.name),
                    })?;
                let flux_m_s = flux.value / LITRES_PER_M3 / seconds_per_hour();
                let area = permeate / flux_m_s;
                capital.push(param("RO_mem_cost") * area.clone());
                operating.push(param("factor_membrane_replacement") * param("RO_mem_cost") * area);
            }

            Ok(Some(UnitTerms {
                capital: Expr::sum(capital),
                operating: Expr::sum(operating),
                electricity: Some(electricity),
            }))
        }
        UnitKind::Pump => {
            let work = unit
                .performance_var("Mechanical Work")
                .map(Expr::var)
                .unwrap_or(Expr::constant(0.0));
            let electricity_kw = work.clone() / 1000.0;
            Ok(Some(UnitTerms {
                capital: param("hp_pump_cost") * work,
                operating: electricity_kw.clone() * operating_hours.clone() * param("electricity_cost"),
                electricity: Some(electricity_kw),
            }))
        }
        _ => Ok(None),
    }
}
