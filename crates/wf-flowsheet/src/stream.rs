//! Zero-order stream state: component mass flows plus pressure.
//!
//! Volumetric flow and mass concentrations are derived quantities,
//! registered as named expressions next to the state variables:
//!
//! ```text
//! flow_vol          = sum_j flow_mass_comp[j] / rho_w
//! conc_mass_comp[j] = flow_mass_comp[j] / flow_vol
//! ```

use wf_core::constants::{P_ATM_PA, WATER_DENSITY_KG_M3};
use wf_core::{ExprId, VarId};
use wf_model::{Expr, Model, ModelResult, Variable};

use crate::error::{FlowsheetError, FlowsheetResult};

/// Name of the solvent component, always first in a [`ComponentList`].
pub const WATER: &str = "H2O";

/// Water plus the solutes tracked by a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentList {
    solutes: Vec<String>,
}

impl ComponentList {
    pub fn new<I, S>(solutes: I) -> FlowsheetResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for s in solutes {
            let s = s.into();
            if s.trim().is_empty() {
                return Err(FlowsheetError::Components {
                    what: "solute names must be non-empty".to_string(),
                });
            }
            if s == WATER {
                return Err(FlowsheetError::Components {
                    what: format!("{WATER} is the solvent and cannot be a solute"),
                });
            }
            if out.contains(&s) {
                return Err(FlowsheetError::Components {
                    what: format!("solute '{s}' listed twice"),
                });
            }
            out.push(s);
        }
        Ok(Self { solutes: out })
    }

    pub fn solutes(&self) -> &[String] {
        &self.solutes
    }

    /// Component names, water first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(WATER).chain(self.solutes.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.solutes.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.names().position(|n| n == name)
    }
}

/// Variables and derived expressions describing the stream at one port.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamState {
    /// Mass flow per component (kg/s), indexed like the component list.
    pub flow_mass_comp: Vec<VarId>,
    /// Pressure (Pa).
    pub pressure: VarId,
    pub flow_vol: ExprId,
    pub conc_mass_comp: Vec<ExprId>,
}

impl StreamState {
    /// Register the state of one port under `prefix` (e.g. `fs.unit.inlet`).
    pub fn add(model: &mut Model, prefix: &str, components: &ComponentList) -> ModelResult<Self> {
        let mut flow_mass_comp = Vec::with_capacity(components.len());
        for j in components.names() {
            flow_mass_comp.push(
                model.add_var(
                    Variable::new(format!("{prefix}.flow_mass_comp[{j}]"))
                        .lower(0.0)
                        .units("kg/s"),
                )?,
            );
        }
        let pressure = model.add_var(
            Variable::new(format!("{prefix}.pressure"))
                .lower(0.0)
                .units("Pa")
                .scale_hint(P_ATM_PA),
        )?;

        let volume = Expr::sum(flow_mass_comp.iter().map(|&v| Expr::var(v))) / WATER_DENSITY_KG_M3;
        let flow_vol = model.add_expression(format!("{prefix}.flow_vol"), volume.clone(), Some("m^3/s"))?;
        let mut conc_mass_comp = Vec::with_capacity(components.len());
        for (j, &m) in components.names().zip(&flow_mass_comp) {
            conc_mass_comp.push(model.add_expression(
                format!("{prefix}.conc_mass_comp[{j}]"),
                Expr::var(m) / volume.clone(),
                Some("kg/m^3"),
            )?);
        }

        Ok(Self {
            flow_mass_comp,
            pressure,
            flow_vol,
            conc_mass_comp,
        })
    }

    /// State variables: component flows, then pressure.
    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.flow_mass_comp
            .iter()
            .copied()
            .chain(std::iter::once(self.pressure))
    }

    /// Volumetric flow (m^3/s) as an expression over the state variables.
    pub fn flow_vol_expr(&self) -> Expr {
        Expr::sum(self.flow_mass_comp.iter().map(|&v| Expr::var(v))) / WATER_DENSITY_KG_M3
    }

    pub fn flow_vol_value(&self, model: &Model) -> ModelResult<f64> {
        model.eval(&self.flow_vol_expr())
    }

    pub fn conc_mass_value(&self, model: &Model, component: usize) -> ModelResult<f64> {
        let flow = self.flow_vol_value(model)?;
        let mass = model.eval(&Expr::var(self.flow_mass_comp[component]))?;
        Ok(mass / flow)
    }
}
