//! Study schema definitions.

use serde::{Deserialize, Serialize};
use wf_flowsheet::CostingParameters;
use wf_solver::SolverOptions;
use wf_sweep::SweepSpec;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Study {
    pub version: u32,
    pub name: String,
    pub feed: FeedDef,
    #[serde(default)]
    pub train: TrainDef,
    /// Economic parameters; costing is attached only when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub costing: Option<CostingParameters>,
    #[serde(default)]
    pub solver: SolverOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedDef {
    pub water_kg_s: f64,
    #[serde(default)]
    pub solutes: Vec<SoluteFlowDef>,
    #[serde(default = "default_feed_pressure")]
    pub pressure_pa: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoluteFlowDef {
    pub name: String,
    pub flow_kg_s: f64,
}

fn default_feed_pressure() -> f64 {
    wf_core::constants::P_ATM_PA
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainDef {
    pub pretreatment: bool,
    pub adsorption: bool,
    pub dewatering: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recycle_fraction: Option<f64>,
    /// Fall back to the technology's default removal for solutes it does
    /// not list.
    pub use_default_removal: bool,
    pub pump: PumpDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PumpDef {
    pub outlet_pressure_pa: f64,
    pub efficiency: f64,
}

impl Default for PumpDef {
    fn default() -> Self {
        Self {
            outlet_pressure_pa: 20e5,
            efficiency: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepDef {
    #[serde(flatten)]
    pub spec: SweepSpec,
    /// Re-run the initializer and retry once when a sample fails.
    #[serde(default)]
    pub reinitialize: bool,
}

impl Study {
    /// Minimal study: one feed, default train, no costing or sweep.
    pub fn new(name: &str, feed: FeedDef) -> Self {
        Self {
            version: crate::validate::LATEST_VERSION,
            name: name.to_string(),
            feed,
            train: TrainDef::default(),
            costing: None,
            solver: SolverOptions::default(),
            sweep: None,
        }
    }
}

impl FeedDef {
    pub fn new(water_kg_s: f64) -> Self {
        Self {
            water_kg_s,
            solutes: Vec::new(),
            pressure_pa: default_feed_pressure(),
        }
    }

    pub fn solute(mut self, name: &str, flow_kg_s: f64) -> Self {
        self.solutes.push(SoluteFlowDef {
            name: name.to_string(),
            flow_kg_s,
        });
        self
    }
}
