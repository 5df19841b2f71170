//! Unit blocks: a tagged kind plus a capability record.
//!
//! Every unit owns the stream state of its ports, its performance variables
//! and the constraints linking them. Behaviour that differs per kind
//! (initialization, scaling, the flow used for costing) is reached through
//! [`Capabilities`] rather than through a type hierarchy.

use wf_core::{BlockId, ConId, PortId, VarId};
use wf_graph::PortKind;
use wf_model::{Expr, Handle, Model, ModelResult};

use crate::stream::{ComponentList, StreamState};
use crate::{mixing, pump, separator};

/// Per-kind initialization routine, run before the block-local solve.
pub type InitializeHook = fn(&Unit, &mut Model) -> ModelResult<()>;

/// Per-kind scaling routine, run before generic scale factors are computed.
pub type ScalingHook = fn(&Unit, &mut Model);

/// Volumetric flow through the unit, used for costing.
pub type FlowRateFn = fn(&Unit) -> Expr;

/// What a unit kind can do beyond its equations.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    /// Variables that must be fixed for the unit to be fully specified.
    pub fixed_performance_vars: Vec<VarId>,
    pub initialize: Option<InitializeHook>,
    pub scaling: Option<ScalingHook>,
    pub flow_rate: Option<FlowRateFn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// Single source of the flowsheet; outlet state is fixed.
    Feed,
    /// Zero-order splitter of one inlet into treated and byproduct streams,
    /// parameterised by a database technology.
    Separator { tech: String },
    Pump,
    Mixer { inlets: Vec<String> },
    Splitter { outlets: Vec<String> },
    /// Terminal sink.
    Product,
}

impl UnitKind {
    pub fn label(&self) -> &'static str {
        match self {
            UnitKind::Feed => "feed",
            UnitKind::Separator { .. } => "separator",
            UnitKind::Pump => "pump",
            UnitKind::Mixer { .. } => "mixer",
            UnitKind::Splitter { .. } => "splitter",
            UnitKind::Product => "product",
        }
    }

    /// Inlet and outlet port names, in port order.
    pub fn port_names(&self) -> (Vec<String>, Vec<String>) {
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        match self {
            UnitKind::Feed => (vec![], names(&["outlet"])),
            UnitKind::Separator { .. } => (names(&["inlet"]), names(&["treated", "byproduct"])),
            UnitKind::Pump => (names(&["inlet"]), names(&["outlet"])),
            UnitKind::Mixer { inlets } => (inlets.clone(), names(&["outlet"])),
            UnitKind::Splitter { outlets } => (names(&["inlet"]), outlets.clone()),
            UnitKind::Product => (names(&["inlet"]), vec![]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitPort {
    pub name: String,
    pub id: PortId,
    pub kind: PortKind,
    pub state: StreamState,
}

/// A reported performance variable.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfVar {
    pub label: String,
    pub var: VarId,
}

impl PerfVar {
    pub fn new(label: impl Into<String>, var: VarId) -> Self {
        Self {
            label: label.into(),
            var,
        }
    }
}

/// Equations, performance variables and capabilities produced for one unit.
#[derive(Debug, Clone, Default)]
pub(crate) struct UnitParts {
    pub performance: Vec<PerfVar>,
    pub constraints: Vec<ConId>,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub name: String,
    pub block: BlockId,
    pub kind: UnitKind,
    pub ports: Vec<UnitPort>,
    pub performance: Vec<PerfVar>,
    pub constraints: Vec<ConId>,
    pub capabilities: Capabilities,
}

impl Unit {
    /// Model path prefix, e.g. `fs.unit`.
    pub fn path(&self) -> String {
        unit_path(&self.name)
    }

    pub fn port(&self, name: &str) -> Option<&UnitPort> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn inlets(&self) -> impl Iterator<Item = &UnitPort> {
        self.ports.iter().filter(|p| p.kind == PortKind::Inlet)
    }

    pub fn outlets(&self) -> impl Iterator<Item = &UnitPort> {
        self.ports.iter().filter(|p| p.kind == PortKind::Outlet)
    }

    /// All inlet state variables; held fixed during the block-local solve.
    pub fn inlet_vars(&self) -> Vec<VarId> {
        self.inlets().flat_map(|p| p.state.vars()).collect()
    }

    pub fn flow_rate(&self) -> Option<Expr> {
        self.capabilities.flow_rate.map(|f| f(self))
    }

    pub fn performance_var(&self, label: &str) -> Option<VarId> {
        self.performance
            .iter()
            .find(|p| p.label == label)
            .map(|p| p.var)
    }

    pub fn tech(&self) -> Option<&str> {
        match &self.kind {
            UnitKind::Separator { tech } => Some(tech),
            _ => None,
        }
    }
}

pub(crate) fn unit_path(name: &str) -> String {
    format!("fs.{name}")
}

/// Current value of a variable, or `Uninitialized` naming it.
pub(crate) fn current(model: &Model, var: VarId) -> ModelResult<f64> {
    model.eval_handle(Handle::Var(var))
}

/// Build the kind-specific variables and equations of a unit whose port
/// states already exist.
pub(crate) fn build_parts(
    model: &mut Model,
    prefix: &str,
    kind: &UnitKind,
    ports: &[UnitPort],
    components: &ComponentList,
) -> ModelResult<UnitParts> {
    match kind {
        UnitKind::Feed => Ok(UnitParts {
            capabilities: Capabilities {
                fixed_performance_vars: ports.iter().flat_map(|p| p.state.vars()).collect(),
                ..Capabilities::default()
            },
            ..UnitParts::default()
        }),
        UnitKind::Separator { .. } => separator::build(model, prefix, ports, components),
        UnitKind::Pump => pump::build(model, prefix, ports, components),
        UnitKind::Mixer { .. } => mixing::build_mixer(model, prefix, ports, components),
        UnitKind::Splitter { .. } => mixing::build_splitter(model, prefix, ports, components),
        UnitKind::Product => Ok(UnitParts::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_layout_per_kind() {
        let (i, o) = UnitKind::Separator {
            tech: "gac".into(),
        }
        .port_names();
        assert_eq!(i, vec!["inlet"]);
        assert_eq!(o, vec!["treated", "byproduct"]);

        let (i, o) = UnitKind::Mixer {
            inlets: vec!["feed".into(), "recycle".into()],
        }
        .port_names();
        assert_eq!(i.len(), 2);
        assert_eq!(o, vec!["outlet"]);

        assert!(UnitKind::Feed.port_names().0.is_empty());
        assert!(UnitKind::Product.port_names().1.is_empty());
        assert_eq!(UnitKind::Pump.label(), "pump");
    }
}
