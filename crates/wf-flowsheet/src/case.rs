//! The case: one flowsheet model with its topology, units and arcs.
//!
//! Blocks and arcs may only be added while the topology is being built.
//! [`Case::seal`] validates the graph and freezes it; from then on only
//! variable values, bounds and fixed status change.

use tracing::{debug, info};
use wf_core::{ArcId, BlockId, ConId};
use wf_graph::{Graph, GraphBuilder, PortKind};
use wf_model::{Expr, Model};
use wf_solver::{ScalingReport, SolveStatus, SolverOptions, calculate_scaling_factors, solve};

use crate::costing::Costing;
use crate::database::Database;
use crate::error::{FlowsheetError, FlowsheetResult};
use crate::separator;
use crate::stream::{ComponentList, StreamState};
use crate::unit::{Unit, UnitKind, UnitPort, build_parts, unit_path};

#[derive(Debug, Clone)]
enum Topology {
    Building(GraphBuilder),
    Sealed(Graph),
}

/// Equality constraints tying an outlet port to the inlet port it feeds.
#[derive(Debug, Clone)]
pub struct Link {
    pub arc: ArcId,
    pub source_unit: BlockId,
    pub destination_unit: BlockId,
    pub source: StreamState,
    pub destination: StreamState,
    pub tear: bool,
    pub constraints: Vec<ConId>,
}

#[derive(Debug, Clone)]
pub struct Case {
    name: String,
    model: Model,
    components: ComponentList,
    topology: Topology,
    units: Vec<Unit>,
    links: Vec<Link>,
    costing: Option<Costing>,
}

impl Case {
    pub fn new(name: impl Into<String>, components: ComponentList) -> Self {
        Self {
            name: name.into(),
            model: Model::new(),
            components,
            topology: Topology::Building(GraphBuilder::new()),
            units: Vec::new(),
            links: Vec::new(),
            costing: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &ComponentList {
        &self.components
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn costing(&self) -> Option<&Costing> {
        self.costing.as_ref()
    }

    pub(crate) fn set_costing(&mut self, costing: Costing) {
        self.costing = Some(costing);
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self.topology, Topology::Sealed(_))
    }

    pub fn graph(&self) -> FlowsheetResult<&Graph> {
        match &self.topology {
            Topology::Sealed(graph) => Ok(graph),
            Topology::Building(_) => Err(FlowsheetError::NotSealed),
        }
    }

    pub fn unit(&self, name: &str) -> FlowsheetResult<&Unit> {
        self.units
            .iter()
            .find(|u| u.name == name)
            .ok_or_else(|| FlowsheetError::UnknownUnit {
                name: name.to_string(),
            })
    }

    pub fn unit_by_block(&self, block: BlockId) -> Option<&Unit> {
        self.units.iter().find(|u| u.block == block)
    }

    /// Add a unit block with its port states, performance variables and
    /// equations.
    pub fn add_unit(&mut self, name: &str, kind: UnitKind) -> FlowsheetResult<BlockId> {
        let Topology::Building(builder) = &mut self.topology else {
            return Err(FlowsheetError::Sealed);
        };
        match &kind {
            UnitKind::Mixer { inlets } if inlets.is_empty() => {
                return Err(FlowsheetError::Config {
                    what: format!("mixer '{name}' needs at least one inlet"),
                });
            }
            UnitKind::Splitter { outlets } if outlets.len() < 2 => {
                return Err(FlowsheetError::Config {
                    what: format!("splitter '{name}' needs at least two outlets"),
                });
            }
            _ => {}
        }

        let (inlets, outlets) = kind.port_names();
        let inlet_refs: Vec<&str> = inlets.iter().map(String::as_str).collect();
        let outlet_refs: Vec<&str> = outlets.iter().map(String::as_str).collect();
        let block = builder.add_block(name, &inlet_refs, &outlet_refs)?;

        let prefix = unit_path(name);
        let mut ports = Vec::with_capacity(inlets.len() + outlets.len());
        for (names, port_kind) in [(&inlets, PortKind::Inlet), (&outlets, PortKind::Outlet)] {
            for port in names {
                let id = builder.port(block, port, port_kind)?;
                let state =
                    StreamState::add(&mut self.model, &format!("{prefix}.{port}"), &self.components)?;
                ports.push(UnitPort {
                    name: port.clone(),
                    id,
                    kind: port_kind,
                    state,
                });
            }
        }

        let parts = build_parts(&mut self.model, &prefix, &kind, &ports, &self.components)?;
        debug!(
            unit = name,
            kind = kind.label(),
            constraints = parts.constraints.len(),
            "added unit"
        );
        self.units.push(Unit {
            name: name.to_string(),
            block,
            kind,
            ports,
            performance: parts.performance,
            constraints: parts.constraints,
            capabilities: parts.capabilities,
        });
        Ok(block)
    }

    /// Connect `src.src_port` to `dst.dst_port`.
    pub fn connect(
        &mut self,
        src: &str,
        src_port: &str,
        dst: &str,
        dst_port: &str,
    ) -> FlowsheetResult<ArcId> {
        self.link(src, src_port, dst, dst_port, false)
    }

    /// Connect a recycle arc; it is skipped by the block ordering and
    /// converged by tear iterations during initialization.
    pub fn connect_tear(
        &mut self,
        src: &str,
        src_port: &str,
        dst: &str,
        dst_port: &str,
    ) -> FlowsheetResult<ArcId> {
        self.link(src, src_port, dst, dst_port, true)
    }

    fn link(
        &mut self,
        src: &str,
        src_port: &str,
        dst: &str,
        dst_port: &str,
        tear: bool,
    ) -> FlowsheetResult<ArcId> {
        let Topology::Building(builder) = &mut self.topology else {
            return Err(FlowsheetError::Sealed);
        };
        let lookup = |name: &str| {
            builder
                .block_by_name(name)
                .ok_or_else(|| FlowsheetError::UnknownUnit {
                    name: name.to_string(),
                })
        };
        let (s, d) = (lookup(src)?, lookup(dst)?);
        let arc = if tear {
            builder.connect_tear(s, src_port, d, dst_port)?
        } else {
            builder.connect(s, src_port, d, dst_port)?
        };

        let state = |unit: &str, port: &str| -> FlowsheetResult<StreamState> {
            self.unit(unit)?
                .port(port)
                .map(|p| p.state.clone())
                .ok_or_else(|| FlowsheetError::UnknownUnit {
                    name: format!("{unit}.{port}"),
                })
        };
        let source = state(src, src_port)?;
        let destination = state(dst, dst_port)?;

        let prefix = format!("fs.{src}_{src_port}_to_{dst}_{dst_port}");
        let mut constraints = Vec::with_capacity(self.components.len() + 1);
        for (c, j) in self.components.names().enumerate() {
            constraints.push(self.model.add_constraint(
                format!("{prefix}.flow_mass_comp_equality[{j}]"),
                Expr::var(destination.flow_mass_comp[c]),
                Expr::var(source.flow_mass_comp[c]),
            )?);
        }
        constraints.push(self.model.add_constraint(
            format!("{prefix}.pressure_equality"),
            Expr::var(destination.pressure),
            Expr::var(source.pressure),
        )?);

        self.links.push(Link {
            arc,
            source_unit: s,
            destination_unit: d,
            source,
            destination,
            tear,
            constraints,
        });
        Ok(arc)
    }

    /// Validate and freeze the topology.
    pub fn seal(&mut self) -> FlowsheetResult<()> {
        let graph = match &self.topology {
            Topology::Building(builder) => builder.clone().build()?,
            Topology::Sealed(_) => return Err(FlowsheetError::Sealed),
        };
        info!(
            case = %self.name,
            blocks = graph.blocks().len(),
            arcs = graph.arcs().len(),
            tears = graph.tear_arcs().count(),
            "sealed case topology"
        );
        self.topology = Topology::Sealed(graph);
        Ok(())
    }

    /// Fix a separator's performance from its technology's database entry.
    pub fn load_parameters_from_database(
        &mut self,
        unit: &str,
        db: &Database,
        use_default_removal: bool,
    ) -> FlowsheetResult<()> {
        let unit = self
            .units
            .iter()
            .find(|u| u.name == unit)
            .ok_or_else(|| FlowsheetError::UnknownUnit {
                name: unit.to_string(),
            })?;
        separator::load_parameters(unit, &mut self.model, db, &self.components, use_default_removal)
    }

    /// Fix the outlet state of a feed unit. Every component needs a flow.
    pub fn fix_feed(
        &mut self,
        unit: &str,
        flow_mass_comp: &[(String, f64)],
        pressure: f64,
    ) -> FlowsheetResult<()> {
        let feed = self.unit(unit)?;
        if feed.kind != UnitKind::Feed {
            return Err(FlowsheetError::WrongUnitKind {
                unit: unit.to_string(),
                expected: "feed",
            });
        }
        let state = feed.ports[0].state.clone();
        for (c, j) in self.components.names().enumerate() {
            let flow = flow_mass_comp
                .iter()
                .find(|(name, _)| name == j)
                .map(|(_, v)| *v)
                .ok_or_else(|| FlowsheetError::Config {
                    what: format!("feed '{unit}' has no flow for component '{j}'"),
                })?;
            self.model.fix(state.flow_mass_comp[c], flow);
        }
        self.model.fix(state.pressure, pressure);
        Ok(())
    }

    /// Fix a variable by its model path, e.g. `fs.pump.outlet.pressure`.
    pub fn fix(&mut self, path: &str, value: f64) -> FlowsheetResult<()> {
        let id = self.model.var_id(path)?;
        self.model.fix(id, value);
        Ok(())
    }

    pub fn degrees_of_freedom(&self) -> i64 {
        self.model.degrees_of_freedom()
    }

    /// Run per-unit scaling hooks, then compute generic scale factors.
    pub fn calculate_scaling_factors(&mut self, fd_epsilon: f64) -> FlowsheetResult<ScalingReport> {
        for unit in &self.units {
            if let Some(hook) = unit.capabilities.scaling {
                hook(unit, &mut self.model);
            }
        }
        Ok(calculate_scaling_factors(&mut self.model, fd_epsilon)?)
    }

    /// One solve of the whole case; see [`wf_solver::solve`].
    pub fn solve(&mut self, options: &SolverOptions, fail_flag: bool) -> FlowsheetResult<SolveStatus> {
        Ok(solve(&mut self.model, options, fail_flag)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_graph::GraphError;

    fn components() -> ComponentList {
        ComponentList::new(["tss"]).unwrap()
    }

    fn simple_case() -> Case {
        let mut case = Case::new("simple", components());
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
        case
    }

    #[test]
    fn arcs_add_equality_constraints() {
        let case = simple_case();
        // 2 components + pressure per arc
        assert_eq!(case.links().len(), 3);
        assert!(case.links().iter().all(|l| l.constraints.len() == 3));
        assert!(
            case.model()
                .lookup("fs.feed_outlet_to_unit_inlet.flow_mass_comp_equality[H2O]")
                .is_some()
        );
    }

    #[test]
    fn unknown_port_is_rejected() {
        let mut case = simple_case();
        case.add_unit("sludge", UnitKind::Product).unwrap();
        let err = case.connect("unit", "sludge", "sludge", "inlet").unwrap_err();
        assert_eq!(
            err,
            FlowsheetError::Graph(GraphError::UnknownPort {
                block: "unit".into(),
                port: "sludge".into()
            })
        );
    }

    #[test]
    fn sealed_topology_is_frozen() {
        let mut case = simple_case();
        case.seal().unwrap();
        assert!(case.is_sealed());
        assert_eq!(
            case.add_unit("late", UnitKind::Product).unwrap_err(),
            FlowsheetError::Sealed
        );
        assert_eq!(
            case.connect("feed", "outlet", "unit", "inlet").unwrap_err(),
            FlowsheetError::Sealed
        );
        assert_eq!(case.seal().unwrap_err(), FlowsheetError::Sealed);
    }

    #[test]
    fn failed_seal_keeps_building() {
        let mut case = Case::new("dangling", components());
        case.add_unit("feed", UnitKind::Feed).unwrap();
        case.add_unit("product", UnitKind::Product).unwrap();
        assert!(matches!(
            case.seal(),
            Err(FlowsheetError::Graph(GraphError::DanglingPort { .. }))
        ));
        case.connect("feed", "outlet", "product", "inlet").unwrap();
        case.seal().unwrap();
    }

    #[test]
    fn degrees_of_freedom_after_specification() {
        let mut case = simple_case();
        let db = Database::embedded().unwrap();
        case.seal().unwrap();
        // unspecified feed and unit performance
        assert!(case.degrees_of_freedom() > 0);

        case.load_parameters_from_database("unit", &db, false).unwrap();
        case.fix_feed(
            "feed",
            &[("H2O".into(), 10.0), ("tss".into(), 1.0)],
            101_325.0,
        )
        .unwrap();
        assert_eq!(case.degrees_of_freedom(), 0);
    }

    #[test]
    fn feed_needs_every_component() {
        let mut case = simple_case();
        let err = case
            .fix_feed("feed", &[("H2O".into(), 10.0)], 101_325.0)
            .unwrap_err();
        assert!(matches!(err, FlowsheetError::Config { .. }));
        assert!(matches!(
            case.fix_feed("unit", &[], 1.0),
            Err(FlowsheetError::WrongUnitKind { .. })
        ));
    }
}
