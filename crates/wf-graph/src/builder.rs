//! Incremental graph builder.

use wf_core::{ArcId, BlockId, PortId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Arc, Block, Graph, Port, PortKind};
use crate::validate;

/// Builder for constructing a flowsheet topology incrementally.
///
/// Use `add_block` and `connect` to build up the network, then call
/// `build()` to validate and freeze it into an immutable `Graph`.
#[derive(Debug, Default, Clone)]
pub struct GraphBuilder {
    blocks: Vec<Block>,
    ports: Vec<Port>,
    arcs: Vec<Arc>,
    port_arcs: Vec<Option<ArcId>>,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block with the given named inlet and outlet ports.
    pub fn add_block(
        &mut self,
        name: impl Into<String>,
        inlets: &[&str],
        outlets: &[&str],
    ) -> GraphResult<BlockId> {
        let name = name.into();
        if self.blocks.iter().any(|b| b.name == name) {
            return Err(GraphError::DuplicateBlock { name });
        }
        for (i, port) in inlets.iter().chain(outlets.iter()).enumerate() {
            if inlets.iter().chain(outlets.iter()).skip(i + 1).any(|p| p == port) {
                return Err(GraphError::DuplicatePort {
                    block: name,
                    port: port.to_string(),
                });
            }
        }

        let id = BlockId::from_index(self.blocks.len() as u32);
        let inlet_ids = inlets
            .iter()
            .map(|p| self.push_port(id, p, PortKind::Inlet))
            .collect();
        let outlet_ids = outlets
            .iter()
            .map(|p| self.push_port(id, p, PortKind::Outlet))
            .collect();

        self.blocks.push(Block {
            id,
            name,
            inlets: inlet_ids,
            outlets: outlet_ids,
        });
        Ok(id)
    }

    fn push_port(&mut self, block: BlockId, name: &str, kind: PortKind) -> PortId {
        let id = PortId::from_index(self.ports.len() as u32);
        self.ports.push(Port {
            id,
            block,
            name: name.to_string(),
            kind,
        });
        self.port_arcs.push(None);
        id
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.slot())
    }

    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.blocks.iter().find(|b| b.name == name).map(|b| b.id)
    }

    /// Resolve a port by name, checking its direction.
    pub fn port(&self, block: BlockId, name: &str, kind: PortKind) -> GraphResult<PortId> {
        let b = self.block(block).ok_or_else(|| GraphError::UnknownBlock {
            name: format!("#{}", block),
        })?;
        let found = b
            .inlets
            .iter()
            .chain(b.outlets.iter())
            .copied()
            .find(|p| self.ports[p.slot()].name == name)
            .ok_or_else(|| GraphError::UnknownPort {
                block: b.name.clone(),
                port: name.to_string(),
            })?;
        if self.ports[found.slot()].kind != kind {
            return Err(GraphError::DirectionMismatch {
                block: b.name.clone(),
                port: name.to_string(),
                expected: kind,
            });
        }
        Ok(found)
    }

    /// Connect `src.src_port` (outlet) to `dst.dst_port` (inlet).
    pub fn connect(
        &mut self,
        src: BlockId,
        src_port: &str,
        dst: BlockId,
        dst_port: &str,
    ) -> GraphResult<ArcId> {
        self.add_arc(src, src_port, dst, dst_port, false)
    }

    /// Connect a recycle arc that the topological order must ignore.
    pub fn connect_tear(
        &mut self,
        src: BlockId,
        src_port: &str,
        dst: BlockId,
        dst_port: &str,
    ) -> GraphResult<ArcId> {
        self.add_arc(src, src_port, dst, dst_port, true)
    }

    fn add_arc(
        &mut self,
        src: BlockId,
        src_port: &str,
        dst: BlockId,
        dst_port: &str,
        tear: bool,
    ) -> GraphResult<ArcId> {
        let source = self.port(src, src_port, PortKind::Outlet)?;
        let destination = self.port(dst, dst_port, PortKind::Inlet)?;
        for port in [source, destination] {
            if self.port_arcs[port.slot()].is_some() {
                let p = &self.ports[port.slot()];
                return Err(GraphError::PortAlreadyConnected {
                    block: self.blocks[p.block.slot()].name.clone(),
                    port: p.name.clone(),
                });
            }
        }

        let id = ArcId::from_index(self.arcs.len() as u32);
        self.arcs.push(Arc {
            id,
            source,
            destination,
            tear,
        });
        self.port_arcs[source.slot()] = Some(id);
        self.port_arcs[destination.slot()] = Some(id);
        Ok(id)
    }

    /// Validate and freeze the topology.
    pub fn build(self) -> GraphResult<Graph> {
        validate::validate_endpoints(&self.blocks)?;
        validate::validate_connected(&self.blocks, &self.ports, &self.port_arcs)?;
        let order = validate::topological_order(&self.blocks, &self.ports, &self.arcs)?;

        Ok(Graph {
            blocks: self.blocks,
            ports: self.ports,
            arcs: self.arcs,
            port_arcs: self.port_arcs,
            order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_basic() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_block("a", &[], &["out"]).unwrap();
        let b = builder.add_block("b", &["in"], &[]).unwrap();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(builder.ports.len(), 2);

        let arc = builder.connect(a, "out", b, "in").unwrap();
        assert_eq!(arc.index(), 0);
    }

    #[test]
    fn unknown_port_is_rejected() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_block("a", &[], &["out"]).unwrap();
        let b = builder.add_block("b", &["in"], &[]).unwrap();
        let err = builder.connect(a, "recycle", b, "in").unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownPort {
                block: "a".into(),
                port: "recycle".into()
            }
        );
    }

    #[test]
    fn direction_is_checked() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_block("a", &["in"], &["out"]).unwrap();
        let b = builder.add_block("b", &["in"], &["out"]).unwrap();
        let err = builder.connect(a, "in", b, "in").unwrap_err();
        assert!(matches!(err, GraphError::DirectionMismatch { .. }));
    }

    #[test]
    fn port_reuse_is_rejected() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_block("a", &[], &["out"]).unwrap();
        let b = builder.add_block("b", &["in"], &[]).unwrap();
        let c = builder.add_block("c", &["in"], &[]).unwrap();
        builder.connect(a, "out", b, "in").unwrap();
        let err = builder.connect(a, "out", c, "in").unwrap_err();
        assert!(matches!(err, GraphError::PortAlreadyConnected { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut builder = GraphBuilder::new();
        builder.add_block("a", &[], &["out"]).unwrap();
        assert!(matches!(
            builder.add_block("a", &[], &["out"]),
            Err(GraphError::DuplicateBlock { .. })
        ));
        assert!(matches!(
            builder.add_block("b", &["x"], &["x"]),
            Err(GraphError::DuplicatePort { .. })
        ));
    }
}
