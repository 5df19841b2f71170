//! Core graph data structures.

use wf_core::{ArcId, BlockId, PortId};

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Receives material from upstream.
    Inlet,
    /// Sends material downstream.
    Outlet,
}

/// A unit block (one process step) in the flowsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    pub inlets: Vec<PortId>,
    pub outlets: Vec<PortId>,
}

impl Block {
    /// A block without inlets introduces material into the flowsheet.
    pub fn is_source(&self) -> bool {
        self.inlets.is_empty()
    }

    /// A block without outlets terminates material flow.
    pub fn is_sink(&self) -> bool {
        self.outlets.is_empty()
    }
}

/// A named port owned by exactly one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub id: PortId,
    pub block: BlockId,
    pub name: String,
    pub kind: PortKind,
}

/// Directed connector from an outlet port to an inlet port.
///
/// Tear arcs break recycle loops: they are ignored when ordering blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arc {
    pub id: ArcId,
    pub source: PortId,
    pub destination: PortId,
    pub tear: bool,
}

/// Validated, immutable flowsheet topology.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) blocks: Vec<Block>,
    pub(crate) ports: Vec<Port>,
    pub(crate) arcs: Vec<Arc>,
    /// Arc attached to each port, indexed by port slot.
    pub(crate) port_arcs: Vec<Option<ArcId>>,
    pub(crate) order: Vec<BlockId>,
}

impl Graph {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.slot())
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.slot())
    }

    pub fn arc(&self, id: ArcId) -> Option<&Arc> {
        self.arcs.get(id.slot())
    }

    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.blocks.iter().find(|b| b.name == name).map(|b| b.id)
    }

    /// Look up a port on a block by its name.
    pub fn port_by_name(&self, block: BlockId, name: &str) -> Option<PortId> {
        let block = self.block(block)?;
        block
            .inlets
            .iter()
            .chain(block.outlets.iter())
            .copied()
            .find(|&p| self.ports[p.slot()].name == name)
    }

    /// The arc attached to a port (every port has one after validation).
    pub fn port_arc(&self, port: PortId) -> Option<&Arc> {
        let arc = (*self.port_arcs.get(port.slot())?)?;
        self.arc(arc)
    }

    /// The outlet port feeding an inlet port.
    pub fn source_of(&self, inlet: PortId) -> Option<PortId> {
        self.port_arc(inlet)
            .filter(|arc| arc.destination == inlet)
            .map(|arc| arc.source)
    }

    /// Blocks in initialization order: every block appears after all of its
    /// direct upstream blocks (tear arcs excepted). Ties follow insertion order.
    pub fn topological_order(&self) -> &[BlockId] {
        &self.order
    }

    /// Direct upstream blocks across non-tear arcs.
    pub fn upstream(&self, block: BlockId) -> Vec<BlockId> {
        let Some(block) = self.block(block) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for &inlet in &block.inlets {
            if let Some(arc) = self.port_arc(inlet)
                && !arc.tear
            {
                let up = self.ports[arc.source.slot()].block;
                if !out.contains(&up) {
                    out.push(up);
                }
            }
        }
        out
    }

    /// The single feed source.
    pub fn feed(&self) -> BlockId {
        // Validation guarantees exactly one source.
        self.blocks
            .iter()
            .find(|b| b.is_source())
            .map(|b| b.id)
            .unwrap_or(BlockId::from_index(0))
    }

    pub fn sinks(&self) -> Vec<BlockId> {
        self.blocks
            .iter()
            .filter(|b| b.is_sink())
            .map(|b| b.id)
            .collect()
    }

    pub fn tear_arcs(&self) -> impl Iterator<Item = &Arc> {
        self.arcs.iter().filter(|a| a.tear)
    }

    /// Human-readable `block.port` label.
    pub fn port_label(&self, port: PortId) -> String {
        match self.port(port) {
            Some(p) => format!("{}.{}", self.blocks[p.block.slot()].name, p.name),
            None => format!("<port {}>", port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_kind_equality() {
        assert_eq!(PortKind::Inlet, PortKind::Inlet);
        assert_ne!(PortKind::Inlet, PortKind::Outlet);
    }

    #[test]
    fn block_source_and_sink() {
        let feed = Block {
            id: BlockId::from_index(0),
            name: "feed".into(),
            inlets: vec![],
            outlets: vec![PortId::from_index(0)],
        };
        assert!(feed.is_source());
        assert!(!feed.is_sink());
    }
}
