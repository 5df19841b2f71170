//! Graph validation logic.

use std::collections::BTreeSet;

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use wf_core::{ArcId, BlockId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Arc, Block, Port};

/// Exactly one feed source and at least one terminal sink.
pub(crate) fn validate_endpoints(blocks: &[Block]) -> GraphResult<()> {
    let sources: Vec<String> = blocks
        .iter()
        .filter(|b| b.is_source())
        .map(|b| b.name.clone())
        .collect();
    match sources.len() {
        0 => return Err(GraphError::NoFeed),
        1 => {}
        _ => return Err(GraphError::MultipleFeeds { blocks: sources }),
    }

    if !blocks.iter().any(|b| b.is_sink()) {
        return Err(GraphError::NoSink);
    }
    Ok(())
}

/// Every declared port carries an arc.
pub(crate) fn validate_connected(
    blocks: &[Block],
    ports: &[Port],
    port_arcs: &[Option<ArcId>],
) -> GraphResult<()> {
    for port in ports {
        if port_arcs[port.id.slot()].is_none() {
            return Err(GraphError::DanglingPort {
                block: blocks[port.block.slot()].name.clone(),
                port: port.name.clone(),
            });
        }
    }
    Ok(())
}

/// Kahn ordering over non-tear arcs, picking the lowest block index among
/// ready blocks so ties resolve to insertion order.
pub(crate) fn topological_order(
    blocks: &[Block],
    ports: &[Port],
    arcs: &[Arc],
) -> GraphResult<Vec<BlockId>> {
    let mut dag: DiGraph<BlockId, ArcId> = DiGraph::with_capacity(blocks.len(), arcs.len());
    let nodes: Vec<NodeIndex> = blocks.iter().map(|b| dag.add_node(b.id)).collect();
    for arc in arcs.iter().filter(|a| !a.tear) {
        let from = ports[arc.source.slot()].block;
        let to = ports[arc.destination.slot()].block;
        dag.add_edge(nodes[from.slot()], nodes[to.slot()], arc.id);
    }

    let mut in_degree: Vec<usize> = nodes
        .iter()
        .map(|&n| dag.edges_directed(n, Direction::Incoming).count())
        .collect();
    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(blocks.len());
    while let Some(next) = ready.pop_first() {
        order.push(blocks[next].id);
        for succ in dag.neighbors_directed(nodes[next], Direction::Outgoing) {
            let slot = dag[succ].slot();
            in_degree[slot] -= 1;
            if in_degree[slot] == 0 {
                ready.insert(slot);
            }
        }
    }

    if order.len() < blocks.len() {
        let cycle = tarjan_scc(&dag)
            .into_iter()
            .find(|scc| scc.len() > 1 || dag.contains_edge(scc[0], scc[0]))
            .unwrap_or_default();
        let mut names: Vec<(usize, String)> = cycle
            .iter()
            .map(|&n| (dag[n].slot(), blocks[dag[n].slot()].name.clone()))
            .collect();
        names.sort();
        return Err(GraphError::CycleWithoutTear {
            blocks: names.into_iter().map(|(_, n)| n).collect(),
        });
    }

    Ok(order)
}
