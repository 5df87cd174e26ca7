//! Graph assembly.
//!
//! The edge table is filtered on count and proportion, then nodes and kept edges are gathered
//! in a directed graph (petgraph [DiGraph]). Nodes are identified by their id string,
//! an edge whose end is not a node of the table is an error: builders were run on different inputs.
//!
//! Among the kept edges arriving in a node, those of maximal proportion are flagged as core edges.
//! Following only core edges gives a tree, which is what tree layouts draw.

use std::collections::HashMap;

use anyhow::anyhow;

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::edges::{ClusterEdge, EdgeTable};
use crate::matrix::ClusterLabel;
use crate::nodes::{ClusterNode, NodeTable};

/// Edges are kept if `count > count_filter` and `proportion > prop_filter`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeFilter {
    pub count_filter: usize,
    pub prop_filter: f64,
} // end of struct EdgeFilter

impl EdgeFilter {
    pub fn new(count_filter: usize, prop_filter: f64) -> Self {
        EdgeFilter { count_filter, prop_filter }
    }

    /// strict inequalities: an edge at a threshold is dropped, so zero count edges never pass
    pub fn keep<L>(&self, edge: &ClusterEdge<L>) -> bool {
        edge.count > self.count_filter && edge.proportion > self.prop_filter
    }

    /// the kept edges, in table order. Values are not modified.
    pub fn apply<'a, L: ClusterLabel>(&self, edges: &'a EdgeTable<L>) -> Vec<&'a ClusterEdge<L>> {
        edges.iter().filter(|e| self.keep(*e)).collect()
    }
} // end of impl EdgeFilter

impl Default for EdgeFilter {
    fn default() -> Self {
        EdgeFilter { count_filter: 0, prop_filter: 0.1 }
    }
}

/// An edge of the assembled graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeEdge<L> {
    #[serde(flatten)]
    pub edge: ClusterEdge<L>,
    /// true if no kept edge into the same node has a larger proportion
    pub is_core: bool,
}

/// The cluster tree: nodes with their attributes, filtered edges with count and proportion.
///
/// It need not be a tree, a cluster can receive samples from several clusters.
#[derive(Debug, Clone)]
pub struct ClusterTree<L> {
    graph: DiGraph<ClusterNode<L>, TreeEdge<L>>,
    /// node id to graph index
    index: IndexMap<String, NodeIndex>,
    filter: EdgeFilter,
} // end of struct ClusterTree

impl<L> ClusterTree<L>
where
    L: ClusterLabel,
{
    /// Filter edges and assemble them with nodes.
    pub fn assemble(
        nodes: &NodeTable<L>,
        edges: &EdgeTable<L>,
        filter: EdgeFilter,
    ) -> anyhow::Result<Self> {
        //
        log::debug!("assembling graph, filter : {:?}", filter);
        let mut graph =
            DiGraph::<ClusterNode<L>, TreeEdge<L>>::with_capacity(nodes.len(), edges.len());
        let mut index = IndexMap::<String, NodeIndex>::with_capacity(nodes.len());
        for node in nodes.iter() {
            if index.contains_key(&node.node) {
                log::error!("duplicated node id {}", node.node);
                return Err(anyhow!("duplicated node id {}", node.node));
            }
            let idx = graph.add_node(node.clone());
            index.insert(node.node.clone(), idx);
        }
        //
        let kept = filter.apply(edges);
        let mut ends = Vec::<(NodeIndex, NodeIndex)>::with_capacity(kept.len());
        for edge in &kept {
            let from = index.get(&edge.from_node);
            let to = index.get(&edge.to_node);
            match (from, to) {
                (Some(from), Some(to)) => ends.push((*from, *to)),
                _ => {
                    let missing = if from.is_none() { &edge.from_node } else { &edge.to_node };
                    log::error!(
                        "edge {} -> {} references unknown node {}",
                        edge.from_node,
                        edge.to_node,
                        missing
                    );
                    return Err(anyhow!(
                        "edge {} -> {} references node {} absent from node table",
                        edge.from_node,
                        edge.to_node,
                        missing
                    ));
                }
            }
        }
        // max proportion of kept edges arriving in each node
        let mut max_in = HashMap::<NodeIndex, f64>::new();
        for (edge, (_, to)) in kept.iter().zip(&ends) {
            let best = max_in.entry(*to).or_insert(edge.proportion);
            if edge.proportion > *best {
                *best = edge.proportion;
            }
        }
        for (edge, (from, to)) in kept.into_iter().zip(ends) {
            let is_core = max_in.get(&to).map_or(false, |best| edge.proportion >= *best);
            graph.add_edge(from, to, TreeEdge { edge: edge.clone(), is_core });
        }
        log::info!(
            "cluster tree : {} nodes, {} edges kept out of {}",
            graph.node_count(),
            graph.edge_count(),
            edges.len()
        );
        //
        Ok(ClusterTree { graph, index, filter })
    } // end of assemble

    pub fn get_graph(&self) -> &DiGraph<ClusterNode<L>, TreeEdge<L>> {
        &self.graph
    }

    pub fn get_filter(&self) -> EdgeFilter {
        self.filter
    }

    pub fn nb_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn nb_edges(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn get_node_index(&self, node_id: &str) -> Option<NodeIndex> {
        self.index.get(node_id).copied()
    }

    pub fn get_node(&self, node_id: &str) -> Option<&ClusterNode<L>> {
        self.get_node_index(node_id).map(|idx| &self.graph[idx])
    }

    /// nodes in node table order
    pub fn nodes(&self) -> impl Iterator<Item = &ClusterNode<L>> {
        self.index.values().map(move |idx| &self.graph[*idx])
    }

    /// nodes of the resolution of rank res_idx
    pub fn nodes_at_resolution(&self, res_idx: usize) -> impl Iterator<Item = &ClusterNode<L>> {
        self.nodes().filter(move |n| n.res_idx == res_idx)
    }

    /// edges as (source, destination, edge) in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&ClusterNode<L>, &ClusterNode<L>, &TreeEdge<L>)> {
        self.graph
            .edge_references()
            .map(move |e| (&self.graph[e.source()], &self.graph[e.target()], e.weight()))
    }

    /// the core edges, see module doc
    pub fn core_edges(
        &self,
    ) -> impl Iterator<Item = (&ClusterNode<L>, &ClusterNode<L>, &TreeEdge<L>)> {
        self.edges().filter(|(_, _, e)| e.is_core)
    }

    /// nodes of the next resolution receiving samples from node_id through a kept edge
    pub fn children(&self, node_id: &str) -> Vec<&ClusterNode<L>> {
        self.neighbours(node_id, Direction::Outgoing)
    }

    /// nodes of the previous resolution sending samples to node_id through a kept edge
    pub fn parents(&self, node_id: &str) -> Vec<&ClusterNode<L>> {
        self.neighbours(node_id, Direction::Incoming)
    }

    fn neighbours(&self, node_id: &str, dir: Direction) -> Vec<&ClusterNode<L>> {
        let idx = match self.get_node_index(node_id) {
            Some(idx) => idx,
            None => return Vec::new(),
        };
        let mut found: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| (e.id(), if dir == Direction::Outgoing { e.target() } else { e.source() }))
            .collect();
        // petgraph walks edges from the last added, we want insertion order
        found.sort_unstable_by_key(|(e, _)| *e);
        found.into_iter().map(|(_, n)| &self.graph[n]).collect()
    } // end of neighbours

    /// a serializable view of the graph for renderers
    pub fn export(&self) -> GraphExport<'_, L> {
        GraphExport {
            nodes: self.nodes().collect(),
            edges: self.graph.edge_weights().collect(),
        }
    }
} // end of impl ClusterTree

/// The graph as given to renderers: `{ "nodes" : [...], "edges" : [...] }`
#[derive(Debug, Serialize)]
pub struct GraphExport<'a, L> {
    pub nodes: Vec<&'a ClusterNode<L>>,
    pub edges: Vec<&'a TreeEdge<L>>,
}

//========================================================================================

// end of mod tests
