//! The whole pipeline: node table and edge table, built side by side, then assembled.

use crate::edges::{build_edges, EdgeTable};
use crate::graph::ClusterTree;
use crate::matrix::{ClusterLabel, ClusteringMatrix};
use crate::metadata::MetadataTable;
use crate::nodes::{build_nodes, NodeTable};
use crate::treeparams::TreeParams;

/// The three artifacts of a construction: node table, unfiltered edge table and graph.
#[derive(Debug, Clone)]
pub struct ClusterTreeBuild<L> {
    pub nodes: NodeTable<L>,
    pub edges: EdgeTable<L>,
    pub tree: ClusterTree<L>,
}

/// Build the cluster tree of matrix.
///
/// Aesthetics of params are resolved against metadata: aggregations over existing columns
/// are computed on nodes, anything else is left to the renderer.
/// Either all three artifacts are returned or the first error met.
pub fn build_cluster_tree<L: ClusterLabel>(
    matrix: &ClusteringMatrix<L>,
    metadata: Option<&MetadataTable>,
    params: &TreeParams,
) -> anyhow::Result<ClusterTreeBuild<L>> {
    //
    params.log();
    let aggregations = params.aesthetics.aggregations(metadata);
    // node and edge builders are independent
    let (nodes, edges) = rayon::join(
        || build_nodes(matrix, metadata, &aggregations, params.with_stability),
        || build_edges(matrix, params.edge_options),
    );
    let nodes = nodes?;
    let tree = ClusterTree::assemble(&nodes, &edges, params.filter)?;
    Ok(ClusterTreeBuild { nodes, edges, tree })
} // end of build_cluster_tree

//========================================================================================

// end of mod tests
