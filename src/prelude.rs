//! Glob import of the main structures : `use clustree::prelude::*;`

pub use crate::aggregate::{
    builtin, Aesthetic, Aggregator, AttributeAggregation, ColumnAggregation, NodeAesthetics,
    NodeAttribute,
};
pub use crate::edges::{build_edges, ClusterEdge, EdgeOptions, EdgeTable};
pub use crate::graph::{ClusterTree, EdgeFilter, GraphExport, TreeEdge};
pub use crate::io::{
    load_clustering_csv, read_clustering_csv, write_edges_csv, write_graph_json, write_nodes_csv,
};
pub use crate::matrix::{ClusterGroups, ClusterLabel, ClusteringMatrix, Resolution};
pub use crate::metadata::{MetaValue, MetadataTable};
pub use crate::nodes::{build_nodes, ClusterNode, NodeTable};
pub use crate::stability::sc3_stability;
pub use crate::tree::{build_cluster_tree, ClusterTreeBuild};
pub use crate::treeparams::TreeParams;
