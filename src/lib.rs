//! Cluster trees.
//!
//! Given clusterings of the same samples at several resolutions, builds the graph describing how
//! clusters at one resolution split or merge into clusters at the next resolution.
//!
//! - a node is a cluster at one resolution, with its size, SC3 stability index and optional
//!   attributes aggregated from sample metadata. See [nodes].
//! - an edge goes from a cluster to a cluster of the next resolution, with the number of samples
//!   they share and the proportion of the destination cluster this represents. See [edges].
//! - edges are filtered on count and proportion and assembled with nodes in a petgraph graph.
//!   See [graph].
//!
//! [tree::build_cluster_tree] runs the whole construction from a [matrix::ClusteringMatrix],
//! an optional [metadata::MetadataTable] and [treeparams::TreeParams].
//!
//! Logging is done with the crates **log** and **env_logger**,
//! set RUST_LOG=clustree=DEBUG to follow construction.

pub mod aggregate;
pub mod edges;
pub mod graph;
pub mod io;
pub mod matrix;
pub mod metadata;
pub mod nodes;
pub mod prelude;
pub mod stability;
pub mod tree;
pub mod treeparams;

// end of tests
