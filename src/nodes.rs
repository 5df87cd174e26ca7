//! Node builder.
//!
//! One node by (resolution, cluster) pair of the clustering matrix, with the size of the cluster,
//! its SC3 stability and the aggregated metadata attributes asked for.

use anyhow::{anyhow, Context};

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::aggregate::AttributeAggregation;
use crate::matrix::{ClusterLabel, ClusteringMatrix};
use crate::metadata::{MetaValue, MetadataTable};
use crate::stability::sc3_stability;

/// A cluster at one resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterNode<L> {
    /// node id `<prefix><resolution>C<cluster>`
    pub node: String,
    /// rank of the resolution in column order
    pub res_idx: usize,
    /// resolution value
    pub resolution: f64,
    pub cluster: L,
    /// number of samples in the cluster
    pub size: usize,
    /// None if stability was not asked for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sc3_stability: Option<f64>,
    /// aggregated attributes, named `<aesthetic>_<column>`
    #[serde(flatten)]
    pub attributes: IndexMap<String, MetaValue>,
} // end of struct ClusterNode

/// The node table, nodes ordered by resolution then by ascending cluster label.
#[derive(Debug, Clone)]
pub struct NodeTable<L> {
    nodes: Vec<ClusterNode<L>>,
    /// names of aggregated attributes carried by each node
    attribute_names: Vec<String>,
} // end of struct NodeTable

impl<L> NodeTable<L>
where
    L: ClusterLabel,
{
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get_nodes(&self) -> &[ClusterNode<L>] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClusterNode<L>> {
        self.nodes.iter()
    }

    pub fn get_attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    /// nodes of resolution of rank res_idx
    pub fn nodes_at_resolution(&self, res_idx: usize) -> impl Iterator<Item = &ClusterNode<L>> {
        self.nodes.iter().filter(move |n| n.res_idx == res_idx)
    }

    pub fn find(&self, node_id: &str) -> Option<&ClusterNode<L>> {
        self.nodes.iter().find(|n| n.node == node_id)
    }
} // end of impl NodeTable

/// Build the node table.
///
/// metadata must have as many rows as the matrix has samples. Each aggregation is applied
/// to the column values of the samples of each cluster, an aggregator error is returned with
/// the aesthetic, column and node that triggered it.
pub fn build_nodes<L: ClusterLabel>(
    matrix: &ClusteringMatrix<L>,
    metadata: Option<&MetadataTable>,
    aggregations: &[AttributeAggregation],
    with_stability: bool,
) -> anyhow::Result<NodeTable<L>> {
    //
    log::debug!("build_nodes, {} aggregations, stability : {}", aggregations.len(), with_stability);
    if let Some(metadata) = metadata {
        metadata.check_rows(matrix.get_nb_samples())?;
    }
    if !aggregations.is_empty() && metadata.is_none() {
        log::error!("build_nodes : aggregations asked without metadata");
        return Err(anyhow!("node attributes aggregation needs a metadata table"));
    }
    //
    let by_resolution: Vec<anyhow::Result<Vec<ClusterNode<L>>>> = (0..matrix.get_nb_resolutions())
        .into_par_iter()
        .map(|res| resolution_nodes(matrix, res, metadata, aggregations, with_stability))
        .collect();
    let mut nodes = Vec::<ClusterNode<L>>::new();
    for res_nodes in by_resolution {
        nodes.append(&mut res_nodes?);
    }
    log::info!("build_nodes : got {} nodes", nodes.len());
    //
    let attribute_names = aggregations.iter().map(|a| a.attribute_name()).collect();
    Ok(NodeTable { nodes, attribute_names })
} // end of build_nodes

// nodes of one resolution in ascending cluster order
fn resolution_nodes<L: ClusterLabel>(
    matrix: &ClusteringMatrix<L>,
    res: usize,
    metadata: Option<&MetadataTable>,
    aggregations: &[AttributeAggregation],
    with_stability: bool,
) -> anyhow::Result<Vec<ClusterNode<L>>> {
    let resolution = matrix.get_resolution(res).get_value();
    let groups = matrix.get_groups(res);
    let mut nodes = Vec::<ClusterNode<L>>::with_capacity(groups.len());
    for (cluster, samples) in groups {
        let node = matrix.node_id(res, cluster);
        let mut attributes = IndexMap::<String, MetaValue>::with_capacity(aggregations.len());
        if let Some(metadata) = metadata {
            for aggr in aggregations {
                let column = aggr.aggregation.get_column();
                // aggregations come from NodeAesthetics::aggregations, their column exists
                let values = metadata
                    .slice(column, samples)
                    .ok_or_else(|| anyhow!("no metadata column {:?}", column))?;
                let value = aggr.aggregation.apply(&values).with_context(|| {
                    format!(
                        "aggregating node {} : {} of column {:?} by {}",
                        aggr.aesthetic,
                        aggr.aggregation.get_aggregator_name(),
                        column,
                        node
                    )
                })?;
                attributes.insert(aggr.attribute_name(), value);
            }
        }
        let sc3 = if with_stability { Some(sc3_stability(matrix, res, cluster)) } else { None };
        nodes.push(ClusterNode {
            node,
            res_idx: res,
            resolution,
            cluster: cluster.clone(),
            size: samples.len(),
            sc3_stability: sc3,
            attributes,
        });
    }
    Ok(nodes)
} // end of resolution_nodes

//========================================================================================

// end of mod tests
