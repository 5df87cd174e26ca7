//! Parameters driving the construction of a cluster tree.
//!
//! - edge filter : an edge is kept if its count is strictly greater than `count_filter` and
//!   its proportion strictly greater than `prop_filter`. Defaults are 0 and 0.1.
//! - zero overlap skipping : pairs of clusters without common samples are not enumerated.
//!   Default false.
//! - stability : compute the SC3 stability index of each node. Default true.
//! - node aesthetics : the optional colour, size and alpha attributes, see [NodeAesthetics].

use crate::aggregate::{Aesthetic, NodeAesthetics, NodeAttribute};
use crate::edges::EdgeOptions;
use crate::graph::EdgeFilter;

/// main parameters driving cluster tree construction
#[derive(Debug, Clone)]
pub struct TreeParams {
    /// thresholds on edges
    pub filter: EdgeFilter,
    /// edge enumeration options
    pub edge_options: EdgeOptions,
    /// if true nodes get a SC3 stability index. default to true
    pub with_stability: bool,
    /// colour, size, alpha attributes of nodes
    pub aesthetics: NodeAesthetics,
} // end of TreeParams

impl TreeParams {
    pub fn new(filter: EdgeFilter) -> Self {
        TreeParams {
            filter,
            edge_options: EdgeOptions::default(),
            with_stability: true,
            aesthetics: NodeAesthetics::new(),
        }
    }

    pub fn log(&self) {
        log::info!("TreeParams");
        log::info!("\t count filter : {}", self.filter.count_filter);
        log::info!("\t proportion filter : {}", self.filter.prop_filter);
        log::info!("\t skip zero overlap edges : {}", self.edge_options.skip_zero_overlap);
        log::info!("\t sc3 stability : {}", self.with_stability);
        for aesthetic in [Aesthetic::Colour, Aesthetic::Size, Aesthetic::Alpha] {
            match self.aesthetics.get(aesthetic) {
                Some(NodeAttribute::Constant(value)) => {
                    log::info!("\t node {} : constant {}", aesthetic, value)
                }
                Some(NodeAttribute::MetadataAggregate(aggr)) => log::info!(
                    "\t node {} : {} of {:?}",
                    aesthetic,
                    aggr.get_aggregator_name(),
                    aggr.get_column()
                ),
                None => {}
            }
        }
    } // end of log

    pub fn set_count_filter(&mut self, count_filter: usize) {
        self.filter.count_filter = count_filter;
    }

    pub fn set_prop_filter(&mut self, prop_filter: f64) {
        self.filter.prop_filter = prop_filter;
    }

    /// if true, pairs of clusters without common sample are not put in the edge table
    pub fn set_skip_zero_overlap(&mut self, skip: bool) {
        self.edge_options.skip_zero_overlap = skip;
    }

    pub fn set_stability(&mut self, with_stability: bool) {
        self.with_stability = with_stability;
    }

    pub fn set_node_attribute(&mut self, aesthetic: Aesthetic, attribute: NodeAttribute) {
        self.aesthetics.set(aesthetic, attribute);
    }
} // end of impl TreeParams

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams::new(EdgeFilter::default())
    }
}
