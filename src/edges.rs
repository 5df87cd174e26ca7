//! Edge builder.
//!
//! For each pair of resolutions adjacent in column order we enumerate all the pairs
//! (from cluster, to cluster) and count the samples they share.
//! The proportion of an edge is its count divided by the size of the **to** cluster,
//! i.e. the fraction of the destination cluster coming from the source cluster.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::matrix::{ClusterLabel, ClusteringMatrix};

/// A transition between two clusters of adjacent resolutions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterEdge<L> {
    /// id of the source node
    pub from_node: String,
    /// id of the destination node
    pub to_node: String,
    /// resolution value of the source cluster
    pub from_res: f64,
    pub from_clust: L,
    /// resolution value of the destination cluster
    pub to_res: f64,
    pub to_clust: L,
    /// rank of the source resolution in column order, destination is rank + 1
    pub from_res_idx: usize,
    /// number of samples in both clusters
    pub count: usize,
    /// count / size of destination cluster
    pub proportion: f64,
} // end of struct ClusterEdge

/// Options for edge enumeration
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeOptions {
    /// do not generate pairs of clusters without common sample.
    /// They never pass the filter so the assembled graph is the same,
    /// but the edge table is no more the full cross product.
    pub skip_zero_overlap: bool,
}

/// The unfiltered edge table.
/// Ordered by resolution pair, then source cluster, then destination cluster.
#[derive(Debug, Clone)]
pub struct EdgeTable<L> {
    edges: Vec<ClusterEdge<L>>,
} // end of struct EdgeTable

impl<L> EdgeTable<L>
where
    L: ClusterLabel,
{
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get_edges(&self) -> &[ClusterEdge<L>] {
        &self.edges
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClusterEdge<L>> {
        self.edges.iter()
    }

    /// edges going out of resolution of rank from_res_idx
    pub fn edges_from_resolution(
        &self,
        from_res_idx: usize,
    ) -> impl Iterator<Item = &ClusterEdge<L>> {
        self.edges.iter().filter(move |e| e.from_res_idx == from_res_idx)
    }
} // end of impl EdgeTable

/// Build the edge table between all adjacent resolutions of the matrix.
pub fn build_edges<L: ClusterLabel>(
    matrix: &ClusteringMatrix<L>,
    options: EdgeOptions,
) -> EdgeTable<L> {
    log::debug!("build_edges, skip zero overlap : {}", options.skip_zero_overlap);
    //
    let by_pair: Vec<Vec<ClusterEdge<L>>> = matrix
        .adjacent_pairs()
        .into_par_iter()
        .map(|(from_res, to_res)| transitions(matrix, from_res, to_res, options))
        .collect();
    let edges: Vec<ClusterEdge<L>> = by_pair.into_iter().flatten().collect();
    let nb_pairs = matrix.get_nb_resolutions().saturating_sub(1);
    log::info!("build_edges : got {} edges for {} resolution pairs", edges.len(), nb_pairs);
    EdgeTable { edges }
} // end of build_edges

// all transitions from resolution from_res to resolution to_res
fn transitions<L: ClusterLabel>(
    matrix: &ClusteringMatrix<L>,
    from_res: usize,
    to_res: usize,
    options: EdgeOptions,
) -> Vec<ClusterEdge<L>> {
    let from_groups = matrix.get_groups(from_res);
    let to_groups = matrix.get_groups(to_res);
    let to_labels = matrix.get_labels(to_res);
    let from_value = matrix.get_resolution(from_res).get_value();
    let to_value = matrix.get_resolution(to_res).get_value();
    //
    let mut edges = Vec::<ClusterEdge<L>>::with_capacity(from_groups.len() * to_groups.len());
    for (from_clust, from_samples) in from_groups {
        // where samples of from_clust go
        let mut overlaps = BTreeMap::<&L, usize>::new();
        for s in from_samples {
            *overlaps.entry(&to_labels[*s]).or_insert(0) += 1;
        }
        let from_node = matrix.node_id(from_res, from_clust);
        for (to_clust, to_samples) in to_groups {
            let count = overlaps.get(to_clust).copied().unwrap_or(0);
            if count == 0 && options.skip_zero_overlap {
                continue;
            }
            // to_clust is observed at to_res so to_samples is not empty
            let proportion = count as f64 / to_samples.len() as f64;
            edges.push(ClusterEdge {
                from_node: from_node.clone(),
                to_node: matrix.node_id(to_res, to_clust),
                from_res: from_value,
                from_clust: from_clust.clone(),
                to_res: to_value,
                to_clust: to_clust.clone(),
                from_res_idx: from_res,
                count,
                proportion,
            });
        }
    }
    log::trace!("transitions {} -> {} : {} edges", from_res, to_res, edges.len());
    edges
} // end of transitions

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn matrix() -> ClusteringMatrix<u32> {
        let columns = vec![
            (String::from("k1"), vec![0, 0, 0, 0, 0, 0, 0]),
            (String::from("k2"), vec![0, 0, 0, 1, 1, 1, 1]),
            (String::from("k3"), vec![0, 0, 1, 1, 2, 3, 3]),
        ];
        ClusteringMatrix::from_columns("k", columns).unwrap()
    }

    #[test]
    fn test_cross_product_and_bounds() {
        log_init_test();
        //
        let matrix = matrix();
        let edges = build_edges(&matrix, EdgeOptions::default());
        assert_eq!(edges.edges_from_resolution(0).count(), 2);
        assert_eq!(edges.edges_from_resolution(1).count(), 2 * 4);
        assert_eq!(edges.len(), 10);
        for e in edges.iter() {
            assert!(e.proportion >= 0. && e.proportion <= 1.);
            assert_eq!(e.proportion == 0., e.count == 0);
            assert_eq!(e.to_res - e.from_res, 1.);
        }
    } // end of test_cross_product_and_bounds

    #[test]
    fn test_proportion_is_relative_to_destination() {
        let matrix = matrix();
        let edges = build_edges(&matrix, EdgeOptions::default());
        // k2C1 has 4 samples, 1 of them in k3C1 which has 2 samples
        let e = edges.iter().find(|e| e.from_node == "k2C1" && e.to_node == "k3C1").unwrap();
        assert_eq!(e.count, 1);
        assert_eq!(e.proportion, 0.5);
        let e = edges.iter().find(|e| e.from_node == "k1C0" && e.to_node == "k2C1").unwrap();
        assert_eq!(e.count, 4);
        assert_eq!(e.proportion, 1.);
    }

    #[test]
    fn test_skip_zero_overlap() {
        let matrix = matrix();
        let all = build_edges(&matrix, EdgeOptions::default());
        let sparse = build_edges(&matrix, EdgeOptions { skip_zero_overlap: true });
        let nonzero: Vec<&ClusterEdge<u32>> = all.iter().filter(|e| e.count > 0).collect();
        assert_eq!(sparse.len(), nonzero.len());
        assert!(sparse.iter().zip(nonzero).all(|(a, b)| a == b));
    }

    #[test]
    fn test_single_resolution_has_no_edge() {
        let columns = vec![(String::from("k1"), vec![0u32, 1])];
        let matrix = ClusteringMatrix::from_columns("k", columns).unwrap();
        assert!(build_edges(&matrix, EdgeOptions::default()).is_empty());
    }
} // end of mod tests
