//! SC3 stability index of a cluster.
//!
//! The index tells how well a cluster keeps its samples together through the following resolutions.
//! For a cluster c at resolution k, for each resolution k' >= k we take the n clusters d at k'
//! sharing samples with c and add |c ∩ d| / (|c ∪ d| * n).
//! The sum is divided by the number of resolutions so the index lies in \[0, 1\].
//!
//! Reference : *SC3: consensus clustering of single-cell RNA-seq data*
//! Kiselev V.Y. et al. Nature Methods 2017

use std::collections::BTreeMap;

use crate::matrix::{ClusterLabel, ClusteringMatrix};

/// stability index of cluster label at resolution res. Returns 0. if the cluster is not present.
pub fn sc3_stability<L: ClusterLabel>(matrix: &ClusteringMatrix<L>, res: usize, label: &L) -> f64 {
    let members = match matrix.get_groups(res).get(label) {
        Some(samples) => samples,
        None => return 0.,
    };
    let nb_res = matrix.get_nb_resolutions();
    let mut stability = 0.;
    for res2 in res..nb_res {
        let labels2 = matrix.get_labels(res2);
        let mut overlaps = BTreeMap::<&L, usize>::new();
        for s in members {
            *overlaps.entry(&labels2[*s]).or_insert(0) += 1;
        }
        let nb_overlapping = overlaps.len() as f64;
        for (label2, overlap) in overlaps {
            let size2 = matrix.get_cluster_size(res2, label2);
            let union = members.len() + size2 - overlap;
            stability += overlap as f64 / (union as f64 * nb_overlapping);
        }
    }
    stability / nb_res as f64
} // end of sc3_stability

//========================================================================================

// end of mod tests
