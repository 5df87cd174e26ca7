//! The clustering matrix: one row by sample, one column by resolution.
//!
//! Each column is named `<prefix><suffix>` where the suffix gives the resolution value.
//! Column order defines resolution order, the matrix never reorders columns.
//!
//! At construction we build once, for each resolution, the mapping cluster label -> sample indexes.
//! Cluster sizes, metadata slices, overlap counts and stability are all derived from these groups
//! so we never rescan a full column per cluster.

use std::collections::BTreeMap;
use std::fmt::Display;

use anyhow::anyhow;

use indexmap::IndexSet;
use rayon::prelude::*;

/// What we need from a cluster label: sorting, display in node ids and sharing between threads.
pub trait ClusterLabel: Ord + Clone + Display + Send + Sync {}

impl<T> ClusterLabel for T where T: Ord + Clone + Display + Send + Sync {}

/// sample indexes of each cluster at one resolution. Keys iterate in ascending label order.
pub type ClusterGroups<L> = BTreeMap<L, Vec<usize>>;

/// A resolution, i.e. one column of the clustering matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// full column name
    column: String,
    /// column name with prefix removed. Kept verbatim as it enters node ids.
    suffix: String,
    /// numeric value of the suffix
    value: f64,
} // end of struct Resolution

impl Resolution {
    /// decode a column name `<prefix><suffix>`, the suffix must parse as a number.
    pub fn from_column(prefix: &str, column: &str) -> anyhow::Result<Self> {
        let suffix = match column.strip_prefix(prefix) {
            Some(s) if !s.is_empty() => s,
            _ => {
                log::error!("column {:?} is not of the form {:?}{{resolution}}", column, prefix);
                return Err(anyhow!(
                    "column {:?} does not start with prefix {:?} followed by a resolution",
                    column,
                    prefix
                ));
            }
        };
        let value = match suffix.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                log::error!("could not decode resolution from {:?} in column {:?}", suffix, column);
                return Err(anyhow!("could not decode resolution from column {:?}", column));
            }
        };
        Ok(Resolution { column: column.to_string(), suffix: suffix.to_string(), value })
    } // end of from_column

    pub fn get_column(&self) -> &str {
        &self.column
    }

    /// the raw resolution text as it appears in the column name
    pub fn get_suffix(&self) -> &str {
        &self.suffix
    }

    pub fn get_value(&self) -> f64 {
        self.value
    }
} // end of impl Resolution

//===================================================================================

/// Immutable clustering assignments of the same samples at several resolutions.
#[derive(Debug, Clone)]
pub struct ClusteringMatrix<L> {
    /// prefix shared by all resolution columns
    prefix: String,
    /// resolutions in column order
    resolutions: Vec<Resolution>,
    /// labels\[r\]\[s\] is the cluster of sample s at resolution r
    labels: Vec<Vec<L>>,
    /// groups\[r\] maps each cluster present at resolution r to its samples
    groups: Vec<ClusterGroups<L>>,
    nb_samples: usize,
} // end of struct ClusteringMatrix

impl<L> ClusteringMatrix<L>
where
    L: ClusterLabel,
{
    /// Build the matrix from named columns given in resolution order.
    ///
    /// Fails if there is no column, if a column name does not decode to a resolution,
    /// if two columns share a name, if columns have different lengths or if a column has no label.
    pub fn from_columns(prefix: &str, columns: Vec<(String, Vec<L>)>) -> anyhow::Result<Self> {
        //
        if columns.is_empty() {
            log::error!("ClusteringMatrix::from_columns no resolution column");
            return Err(anyhow!("clustering matrix has no resolution column"));
        }
        let nb_samples = columns[0].1.len();
        let mut names = IndexSet::<&str>::with_capacity(columns.len());
        let mut resolutions = Vec::<Resolution>::with_capacity(columns.len());
        for (name, col) in &columns {
            if !names.insert(name.as_str()) {
                log::error!("duplicated resolution column {:?}", name);
                return Err(anyhow!("duplicated resolution column {:?}", name));
            }
            if col.is_empty() {
                log::error!("resolution column {:?} has no cluster label", name);
                return Err(anyhow!("resolution column {:?} has no cluster label", name));
            }
            if col.len() != nb_samples {
                log::error!(
                    "resolution column {:?} has {} labels, first column has {}",
                    name,
                    col.len(),
                    nb_samples
                );
                return Err(anyhow!(
                    "resolution column {:?} has {} labels, expected {}",
                    name,
                    col.len(),
                    nb_samples
                ));
            }
            resolutions.push(Resolution::from_column(prefix, name)?);
        }
        //
        let labels: Vec<Vec<L>> = columns.into_iter().map(|(_, col)| col).collect();
        let groups: Vec<ClusterGroups<L>> =
            labels.par_iter().map(|col| group_labels(col)).collect();
        log::debug!(
            "clustering matrix : {} samples, {} resolutions, nb clusters by resolution {:?}",
            nb_samples,
            resolutions.len(),
            groups.iter().map(|g| g.len()).collect::<Vec<usize>>()
        );
        //
        Ok(ClusteringMatrix { prefix: prefix.to_string(), resolutions, labels, groups, nb_samples })
    } // end of from_columns

    pub fn get_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn get_nb_samples(&self) -> usize {
        self.nb_samples
    }

    pub fn get_nb_resolutions(&self) -> usize {
        self.resolutions.len()
    }

    pub fn get_resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    pub fn get_resolution(&self, res: usize) -> &Resolution {
        &self.resolutions[res]
    }

    /// labels of all samples at resolution res
    pub fn get_labels(&self, res: usize) -> &[L] {
        &self.labels[res]
    }

    /// clusters at resolution res with their samples, in ascending label order
    pub fn get_groups(&self, res: usize) -> &ClusterGroups<L> {
        &self.groups[res]
    }

    /// number of samples in cluster label at resolution res, 0 if the label is absent
    pub fn get_cluster_size(&self, res: usize, label: &L) -> usize {
        self.groups[res].get(label).map_or(0, |samples| samples.len())
    }

    /// The node id of a cluster: `<prefix><resolution>C<label>`.
    /// Node and edge builders both go through here so their ids always join.
    pub fn node_id(&self, res: usize, label: &L) -> String {
        format!("{}{}C{}", self.prefix, self.resolutions[res].suffix, label)
    }

    /// pairs (r, r+1) of resolutions adjacent in column order
    pub fn adjacent_pairs(&self) -> Vec<(usize, usize)> {
        (1..self.resolutions.len()).map(|r| (r - 1, r)).collect()
    }
} // end of impl ClusteringMatrix

/// group sample indexes by label
fn group_labels<L: ClusterLabel>(labels: &[L]) -> ClusterGroups<L> {
    let mut groups = ClusterGroups::<L>::new();
    for (sample, label) in labels.iter().enumerate() {
        groups.entry(label.clone()).or_insert_with(Vec::new).push(sample);
    }
    groups
} // end of group_labels

//========================================================================================

// end of mod tests
