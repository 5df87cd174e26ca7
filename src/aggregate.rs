//! Node attributes computed from metadata.
//!
//! A node aesthetic (colour, size, alpha) is either a constant, applied uniformly by the renderer,
//! or an aggregation of a metadata column over the samples of each cluster.
//! Only aggregations reach the node builder, see [NodeAesthetics::aggregations].
//!
//! Aggregators are caller supplied functions reducing a slice of metadata values to one value.
//! Some usual ones are given in [builtin].

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;

use serde::Serialize;

use crate::metadata::{MetaValue, MetadataTable};

/// reduces the metadata values of a cluster to one value.
pub type Aggregator = Arc<dyn Fn(&[MetaValue]) -> anyhow::Result<MetaValue> + Send + Sync>;

/// The node aesthetics that can carry an aggregated attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aesthetic {
    Colour,
    Size,
    Alpha,
}

impl Aesthetic {
    pub fn name(&self) -> &'static str {
        match self {
            Aesthetic::Colour => "colour",
            Aesthetic::Size => "size",
            Aesthetic::Alpha => "alpha",
        }
    }
}

impl fmt::Display for Aesthetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// aggregation of a metadata column by a named aggregator
#[derive(Clone)]
pub struct ColumnAggregation {
    column: String,
    aggregator_name: String,
    aggregator: Aggregator,
} // end of struct ColumnAggregation

impl ColumnAggregation {
    pub fn new(column: &str, aggregator_name: &str, aggregator: Aggregator) -> Self {
        ColumnAggregation {
            column: column.to_string(),
            aggregator_name: aggregator_name.to_string(),
            aggregator,
        }
    }

    pub fn get_column(&self) -> &str {
        &self.column
    }

    pub fn get_aggregator_name(&self) -> &str {
        &self.aggregator_name
    }

    /// run the aggregator on values. Errors are returned as they come from the aggregator.
    pub fn apply(&self, values: &[MetaValue]) -> anyhow::Result<MetaValue> {
        (self.aggregator)(values)
    }
} // end of impl ColumnAggregation

impl fmt::Debug for ColumnAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnAggregation")
            .field("column", &self.column)
            .field("aggregator", &self.aggregator_name)
            .finish()
    }
}

/// The value given to a node aesthetic.
#[derive(Debug, Clone)]
pub enum NodeAttribute {
    /// same value for all nodes, left to the renderer
    Constant(MetaValue),
    /// value computed for each node from a metadata column
    MetadataAggregate(ColumnAggregation),
} // end of enum NodeAttribute

impl NodeAttribute {
    pub fn aggregate(column: &str, aggregator_name: &str, aggregator: Aggregator) -> Self {
        let aggregation = ColumnAggregation::new(column, aggregator_name, aggregator);
        NodeAttribute::MetadataAggregate(aggregation)
    }

    /// aggregation of column with one of the [builtin] aggregators
    pub fn from_builtin(column: &str, aggregator_name: &str) -> anyhow::Result<Self> {
        let aggregator = builtin::aggregator_by_name(aggregator_name)?;
        Ok(NodeAttribute::aggregate(column, aggregator_name, aggregator))
    }
} // end of impl NodeAttribute

/// an aggregation attached to the aesthetic it feeds
#[derive(Debug, Clone)]
pub struct AttributeAggregation {
    pub aesthetic: Aesthetic,
    pub aggregation: ColumnAggregation,
}

impl AttributeAggregation {
    /// name under which the value is stored in node attributes : `<aesthetic>_<column>`
    pub fn attribute_name(&self) -> String {
        format!("{}_{}", self.aesthetic.name(), self.aggregation.get_column())
    }
}

/// The optional colour, size and alpha attributes of nodes.
#[derive(Debug, Clone, Default)]
pub struct NodeAesthetics {
    pub colour: Option<NodeAttribute>,
    pub size: Option<NodeAttribute>,
    pub alpha: Option<NodeAttribute>,
} // end of struct NodeAesthetics

impl NodeAesthetics {
    pub fn new() -> Self {
        NodeAesthetics::default()
    }

    pub fn set(&mut self, aesthetic: Aesthetic, attribute: NodeAttribute) {
        match aesthetic {
            Aesthetic::Colour => self.colour = Some(attribute),
            Aesthetic::Size => self.size = Some(attribute),
            Aesthetic::Alpha => self.alpha = Some(attribute),
        }
    }

    pub fn get(&self, aesthetic: Aesthetic) -> Option<&NodeAttribute> {
        match aesthetic {
            Aesthetic::Colour => self.colour.as_ref(),
            Aesthetic::Size => self.size.as_ref(),
            Aesthetic::Alpha => self.alpha.as_ref(),
        }
    }

    /// The aggregations the node builder must run.
    ///
    /// Constants are dropped. An aggregation over a column absent from metadata
    /// is considered a constant too: it is dropped with a warning.
    pub fn aggregations(&self, metadata: Option<&MetadataTable>) -> Vec<AttributeAggregation> {
        let mut aggregations = Vec::<AttributeAggregation>::new();
        for aesthetic in [Aesthetic::Colour, Aesthetic::Size, Aesthetic::Alpha] {
            match self.get(aesthetic) {
                Some(NodeAttribute::MetadataAggregate(aggregation)) => {
                    let known = metadata.map_or(false, |m| m.has_column(aggregation.get_column()));
                    if known {
                        let aggregation = aggregation.clone();
                        aggregations.push(AttributeAggregation { aesthetic, aggregation });
                    } else {
                        log::warn!(
                            "node {} : {:?} is not a metadata column, used as a constant",
                            aesthetic,
                            aggregation.get_column()
                        );
                    }
                }
                Some(NodeAttribute::Constant(value)) => {
                    log::debug!("node {} is constant {}", aesthetic, value);
                }
                None => {}
            }
        }
        aggregations
    } // end of aggregations

    /// A constant naming a metadata column is a column given without aggregator: it is an error.
    pub fn check_constants(&self, metadata: &MetadataTable) -> anyhow::Result<()> {
        for aesthetic in [Aesthetic::Colour, Aesthetic::Size, Aesthetic::Alpha] {
            if let Some(NodeAttribute::Constant(MetaValue::Text(name))) = self.get(aesthetic) {
                if metadata.has_column(name) {
                    log::error!("node {} : column {:?} given without aggregator", aesthetic, name);
                    return Err(anyhow!(
                        "node {} : {:?} is a metadata column, use column:aggregator",
                        aesthetic,
                        name
                    ));
                }
            }
        }
        Ok(())
    } // end of check_constants
} // end of impl NodeAesthetics

//========================================================================================

/// Usual aggregators: mean, median, min, max, sum, mode, first.
///
/// Numeric aggregators fail on an empty slice or on a text value.
pub mod builtin {

    use super::*;

    /// get a builtin aggregator from its name
    pub fn aggregator_by_name(name: &str) -> anyhow::Result<Aggregator> {
        let aggregator: Aggregator = match name {
            "mean" => Arc::new(mean),
            "median" => Arc::new(median),
            "min" => Arc::new(min),
            "max" => Arc::new(max),
            "sum" => Arc::new(sum),
            "mode" => Arc::new(mode),
            "first" => Arc::new(first),
            _ => {
                log::error!("unknown aggregator {:?}", name);
                return Err(anyhow!(
                    "unknown aggregator {:?}, expected mean, median, min, max, sum, mode or first",
                    name
                ));
            }
        };
        Ok(aggregator)
    } // end of aggregator_by_name

    fn numbers(values: &[MetaValue]) -> anyhow::Result<Vec<f64>> {
        if values.is_empty() {
            return Err(anyhow!("cannot aggregate an empty slice"));
        }
        values
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| anyhow!("non numeric value {:?}", v.to_string())))
            .collect()
    }

    pub fn mean(values: &[MetaValue]) -> anyhow::Result<MetaValue> {
        let x = numbers(values)?;
        Ok(MetaValue::Num(x.iter().sum::<f64>() / x.len() as f64))
    }

    pub fn sum(values: &[MetaValue]) -> anyhow::Result<MetaValue> {
        let x = numbers(values)?;
        Ok(MetaValue::Num(x.iter().sum::<f64>()))
    }

    pub fn median(values: &[MetaValue]) -> anyhow::Result<MetaValue> {
        let mut x = numbers(values)?;
        x.sort_unstable_by(|a, b| a.total_cmp(b));
        let n = x.len();
        let median = if n % 2 == 1 { x[n / 2] } else { 0.5 * (x[n / 2 - 1] + x[n / 2]) };
        Ok(MetaValue::Num(median))
    }

    pub fn min(values: &[MetaValue]) -> anyhow::Result<MetaValue> {
        let x = numbers(values)?;
        Ok(MetaValue::Num(x.iter().cloned().fold(f64::INFINITY, f64::min)))
    }

    pub fn max(values: &[MetaValue]) -> anyhow::Result<MetaValue> {
        let x = numbers(values)?;
        Ok(MetaValue::Num(x.iter().cloned().fold(f64::NEG_INFINITY, f64::max)))
    }

    /// most frequent value, ties broken by first occurrence. Works on text.
    pub fn mode(values: &[MetaValue]) -> anyhow::Result<MetaValue> {
        let mut counts = Vec::<(&MetaValue, usize)>::new();
        for v in values {
            match counts.iter_mut().find(|(seen, _)| *seen == v) {
                Some(entry) => entry.1 += 1,
                None => counts.push((v, 1)),
            }
        }
        let mut best: Option<(&MetaValue, usize)> = None;
        for (v, c) in counts {
            if best.map_or(true, |(_, bc)| c > bc) {
                best = Some((v, c));
            }
        }
        match best {
            Some((v, _)) => Ok(v.clone()),
            None => Err(anyhow!("cannot get mode of an empty slice")),
        }
    } // end of mode

    pub fn first(values: &[MetaValue]) -> anyhow::Result<MetaValue> {
        values.first().cloned().ok_or_else(|| anyhow!("cannot get first value of an empty slice"))
    }
} // end of mod builtin

//========================================================================================

#[cfg(test)]
mod tests {

    use super::builtin::*;
    use super::*;

    fn nums(x: &[f64]) -> Vec<MetaValue> {
        x.iter().map(|v| MetaValue::Num(*v)).collect()
    }

    #[test]
    fn test_numeric_builtins() {
        let x = nums(&[3., 1., 4., 1., 5.]);
        assert_eq!(mean(&x).unwrap(), MetaValue::Num(2.8));
        assert_eq!(median(&x).unwrap(), MetaValue::Num(3.));
        assert_eq!(median(&nums(&[1., 2., 3., 4.])).unwrap(), MetaValue::Num(2.5));
        assert_eq!(min(&x).unwrap(), MetaValue::Num(1.));
        assert_eq!(max(&x).unwrap(), MetaValue::Num(5.));
        assert_eq!(sum(&x).unwrap(), MetaValue::Num(14.));
    }

    #[test]
    fn test_builtins_errors() {
        assert!(mean(&[]).is_err());
        assert!(first(&[]).is_err());
        assert!(mode(&[]).is_err());
        assert!(max(&[MetaValue::from("a")]).is_err());
        assert!(aggregator_by_name("variance").is_err());
    }

    #[test]
    fn test_mode() {
        let x: Vec<MetaValue> = vec!["b".into(), "a".into(), "a".into(), "b".into(), "c".into()];
        // tie between b and a, b seen first
        assert_eq!(mode(&x).unwrap(), MetaValue::from("b"));
        let y = nums(&[2., 7., 7.]);
        assert_eq!(mode(&y).unwrap(), MetaValue::Num(7.));
    }

    #[test]
    fn test_mode_counts_missing_markers() {
        let fields = ["b", "nan", "nan"];
        let x: Vec<MetaValue> = fields.iter().map(|f| MetaValue::parse_field(f)).collect();
        assert_eq!(mode(&x).unwrap(), MetaValue::from("nan"));
    }

    #[test]
    fn test_aggregations_drop_constants_and_unknown_columns() {
        let columns = vec![(String::from("age"), nums(&[1., 2.]))];
        let metadata = MetadataTable::from_columns(2, columns).unwrap();
        let mut aesthetics = NodeAesthetics::new();
        aesthetics.set(Aesthetic::Colour, NodeAttribute::from_builtin("age", "mean").unwrap());
        aesthetics.set(Aesthetic::Size, NodeAttribute::from_builtin("weight", "max").unwrap());
        aesthetics.set(Aesthetic::Alpha, NodeAttribute::Constant(MetaValue::Num(0.5)));
        let aggregations = aesthetics.aggregations(Some(&metadata));
        assert_eq!(aggregations.len(), 1);
        assert_eq!(aggregations[0].aesthetic, Aesthetic::Colour);
        assert_eq!(aggregations[0].attribute_name(), "colour_age");
        // without metadata everything is constant
        assert!(aesthetics.aggregations(None).is_empty());
    }

    #[test]
    fn test_column_without_aggregator_is_rejected() {
        let columns = vec![(String::from("age"), nums(&[1., 2.]))];
        let metadata = MetadataTable::from_columns(2, columns).unwrap();
        let mut aesthetics = NodeAesthetics::new();
        aesthetics.set(Aesthetic::Colour, NodeAttribute::Constant(MetaValue::from("steelblue")));
        aesthetics.set(Aesthetic::Alpha, NodeAttribute::Constant(MetaValue::Num(0.5)));
        assert!(aesthetics.check_constants(&metadata).is_ok());
        aesthetics.set(Aesthetic::Size, NodeAttribute::Constant(MetaValue::from("age")));
        let err = aesthetics.check_constants(&metadata).err().unwrap();
        assert!(err.to_string().contains("size"));
        // a proper aggregation of the column passes
        aesthetics.set(Aesthetic::Size, NodeAttribute::from_builtin("age", "mean").unwrap());
        assert!(aesthetics.check_constants(&metadata).is_ok());
    }
} // end of mod tests
