//! Per sample metadata used as source of aggregated node attributes.
//!
//! Rows are aligned with the rows of the [ClusteringMatrix](crate::matrix::ClusteringMatrix).

use std::fmt;

use anyhow::anyhow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A metadata cell, or the result of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Num(f64),
    Text(String),
} // end of enum MetaValue

impl MetaValue {
    /// decode a text field : a number if it parses as a finite f64, text otherwise.
    /// "nan", "inf" ... are missing value markers, they stay text.
    pub fn parse_field(field: &str) -> Self {
        let trimmed = field.trim();
        match trimmed.parse::<f64>() {
            Ok(v) if !trimmed.is_empty() && v.is_finite() => MetaValue::Num(v),
            _ => MetaValue::Text(field.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Num(v) => Some(*v),
            MetaValue::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, MetaValue::Num(_))
    }
} // end of impl MetaValue

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Num(v) => write!(f, "{}", v),
            MetaValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Num(v)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

//=======================================================================================

/// Named metadata columns, all of the same length.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    nb_rows: usize,
    columns: IndexMap<String, Vec<MetaValue>>,
} // end of struct MetadataTable

impl MetadataTable {
    /// a table with nb_rows rows and no column yet
    pub fn new(nb_rows: usize) -> Self {
        MetadataTable { nb_rows, columns: IndexMap::new() }
    }

    /// build from named columns, columns must have equal lengths and distinct names
    pub fn from_columns(
        nb_rows: usize,
        columns: Vec<(String, Vec<MetaValue>)>,
    ) -> anyhow::Result<Self> {
        let mut table = MetadataTable::new(nb_rows);
        for (name, values) in columns {
            table.add_column(name, values)?;
        }
        Ok(table)
    } // end of from_columns

    pub fn add_column(&mut self, name: String, values: Vec<MetaValue>) -> anyhow::Result<()> {
        if values.len() != self.nb_rows {
            log::error!("column {:?} has {} rows, not {}", name, values.len(), self.nb_rows);
            return Err(anyhow!(
                "metadata column {:?} has {} rows, expected {}",
                name,
                values.len(),
                self.nb_rows
            ));
        }
        if self.columns.contains_key(&name) {
            log::error!("duplicated metadata column {:?}", name);
            return Err(anyhow!("duplicated metadata column {:?}", name));
        }
        self.columns.insert(name, values);
        Ok(())
    } // end of add_column

    pub fn get_nb_rows(&self) -> usize {
        self.nb_rows
    }

    pub fn get_nb_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// column names in insertion order
    pub fn get_column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn get_column(&self, name: &str) -> Option<&[MetaValue]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// values of column name at rows given by indexes, None if the column does not exist
    pub fn slice(&self, name: &str, rows: &[usize]) -> Option<Vec<MetaValue>> {
        let column = self.columns.get(name)?;
        Some(rows.iter().map(|r| column[*r].clone()).collect())
    }

    /// check rows are aligned with a clustering of nb_samples samples
    pub fn check_rows(&self, nb_samples: usize) -> anyhow::Result<()> {
        if self.nb_rows != nb_samples {
            log::error!("metadata has {} rows, clustering {} samples", self.nb_rows, nb_samples);
            return Err(anyhow!(
                "metadata has {} rows but clustering matrix has {} samples",
                self.nb_rows,
                nb_samples
            ));
        }
        Ok(())
    }
} // end of impl MetadataTable

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_parse_field() {
        assert_eq!(MetaValue::parse_field("3.5"), MetaValue::Num(3.5));
        assert_eq!(MetaValue::parse_field(" 2 "), MetaValue::Num(2.));
        assert_eq!(MetaValue::parse_field("T cell"), MetaValue::Text(String::from("T cell")));
        assert_eq!(MetaValue::parse_field(""), MetaValue::Text(String::new()));
    }

    #[test]
    fn test_non_finite_fields_stay_text() {
        for marker in ["nan", "NaN", "inf", "-inf", "infinity", "Infinity"] {
            assert_eq!(MetaValue::parse_field(marker), MetaValue::Text(marker.to_string()));
            assert!(!MetaValue::parse_field(marker).is_numeric());
        }
        assert_eq!(MetaValue::parse_field("1e3"), MetaValue::Num(1000.));
    }

    #[test]
    fn test_slice() {
        let table = MetadataTable::from_columns(
            4,
            vec![(String::from("age"), vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into()])],
        )
        .unwrap();
        assert!(table.has_column("age"));
        let sliced = table.slice("age", &[1, 3]).unwrap();
        assert_eq!(sliced, vec![MetaValue::Num(2.), MetaValue::Num(4.)]);
        assert!(table.slice("weight", &[0]).is_none());
        assert!(table.check_rows(4).is_ok());
        assert!(table.check_rows(5).is_err());
    }

    #[test]
    fn test_bad_columns() {
        let mut table = MetadataTable::new(2);
        assert!(table.add_column(String::from("a"), vec![1.0.into()]).is_err());
        assert!(table.add_column(String::from("a"), vec![1.0.into(), "x".into()]).is_ok());
        assert!(table.add_column(String::from("a"), vec![1.0.into(), "x".into()]).is_err());
        assert_eq!(table.get_nb_columns(), 1);
    }
} // end of mod tests
