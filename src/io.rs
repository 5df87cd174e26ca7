//! To take charge of io : csv input of clusterings, csv dumps of tables, json dump of the graph.
//!
//! The input csv file has a header line. Columns whose name begins with the prefix are
//! the resolutions, in file order, other columns are metadata.
//! Lines beginning with '#' or '%' before the header are skipped.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use anyhow::anyhow;

use csv::{ReaderBuilder, Writer, WriterBuilder};
use serde::Serialize;

use crate::edges::EdgeTable;
use crate::graph::ClusterTree;
use crate::matrix::{ClusterLabel, ClusteringMatrix};
use crate::metadata::{MetaValue, MetadataTable};
use crate::nodes::NodeTable;

// skip first lines beginning with '#' or '%', returns number of lines skipped
fn skip_comment_lines<R: BufRead>(reader: &mut R) -> anyhow::Result<usize> {
    let mut nb_comment_lines = 0;
    let mut line = String::new();
    loop {
        let first = reader.fill_buf()?.first().copied();
        match first {
            Some(c) if c == b'#' || c == b'%' => {
                line.clear();
                reader.read_line(&mut line)?;
                nb_comment_lines += 1;
            }
            _ => break,
        }
    }
    log::debug!("skipped {} comment lines", nb_comment_lines);
    Ok(nb_comment_lines)
} // end of skip_comment_lines

/// Read clusterings and metadata from a delimited text source.
///
/// Cluster labels must be non negative integers.
/// Metadata cells are numbers when they parse as such, text otherwise.
pub fn read_clustering_csv<R: Read>(
    reader: R,
    prefix: &str,
    delim: u8,
) -> anyhow::Result<(ClusteringMatrix<u32>, MetadataTable)> {
    //
    let mut bufreader = BufReader::new(reader);
    skip_comment_lines(&mut bufreader)?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(true)
        .flexible(false)
        .from_reader(bufreader);
    let headers = rdr.headers()?.clone();
    let (res_fields, meta_fields): (Vec<usize>, Vec<usize>) =
        (0..headers.len()).partition(|j| headers[*j].starts_with(prefix));
    log::info!(
        "csv header : {} resolution columns, {} metadata columns",
        res_fields.len(),
        meta_fields.len()
    );
    if res_fields.is_empty() {
        log::error!("no column begins with prefix {:?}, delimiter {:?}", prefix, delim as char);
        return Err(anyhow!(
            "no column begins with prefix {:?}, delimiter {:?}",
            prefix,
            delim as char
        ));
    }
    //
    let mut labels: Vec<Vec<u32>> = vec![Vec::new(); res_fields.len()];
    let mut metadata: Vec<Vec<MetaValue>> = vec![Vec::new(); meta_fields.len()];
    let mut num_record = 0;
    for result in rdr.records() {
        num_record += 1;
        let record = result?;
        if log::log_enabled!(log::Level::Trace) && num_record <= 2 {
            log::trace!("record num {}, {:?}", num_record, record);
        }
        for (k, j) in res_fields.iter().enumerate() {
            let field = &record[*j];
            match field.trim().parse::<u32>() {
                Ok(label) => labels[k].push(label),
                Err(_) => {
                    log::error!(
                        "error decoding cluster label in column {} of record {}, field : {:?}",
                        &headers[*j],
                        num_record,
                        field
                    );
                    return Err(anyhow!(
                        "error decoding cluster label in column {} of record {}, field : {:?}",
                        &headers[*j],
                        num_record,
                        field
                    ));
                }
            }
        }
        for (k, j) in meta_fields.iter().enumerate() {
            metadata[k].push(MetaValue::parse_field(&record[*j]));
        }
    }
    log::info!("read {} records", num_record);
    //
    let columns = res_fields.iter().map(|j| headers[*j].to_string()).zip(labels).collect();
    let matrix = ClusteringMatrix::from_columns(prefix, columns)?;
    let meta_columns = meta_fields.iter().map(|j| headers[*j].to_string()).zip(metadata).collect();
    let metadata = MetadataTable::from_columns(num_record, meta_columns)?;
    Ok((matrix, metadata))
} // end of read_clustering_csv

/// load clusterings and metadata from a csv file, see [read_clustering_csv]
pub fn load_clustering_csv(
    filepath: &Path,
    prefix: &str,
    delim: u8,
) -> anyhow::Result<(ClusteringMatrix<u32>, MetadataTable)> {
    let fileres = OpenOptions::new().read(true).open(filepath);
    let file = match fileres {
        Ok(file) => file,
        Err(e) => {
            log::error!("load_clustering_csv : could not open file {:?}", filepath.as_os_str());
            return Err(anyhow!("could not open file {} : {}", filepath.display(), e));
        }
    };
    read_clustering_csv(file, prefix, delim)
} // end of load_clustering_csv

/// Dump the node table: node, resolution, cluster, size, sc3_stability then aggregated attributes.
/// resolution_column is the header of the resolution column.
pub fn write_nodes_csv<L: ClusterLabel, W: Write>(
    writer: W,
    nodes: &NodeTable<L>,
    resolution_column: &str,
) -> anyhow::Result<usize> {
    let mut wtr = Writer::from_writer(writer);
    let mut header = vec!["node", resolution_column, "cluster", "size", "sc3_stability"];
    header.extend(nodes.get_attribute_names().iter().map(|s| s.as_str()));
    wtr.write_record(&header)?;
    for node in nodes.iter() {
        let mut line = vec![
            node.node.clone(),
            node.resolution.to_string(),
            node.cluster.to_string(),
            node.size.to_string(),
            node.sc3_stability.map_or(String::new(), |s| format!("{:.5e}", s)),
        ];
        for name in nodes.get_attribute_names() {
            line.push(node.attributes.get(name).map_or(String::new(), |v| v.to_string()));
        }
        wtr.write_record(&line)?;
    }
    wtr.flush()?;
    Ok(nodes.len())
} // end of write_nodes_csv

/// Dump the (unfiltered) edge table, one record by edge with a header line.
pub fn write_edges_csv<L: ClusterLabel + Serialize, W: Write>(
    writer: W,
    edges: &EdgeTable<L>,
) -> anyhow::Result<usize> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
    for edge in edges.iter() {
        wtr.serialize(edge)?;
    }
    wtr.flush()?;
    Ok(edges.len())
} // end of write_edges_csv

/// Dump the graph in json : `{ "nodes" : [...], "edges" : [...] }`
pub fn write_graph_json<L: ClusterLabel + Serialize, W: Write>(
    writer: W,
    tree: &ClusterTree<L>,
) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, &tree.export())?;
    Ok(())
}

//========================================================================================

#[cfg(test)]
mod tests {

    //    cargo test io  -- --nocapture
    //    RUST_LOG=clustree::io=TRACE cargo test testname -- --nocapture

    use super::*;

    use crate::aggregate::{Aesthetic, NodeAesthetics, NodeAttribute};
    use crate::edges::{build_edges, EdgeOptions};
    use crate::graph::EdgeFilter;
    use crate::nodes::build_nodes;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    const CSV: &str = "# clusterings of 6 cells\n\
        % second comment\n\
        cell,res.0.1,age,res.0.5,type\n\
        c1,0,10,0,T\n\
        c2,0,20,0,T\n\
        c3,0,30,1,B\n\
        c4,1,40,1,B\n\
        c5,1,50,2,NK\n\
        c6,1,60,2,NK\n";

    #[test]
    fn test_read_csv() {
        log_init_test();
        //
        let (matrix, metadata) = read_clustering_csv(CSV.as_bytes(), "res.", b',').unwrap();
        assert_eq!(matrix.get_nb_samples(), 6);
        assert_eq!(matrix.get_nb_resolutions(), 2);
        assert_eq!(matrix.get_resolution(1).get_column(), "res.0.5");
        assert_eq!(matrix.get_labels(1), &[0, 0, 1, 1, 2, 2]);
        let names: Vec<&str> = metadata.get_column_names().collect();
        assert_eq!(names, vec!["cell", "age", "type"]);
        assert_eq!(metadata.get_column("age").unwrap()[2], MetaValue::Num(30.));
        assert_eq!(metadata.get_column("type").unwrap()[4], MetaValue::from("NK"));
    } // end of test_read_csv

    #[test]
    fn test_read_csv_errors() {
        log_init_test();
        //
        assert!(read_clustering_csv(CSV.as_bytes(), "k", b',').is_err());
        let bad_label = "k1,k2\n0,1\n0,x\n";
        assert!(read_clustering_csv(bad_label.as_bytes(), "k", b',').is_err());
        let ragged = "k1,k2\n0,1\n0\n";
        assert!(read_clustering_csv(ragged.as_bytes(), "k", b',').is_err());
        assert!(load_clustering_csv(Path::new("/nonexistent/clusterings.csv"), "k", b',').is_err());
    }

    #[test]
    fn test_dumps() {
        let (matrix, metadata) = read_clustering_csv(CSV.as_bytes(), "res.", b',').unwrap();
        let nodes = build_nodes(&matrix, Some(&metadata), &[], true).unwrap();
        let edges = build_edges(&matrix, EdgeOptions::default());
        //
        let mut out = Vec::<u8>::new();
        assert_eq!(write_nodes_csv(&mut out, &nodes, "res.").unwrap(), 5);
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "node,res.,cluster,size,sc3_stability");
        assert!(lines.next().unwrap().starts_with("res.0.1C0,0.1,0,3,"));
        //
        let mut out = Vec::<u8>::new();
        assert_eq!(write_edges_csv(&mut out, &edges).unwrap(), 6);
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().next().unwrap().starts_with("from_node,to_node,from_res,from_clust"));
        assert_eq!(text.lines().count(), 7);
        //
        let tree = ClusterTree::assemble(&nodes, &edges, EdgeFilter::default()).unwrap();
        let mut out = Vec::<u8>::new();
        write_graph_json(&mut out, &tree).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["edges"].as_array().unwrap().len(), 4);
    } // end of test_dumps

    #[test]
    fn test_dumps_aggregated_attributes() {
        log_init_test();
        //
        let (matrix, metadata) = read_clustering_csv(CSV.as_bytes(), "res.", b',').unwrap();
        let mut aesthetics = NodeAesthetics::new();
        aesthetics.set(Aesthetic::Colour, NodeAttribute::from_builtin("age", "mean").unwrap());
        aesthetics.set(Aesthetic::Size, NodeAttribute::from_builtin("type", "mode").unwrap());
        let aggregations = aesthetics.aggregations(Some(&metadata));
        let nodes = build_nodes(&matrix, Some(&metadata), &aggregations, true).unwrap();
        //
        let mut out = Vec::<u8>::new();
        write_nodes_csv(&mut out, &nodes, "res.").unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        let header = "node,res.,cluster,size,sc3_stability,colour_age,size_type";
        assert_eq!(lines.next().unwrap(), header);
        // res.0.1C0 holds cells of age 10, 20, 30 and types T, T, B
        let first = lines.next().unwrap();
        assert!(first.starts_with("res.0.1C0,"));
        assert!(first.ends_with(",20,T"));
        //
        let edges = build_edges(&matrix, EdgeOptions::default());
        let tree = ClusterTree::assemble(&nodes, &edges, EdgeFilter::default()).unwrap();
        let mut out = Vec::<u8>::new();
        write_graph_json(&mut out, &tree).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let node = &json["nodes"][0];
        assert_eq!(node["node"], "res.0.1C0");
        assert_eq!(node["colour_age"], 20.0);
        assert_eq!(node["size_type"], "T");
        // res.0.5C2 holds cells of age 50, 60
        let nodes = json["nodes"].as_array().unwrap();
        let last = nodes.iter().find(|n| n["node"] == "res.0.5C2").unwrap();
        assert_eq!(last["colour_age"], 55.0);
    } // end of test_dumps_aggregated_attributes
} // end of mod tests
