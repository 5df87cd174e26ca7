//! clustree binary.
//!
//! Builds the cluster tree of clusterings stored in a csv file and dumps it.
//! Command syntax is
//! clustree --csv csvfile --prefix prefix [--delim c] [filter params] [node params] [outputs].
//!
//! The csv file must have a header line. Columns whose name begins with prefix hold cluster labels
//! (non negative integers) at the resolution given by the rest of the name,
//! e.g. res.0.2, res.0.4 ...
//! Other columns are metadata usable for node attributes. The default delimiter is ','.
//!
//! - filter params :
//!  --count-filter : an edge is kept if its count is strictly greater, default 0
//!  --prop-filter  : an edge is kept if its proportion is strictly greater, default 0.1
//!  --skip-zero    : do not enumerate pairs of clusters without common sample
//!
//! - node params :
//!  --colour, --size, --alpha : either column:aggregator to aggregate a metadata column
//!     on each node, aggregator being one of mean, median, min, max, sum, mode, first,
//!     or a constant value left to the renderer.
//!     A metadata column given without aggregator is an error.
//!  --no-stability : do not compute the SC3 stability index of nodes
//!
//! - outputs :
//!  --out or -o : json file with nodes and filtered edges, default "clustree.json"
//!  --nodes     : csv file with the node table
//!  --edges     : csv file with the unfiltered edge table
//!
//! Set RUST_LOG=clustree=INFO to get a summary of the construction.

use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command};
use cpu_time::ProcessTime;

use clustree::prelude::*;

// column:aggregator or a constant
fn parse_node_attribute(arg: &str) -> anyhow::Result<NodeAttribute> {
    match arg.split_once(':') {
        Some((column, aggregator)) => NodeAttribute::from_builtin(column, aggregator),
        None => Ok(NodeAttribute::Constant(MetaValue::parse_field(arg))),
    }
} // end of parse_node_attribute

fn parse_tree_cmd(matches: &ArgMatches) -> Result<TreeParams, anyhow::Error> {
    log::debug!("in parse_tree_cmd");
    //
    let mut treeparams = TreeParams::default();

    if let Some(str) = matches.value_of("count_filter") {
        match str.parse::<usize>() {
            Ok(val) => treeparams.set_count_filter(val),
            _ => return Err(anyhow!("could not parse count-filter parameter")),
        }
    }

    if let Some(str) = matches.value_of("prop_filter") {
        match str.parse::<f64>() {
            Ok(val) => treeparams.set_prop_filter(val),
            _ => return Err(anyhow!("could not parse prop-filter parameter")),
        }
    }

    treeparams.set_skip_zero_overlap(matches.is_present("skip_zero"));
    treeparams.set_stability(!matches.is_present("no_stability"));

    let aesthetics = [
        ("colour", Aesthetic::Colour),
        ("size", Aesthetic::Size),
        ("alpha", Aesthetic::Alpha),
    ];
    for (name, aesthetic) in aesthetics {
        if let Some(str) = matches.value_of(name) {
            let attribute = parse_node_attribute(str)?;
            treeparams.set_node_attribute(aesthetic, attribute);
        }
    }
    //
    Ok(treeparams)
} // end of parse_tree_cmd

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let treeparams = parse_tree_cmd(matches)?;
    //
    let fname = matches.value_of("csvfile").ok_or_else(|| anyhow!("expecting a csv file"))?;
    let prefix = matches.value_of("prefix").ok_or_else(|| anyhow!("expecting a prefix"))?;
    let delim = match matches.value_of("delim") {
        Some(str) if str.len() == 1 => str.as_bytes()[0],
        Some(str) => return Err(anyhow!("delimiter must be one byte, got {:?}", str)),
        None => b',',
    };
    log::info!("input file : {:?}, prefix : {:?}", fname, prefix);
    //
    let cpu_start = ProcessTime::now();
    let sys_now = SystemTime::now();
    let (matrix, metadata) = load_clustering_csv(Path::new(fname), prefix, delim)?;
    log::info!("csv file {} read", fname);
    treeparams.aesthetics.check_constants(&metadata)?;
    let build = build_cluster_tree(&matrix, Some(&metadata), &treeparams)?;
    let cpu_time: Duration = cpu_start.elapsed();
    println!(
        " cluster tree : {} nodes, {} edges kept out of {}, sys time(ms) {:?} cpu time(ms) {:?}",
        build.tree.nb_nodes(),
        build.tree.nb_edges(),
        build.edges.len(),
        sys_now.elapsed().map(|d| d.as_millis()).unwrap_or(0),
        cpu_time.as_millis()
    );
    //
    let json_output = matches.value_of("outfile").unwrap_or("clustree.json");
    log::info!("dumping graph in json file {}", json_output);
    write_graph_json(File::create(json_output)?, &build.tree)?;
    if let Some(nodes_output) = matches.value_of("nodes") {
        log::info!("dumping nodes in csv file {}", nodes_output);
        write_nodes_csv(File::create(nodes_output)?, &build.nodes, prefix)?;
    }
    if let Some(edges_output) = matches.value_of("edges") {
        log::info!("dumping edges in csv file {}", edges_output);
        write_edges_csv(File::create(edges_output)?, &build.edges)?;
    }
    Ok(())
} // end of run

pub fn main() {
    println!("initializing default logger from environment ...");
    env_logger::Builder::from_default_env().init();
    log::info!("logger initialized from default environment");
    //
    let matches = Command::new("clustree")
        .arg_required_else_help(true)
        .arg(Arg::new("csvfile")
            .long("csv")
            .takes_value(true)
            .required(true)
            .help("expecting a csv file"))
        .arg(Arg::new("prefix")
            .long("prefix")
            .short('p')
            .takes_value(true)
            .required(true)
            .help("prefix of resolution columns"))
        .arg(Arg::new("delim")
            .long("delim")
            .short('d')
            .takes_value(true)
            .help("delimiter can be ' ', ','"))
        .arg(Arg::new("count_filter")
            .long("count-filter")
            .takes_value(true)
            .help("keep edges with count strictly greater, default 0"))
        .arg(Arg::new("prop_filter")
            .long("prop-filter")
            .takes_value(true)
            .help("keep edges with proportion strictly greater, default 0.1"))
        .arg(Arg::new("skip_zero")
            .long("skip-zero")
            .help("do not enumerate pairs of clusters without common sample"))
        .arg(Arg::new("no_stability")
            .long("no-stability")
            .help("do not compute sc3 stability of nodes"))
        .arg(Arg::new("colour")
            .long("colour")
            .takes_value(true)
            .help("column:aggregator or constant"))
        .arg(Arg::new("size")
            .long("size")
            .takes_value(true)
            .help("column:aggregator or constant"))
        .arg(Arg::new("alpha")
            .long("alpha")
            .takes_value(true)
            .help("column:aggregator or constant"))
        .arg(Arg::new("outfile")
            .long("out")
            .short('o')
            .takes_value(true)
            .help("expecting json output file name"))
        .arg(Arg::new("nodes")
            .long("nodes")
            .takes_value(true)
            .help("csv file for node table"))
        .arg(Arg::new("edges")
            .long("edges")
            .takes_value(true)
            .help("csv file for unfiltered edge table"))
        .get_matches();
    //
    if let Err(e) = run(&matches) {
        log::error!("clustree failed : {:?}", e);
        println!("exiting with error {:?}", e);
        std::process::exit(1);
    }
} // end of main
