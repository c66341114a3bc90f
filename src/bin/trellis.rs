//! Trellis CLI — build, inspect and re-export property graph snapshots.
//!
//! Usage:
//!   trellis demo [--cascade]
//!   trellis load <snapshot.json> [--config graph.yaml] [--export out.json]

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use trellis::{
    EdgeId, GraphConfig, GraphElement, GraphError, GraphFactory, GraphResult, GraphSnapshot, NewEdge,
    NewVertex, PropertyGraph, VertexId,
};

#[derive(Parser)]
#[command(
    name = "trellis",
    version,
    about = "In-memory property graph engine"
)]
struct Cli {
    /// Log element registration and removal
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a two-person graph and print its snapshot
    Demo {
        /// Remove the first person before printing
        #[arg(long)]
        cascade: bool,
    },
    /// Restore a JSON snapshot and report what it holds
    Load {
        /// Snapshot file written by `demo` or `--export`
        path: PathBuf,
        /// YAML graph configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the restored graph back out as a snapshot
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "trellis=debug" } else { "trellis=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_demo(cascade: bool) -> GraphResult<PropertyGraph> {
    let graph = PropertyGraph::new();
    graph.set_property("name", "demo")?;
    graph.add_vertex(
        NewVertex::new()
            .with_id(VertexId::new(1))
            .with_label("Person")
            .with_property("name", "alice"),
    )?;
    graph.add_vertex(
        NewVertex::new()
            .with_id(VertexId::new(2))
            .with_label("Person")
            .with_property("name", "bob"),
    )?;
    graph.add_edge(
        NewEdge::new(VertexId::new(1), VertexId::new(2))
            .with_id(EdgeId::new(10))
            .with_label("knows"),
    )?;
    if cascade {
        graph.remove_vertex(VertexId::new(1));
    }
    Ok(graph)
}

fn cmd_demo(cascade: bool) -> i32 {
    let snapshot = match build_demo(cascade) {
        Ok(graph) => GraphSnapshot::capture(&graph),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match snapshot.to_json_pretty() {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn load_factory(config: Option<&Path>) -> GraphResult<GraphFactory> {
    let config = match config {
        Some(path) => GraphConfig::load(path)?,
        None => GraphConfig::default(),
    };
    GraphFactory::new(config)
}

fn cmd_load(path: &Path, config: Option<&Path>, export: Option<&Path>) -> i32 {
    let factory = match load_factory(config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: cannot load config: {}", e);
            return 1;
        }
    };
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", path.display(), e);
            return 1;
        }
    };
    let graph = match GraphSnapshot::from_json(&json).and_then(|s| s.restore(&factory)) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    println!("{:<12}  {}", "GRAPH", graph.id());
    println!("{}", "-".repeat(40));
    println!("{:<12}  {:>6}", "vertices", graph.vertex_count());
    println!("{:<12}  {:>6}", "edges", graph.edge_count());
    println!("{:<12}  {:>6}", "hyperedges", graph.hyperedge_count());

    if let Some(out) = export {
        let written = GraphSnapshot::capture(&graph)
            .to_json_pretty()
            .and_then(|json| std::fs::write(out, json).map_err(GraphError::from));
        if let Err(e) = written {
            eprintln!("Error: cannot export to '{}': {}", out.display(), e);
            return 1;
        }
        println!("Exported to '{}'", out.display());
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let code = match cli.command {
        Commands::Demo { cascade } => cmd_demo(cascade),
        Commands::Load {
            path,
            config,
            export,
        } => cmd_load(&path, config.as_deref(), export.as_deref()),
    };
    std::process::exit(code);
}
