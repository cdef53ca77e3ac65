use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a feeder project directory and report diagnostics
    Import {
        /// Path to the project directory
        project_dir: PathBuf,
        /// Write a JSON snapshot of the graph to this file
        #[arg(long)]
        emit: Option<PathBuf>,
        /// Include fake-node section edges
        #[arg(long)]
        fake_nodes: bool,
    },
    /// Graph utilities
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },
    /// Visualization helpers
    Viz {
        #[command(subcommand)]
        command: VizCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Graph stats summary
    Stats {
        /// Path to the project directory
        project_dir: PathBuf,
    },
    /// Find islands in the feeder
    Islands {
        /// Path to the project directory
        project_dir: PathBuf,
        /// Emit island IDs per node
        #[arg(long)]
        emit: bool,
    },
    /// List fundamental cycles of the undirected projection
    Cycles {
        /// Path to the project directory
        project_dir: PathBuf,
    },
    /// Export the topology as Graphviz DOT
    Dot {
        /// Path to the project directory
        project_dir: PathBuf,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum VizCommands {
    /// Emit branch segments, class markers, and load drop lines as JSON
    Segments {
        /// Path to the project directory
        project_dir: PathBuf,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}
