use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use mil2dss_core::{topology, Diagnostics};
use mil2dss_io::{export, import_project, import_project_with, BuildOptions, ImportResult};
use mil2dss_viz::{branch_segments, class_markers, load_drops};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

mod cli;

use cli::{Cli, Commands, GraphCommands, VizCommands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Import {
            project_dir,
            emit,
            fake_nodes,
        } => run_import(&project_dir, emit.as_deref(), fake_nodes),
        Commands::Graph { command } => run_graph(command),
        Commands::Viz { command } => run_viz(command),
    }
}

fn load(project_dir: &Path) -> Result<ImportResult> {
    let result = import_project(project_dir)?;
    info!("{}", result.diagnostics.summary());
    Ok(result)
}

fn run_import(project_dir: &Path, emit: Option<&Path>, fake_nodes: bool) -> Result<()> {
    let options = BuildOptions { fake_nodes };
    let result = import_project_with(project_dir, &options)?;

    println!("Import: {}", result.diagnostics.summary());
    for issue in &result.diagnostics.issues {
        println!("  {}", issue);
    }

    let mut validation = Diagnostics::new();
    result.feeder.validate_into(&mut validation);
    if validation.has_issues() {
        print!("{}", validation);
    }

    println!("{}", result.feeder.stats());
    if let Some(kv) = result.feeder.kv_base {
        println!("Base voltage: {} kV", kv);
    }

    if let Some(path) = emit {
        fs::write(path, export::to_json_string(&result.feeder)?)?;
        println!("Wrote graph snapshot to {}", path.display());
    }
    Ok(())
}

fn run_graph(command: GraphCommands) -> Result<()> {
    match command {
        GraphCommands::Stats { project_dir } => {
            let result = load(&project_dir)?;
            let stats = topology::graph_stats(&result.feeder)?;
            println!("Nodes:    {}", stats.node_count);
            println!("Edges:    {}", stats.edge_count);
            println!("Islands:  {}", stats.islands);
            println!("Cycles:   {}", stats.cycle_count);
            println!(
                "Degree:   min {} / avg {:.2} / max {}",
                stats.min_degree, stats.avg_degree, stats.max_degree
            );
            println!("Density:  {:.6}", stats.density);
        }
        GraphCommands::Islands { project_dir, emit } => {
            let result = load(&project_dir)?;
            let analysis = topology::find_islands(&result.feeder)?;
            println!("{} island(s)", analysis.islands.len());
            for island in &analysis.islands {
                println!("  island {}: {} nodes", island.island_id, island.node_count);
            }
            if emit {
                for assignment in &analysis.assignments {
                    println!("{}\t{}", assignment.id, assignment.island_id);
                }
            }
        }
        GraphCommands::Cycles { project_dir } => {
            let result = load(&project_dir)?;
            let cycles = topology::cycle_basis(&result.feeder);
            if cycles.is_empty() {
                println!("Feeder is radial: no cycles");
            } else {
                println!("{} cycle(s)", cycles.len());
                for (index, cycle) in cycles.iter().enumerate() {
                    println!("  cycle {}: {}", index, cycle.join(" - "));
                }
            }
        }
        GraphCommands::Dot { project_dir, out } => {
            let result = load(&project_dir)?;
            let dot = topology::export_graph(&result.feeder, "dot")?;
            write_or_print(out, &dot)?;
        }
    }
    Ok(())
}

fn run_viz(command: VizCommands) -> Result<()> {
    match command {
        VizCommands::Segments { project_dir, out } => {
            let result = load(&project_dir)?;
            let view = serde_json::json!({
                "segments": branch_segments(&result.feeder),
                "markers": class_markers(&result.feeder),
                "loads": load_drops(&result.feeder),
            });
            write_or_print(out, &serde_json::to_string_pretty(&view)?)?;
        }
    }
    Ok(())
}

fn write_or_print(out: Option<PathBuf>, content: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(&path, content)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}
