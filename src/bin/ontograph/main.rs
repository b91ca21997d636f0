//! ontograph CLI tool
//!
//! Command-line interface for building and validating the knowledge-graph
//! artifact.
//!
//! ## Commands
//!
//! - `build [DIR]`: run the YAML → artifact pipeline and print stats
//! - `validate [ARTIFACT]`: check an artifact for structural integrity
//! - `sync SOURCE DEST`: copy YAML record files into the build input dir
//!
//! `build` always completes when the input files parse; unresolved
//! references surface as a warning list, not failures. `validate` exits
//! non-zero when any integrity *error* is found; orphan warnings never
//! fail the run.

use clap::{Parser, Subcommand};
use ontograph::{
    config::BuildConfig,
    error::OntographError,
    pipeline::{self, PipelineResult},
    validate::{validate_graph, ValidationReport},
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ontograph")]
#[command(author, version, about = "Build and validate the knowledge-graph artifact", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build graph.json from the YAML system of record
    Build {
        /// Directory containing the YAML record files (default: from config)
        yaml_dir: Option<PathBuf>,

        /// Artifact output path (default: from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file path (default: ./ontograph.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check a graph artifact for structural integrity
    Validate {
        /// Artifact path (default: from config)
        artifact: Option<PathBuf>,

        /// Configuration file path (default: ./ontograph.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Copy YAML record files from a source system-of-record directory
    Sync {
        /// Directory to copy .yaml files from
        source: PathBuf,

        /// Directory to copy .yaml files into
        dest: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            yaml_dir,
            output,
            config,
            verbose,
        } => {
            let config = load_config(config)?;
            let yaml_dir = yaml_dir.unwrap_or(config.yaml_dir);
            let output = output.unwrap_or(config.artifact);

            if verbose {
                println!("Input: {}", yaml_dir.display());
                println!("Output: {}", output.display());
            }

            println!("Building graph from {}...\n", yaml_dir.display());
            let result = pipeline::build_graph(&yaml_dir)?;
            pipeline::write_artifact(&output, &result.graph)?;
            println!("Wrote {}\n", output.display());

            print_build_stats(&result);
            println!("\nDone.");
            Ok(())
        }

        Commands::Validate { artifact, config } => {
            let config = load_config(config)?;
            let artifact = artifact.unwrap_or(config.artifact);

            println!("Validating {}...\n", artifact.display());
            let graph = pipeline::read_artifact(&artifact)?;
            let report = validate_graph(&graph);
            print_validation_report(&graph, &report);

            if !report.passed() {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Sync { source, dest } => {
            let copied = sync_yaml_files(&source, &dest)?;
            println!(
                "\nSynced {copied} YAML files from {}",
                source.display()
            );
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<BuildConfig, OntographError> {
    match path {
        Some(path) => BuildConfig::load(&path),
        None => BuildConfig::discover(&std::env::current_dir()?),
    }
}

fn print_build_stats(result: &PipelineResult) {
    let stats = &result.stats;

    println!("=== Node Counts by Type ===");
    for (entity_type, count) in &stats.node_counts_by_type {
        println!("  {entity_type}: {count}");
    }
    println!("  TOTAL canvas: {}", stats.canvas_node_count);
    println!("  TOTAL off-canvas: {}", stats.off_canvas_count);

    println!("\n=== Edge Counts ===");
    println!("  Total: {}", stats.edge_count);
    let mut by_count: Vec<(&String, &usize)> = stats.edge_counts_by_type.iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (edge_type, count) in by_count {
        println!("  {edge_type}: {count}");
    }

    println!("\n=== Combo Membership ===");
    println!("  Combos: {}", stats.combo_count);
    for (combo_id, count) in &stats.combo_membership {
        println!("  {combo_id}: {count} members");
    }

    if !result.warnings.is_empty() {
        println!("\n=== Warnings ({}) ===", result.warnings.len());
        for warning in &result.warnings {
            println!("  {warning}");
        }
    }
}

fn print_validation_report(graph: &ontograph::properties::GraphData, report: &ValidationReport) {
    println!("=== Edge Reference Check ===");
    if report.edge_ref_errors.is_empty() {
        println!("  OK: All edge references resolve.");
    } else {
        for error in &report.edge_ref_errors {
            println!("  ERROR: {error}");
        }
    }

    println!("\n=== Combo Reference Check ===");
    if report.combo_ref_errors.is_empty() {
        println!("  OK: All combo references resolve.");
    } else {
        for error in &report.combo_ref_errors {
            println!("  ERROR: {error}");
        }
    }

    println!("\n=== Duplicate Edge ID Check ===");
    if report.duplicate_edge_errors.is_empty() {
        println!("  OK: No duplicate edge IDs.");
    } else {
        for error in &report.duplicate_edge_errors {
            println!("  ERROR: {error}");
        }
    }

    println!("\n=== Orphan Node Check ===");
    if report.orphan_warnings.is_empty() {
        println!("  OK: No orphan nodes.");
    } else {
        println!(
            "  WARNING: {} orphan nodes (no edges):",
            report.orphan_warnings.len()
        );
        for warning in &report.orphan_warnings {
            println!("    {warning}");
        }
    }

    println!("\n=== Summary ===");
    println!("  Canvas nodes: {}", graph.canvas_nodes.len());
    println!("  Off-canvas entities: {}", graph.off_canvas_entities.len());
    println!("  Edges: {}", graph.edges.len());
    println!("  Combos: {}", graph.combos.len());
    println!("  Errors: {}", report.error_count());
    println!("  Warnings: {}", report.warning_count());

    if report.passed() {
        println!("\nVALIDATION PASSED.");
    } else {
        println!("\nVALIDATION FAILED.");
    }
}

fn sync_yaml_files(source: &Path, dest: &Path) -> Result<usize, OntographError> {
    std::fs::create_dir_all(dest)?;
    let mut copied = 0;
    let mut names = Vec::new();
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
            names.push(path);
        }
    }
    // Stable copy order regardless of directory enumeration order.
    names.sort();
    for path in names {
        if let Some(file_name) = path.file_name() {
            std::fs::copy(&path, dest.join(file_name))?;
            copied += 1;
            println!("  Copied {}", file_name.to_string_lossy());
        }
    }
    Ok(copied)
}
