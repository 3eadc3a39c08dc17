//! Model Inspector CLI
//!
//! Loads model documents or a snapshot and prints names, diagnostics,
//! DOT, snapshots or search results.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use cwm_model::graph::{self, ModelSnapshot};
use cwm_model::{ElementKind, ModelConfig, ModelGraph};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cwm-inspect")]
#[command(about = "Inspect CWM model documents")]
struct Cli {
    /// Model document, directory of documents, or snapshot (with --snapshot)
    #[arg(short, long, default_value = ".")]
    input: PathBuf,

    /// Treat the input as a snapshot written by `snapshot`
    #[arg(long)]
    snapshot: bool,

    /// Config file (defaults to cwm.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the qualified name of every element
    Names {
        /// Only elements of this kind (e.g. table, column)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Validate the model and print diagnostics
    Check,

    /// Export the element graph as GraphViz DOT
    Dot {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a JSON snapshot of the model
    Snapshot {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fuzzy search element names
    Search {
        query: String,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load(cli: &Cli, config: &ModelConfig) -> anyhow::Result<ModelGraph> {
    let options = config.graph_options();

    if cli.snapshot {
        let snapshot = ModelSnapshot::load(&cli.input)
            .with_context(|| format!("Failed to read snapshot {}", cli.input.display()))?;
        return Ok(ModelGraph::from_snapshot(&snapshot, options)?);
    }

    let factory = config.factory();
    let loaded = if cli.input.is_dir() {
        graph::load_from_directory(&cli.input, &factory, options)?
    } else {
        graph::load_from_file(&cli.input, &factory, options)?
    };
    eprintln!(
        "Loaded {} document(s): {} elements, {} links (bundle {})",
        loaded.document_count,
        loaded.graph.element_count(),
        loaded.graph.link_count(),
        &loaded.bundle_hash[..12]
    );
    Ok(loaded.graph)
}

fn parse_kind(kind: &str) -> anyhow::Result<ElementKind> {
    serde_json::from_value(serde_json::Value::String(kind.to_string()))
        .with_context(|| format!("Unknown element kind '{}'", kind))
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ModelConfig::load_from(cli.config.as_deref())?;
    let model = load(&cli, &config)?;

    match &cli.command {
        Commands::Names { kind } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            for (id, data) in model.elements() {
                if kind.map(|k| k != data.kind).unwrap_or(false) {
                    continue;
                }
                println!("{:<18} {}", data.kind.as_str(), model.path_name(id)?);
            }
        }

        Commands::Check => {
            let diagnostics = graph::validate(&model);
            if diagnostics.is_empty() {
                println!("No problems found");
            } else {
                print!("{}", diagnostics);
            }
            if diagnostics.has_errors() {
                std::process::exit(1);
            }
        }

        Commands::Dot { output } => {
            write_output(output.as_deref(), &model.to_dot())?;
        }

        Commands::Snapshot { output } => {
            write_output(output.as_deref(), &model.snapshot().to_json()?)?;
        }

        Commands::Search { query, limit } => {
            let results = model.search(query, *limit);
            if results.is_empty() {
                println!("No matches for '{}'", query);
            }
            for hit in results {
                println!(
                    "{:>4}  {:<18} {}",
                    hit.score,
                    hit.kind.as_str(),
                    model.path_name(hit.id)?
                );
            }
        }
    }

    Ok(())
}
