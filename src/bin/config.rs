//! Config CLI
//!
//! Shows the effective configuration or writes a default config file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cwm_model::ModelConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cwm-config")]
#[command(about = "Show or initialise cwm-model configuration")]
struct Cli {
    /// Config file (defaults to cwm.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration as TOML
    Show,

    /// Write a default configuration file
    Init {
        /// Target path (defaults to ./cwm.toml)
        #[arg(short, long, default_value = "cwm.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
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

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Show => {
            let config = ModelConfig::load_from(cli.config.as_deref())?;
            print!("{}", toml::to_string_pretty(&config)?);
            if let Some(path) = ModelConfig::user_config_path() {
                eprintln!("User config: {}", path.display());
            }
        }

        Commands::Init { output, force } => {
            if output.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
            }
            let path = output.to_string_lossy();
            ModelConfig::default().save(&path)?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}
