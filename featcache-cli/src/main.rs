//! featcache command-line tool
//!
//! Lists, saves, loads and removes named artifacts in a featcache storage
//! root using the same backends as the library.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use featcache::{Artifact, ArtifactStore, CacheMode, FeatCacheConfig, build_backend};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

mod import;
mod logging;
mod render;

#[derive(Parser)]
#[command(name = "featcache")]
#[command(about = "Inspect and edit a featcache storage root", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Storage root (overrides the configuration file)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Cache mode, named as in the `storage.mode` config key
    #[arg(short, long, global = true, value_parser = parse_mode)]
    mode: Option<CacheMode>,

    /// Memory budget in bytes for frames held in memory
    #[arg(long, global = true)]
    memory_limit: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved artifacts
    Ls {
        /// Show kind, size and modification time
        #[arg(short, long)]
        long: bool,
    },

    /// Save a JSON file as an object artifact
    Save {
        name: String,
        /// JSON file to read
        file: PathBuf,
    },

    /// Save a CSV file as a frame artifact
    SaveCsv {
        name: String,
        /// CSV file with a header row
        file: PathBuf,
    },

    /// Print a saved artifact
    Load {
        name: String,
        /// Rows to print for frames
        #[arg(long, default_value_t = render::MAX_ROWS)]
        rows: usize,
    },

    /// Remove a saved artifact
    Rm { name: String },

    /// Show backend statistics as JSON
    Stats,
}

/// Parse a mode with the same names the configuration file accepts
fn parse_mode(s: &str) -> std::result::Result<CacheMode, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|e| e.to_string())
}

fn load_config(cli: &Cli) -> Result<FeatCacheConfig> {
    let mut config = match &cli.config {
        Some(path) => FeatCacheConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => FeatCacheConfig::default(),
    };

    if let Some(root) = &cli.root {
        config.storage.root = root.clone();
    }
    if let Some(mode) = cli.mode {
        config.storage.mode = mode;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    logging::init(&config.logging, cli.verbose);
    debug!("Using configuration {:?}", config);

    let backend =
        build_backend(&config.to_cache_config()).context("Failed to initialize cache backend")?;
    if let Some(limit) = cli.memory_limit {
        backend.set_memory_limit(limit);
    }
    let store = ArtifactStore::new(backend);

    match cli.command {
        Commands::Ls { long } => {
            if long {
                let rows = store.ls_detailed().context("Failed to list artifacts")?;
                print!("{}", render::listing(&rows));
            } else {
                for name in store.ls().context("Failed to list artifacts")? {
                    println!("{}", name);
                }
            }
        }

        Commands::Save { name, file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            store
                .save(&name, value)
                .with_context(|| format!("Failed to save {}", name))?;
            info!("Saved object {} from {}", name, file.display());
        }

        Commands::SaveCsv { name, file } => {
            let df = import::read_csv(&file)?;
            info!(
                "Read {} rows x {} columns from {}",
                df.num_rows(),
                df.num_columns(),
                file.display()
            );
            store
                .save_frame(&name, df)
                .with_context(|| format!("Failed to save {}", name))?;
        }

        Commands::Load { name, rows } => {
            match store
                .load(&name)
                .with_context(|| format!("Failed to load {}", name))?
            {
                Artifact::Object(obj) => println!("{}", serde_json::to_string_pretty(&*obj)?),
                Artifact::Frame(df) => print!("{}", render::frame(&df, rows)),
            }
        }

        Commands::Rm { name } => {
            store
                .rm(&name)
                .with_context(|| format!("Failed to remove {}", name))?;
        }

        Commands::Stats => {
            let stats = store.backend().stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
