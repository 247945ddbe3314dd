//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use imgcluster_core::config;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "imgcluster")]
#[command(version)]
#[command(about = "Stage, normalize and cluster batches of images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    overrides: PolicyArgs,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Flags overriding `[intake]` and `[service]` from the config file.
#[derive(clap::Args, Debug, Clone, Default)]
struct PolicyArgs {
    /// Maximum number of images staged in one batch
    #[arg(long, value_name = "N", global = true)]
    max_files: Option<usize>,

    /// Longest allowed edge in pixels
    #[arg(long, value_name = "PX", global = true)]
    max_dimension: Option<u32>,

    /// Byte size above which images are re-encoded
    #[arg(long, value_name = "BYTES", global = true)]
    max_size: Option<u64>,

    /// Re-encode quality between 0.0 and 1.0
    #[arg(long, value_name = "Q", global = true)]
    quality: Option<f64>,

    /// Clustering endpoint URL
    #[arg(long, value_name = "URL", env = "IMGCLUSTER_ENDPOINT", global = true)]
    endpoint: Option<String>,
}

impl PolicyArgs {
    fn apply(&self, config: &mut config::Config) -> Result<()> {
        if let Some(max_files) = self.max_files {
            config.intake.max_files = max_files;
        }
        if let Some(max_dimension) = self.max_dimension {
            config.intake.max_dimension = max_dimension;
        }
        if let Some(max_size) = self.max_size {
            config.intake.max_size = max_size;
        }
        if let Some(quality) = self.quality {
            config.intake.resize_quality = quality;
        }
        if let Some(endpoint) = self.endpoint.as_deref().map(str::trim)
            && !endpoint.is_empty()
        {
            config.service.endpoint = endpoint.to_string();
        }
        config.intake.validate().context("invalid command-line override")
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run one intake pass and show the staged batch
    Intake {
        /// Image files or directories, in selection order
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Stage images and submit them to the clustering service
    Cluster {
        /// Image files or directories, in selection order
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,

        /// Print JSON (including previews) instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Normalize one image and print its data URI
    Preview {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Print the effective configuration
    Show,
    /// Set one value, e.g. `intake.max_files 12`
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
}

pub fn run() -> Result<()> {
    let Cli {
        command,
        overrides,
        verbose,
    } = Cli::parse();

    match command {
        Commands::Intake { paths, json } => with_runtime(&overrides, verbose, |config| async move {
            commands::intake::run(&paths, json, &config).await
        }),
        Commands::Cluster { paths, json } => with_runtime(&overrides, verbose, |config| async move {
            commands::cluster::run(&paths, json, &config).await
        }),
        Commands::Preview { path } => with_runtime(&overrides, verbose, |config| async move {
            commands::preview::run(&path, &config).await
        }),

        // Only `show` reads the config file.
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Set { key, value } => commands::config::set(&key, &value),
            ConfigCommands::Show => commands::config::show(&load_config(&overrides)?),
        },
    }
}

fn load_config(overrides: &PolicyArgs) -> Result<config::Config> {
    let mut config = config::Config::load().context("load config")?;
    overrides.apply(&mut config)?;
    Ok(config)
}

/// Loads config, installs logging and drives `f` on one tokio runtime.
fn with_runtime<F, Fut>(overrides: &PolicyArgs, verbose: u8, f: F) -> Result<()>
where
    F: FnOnce(config::Config) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let config = load_config(overrides)?;
    let _log_guard = logging::init(verbose, config.logging.file.as_deref())?;

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(f(config))
}
