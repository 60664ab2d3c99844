//! Command-line front end for the Deno binary bridge
//!
//! Resolves, inspects and runs the `deno` binary the bridge would use, and
//! manages its cache directory.

use anyhow::Result;
use clap::{Parser, Subcommand};
use deno_bridge_core::installation::{get_binary_version, BinaryLocator, VersionCache};
use deno_bridge_core::{executors::ExecutionRunner, BridgeConfig, InstallScriptDownloader};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Locate, cache and run the Deno binary")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, help = "Cache directory (default: ~/.deno-bridge/deno-cli)")]
    cache_dir: Option<PathBuf>,

    #[clap(long, help = "Never use a deno found on PATH")]
    no_global: bool,

    #[clap(long, help = "Semantic version range the binary must satisfy")]
    version_range: Option<String>,

    #[clap(long, help = "Shell command run instead of the official install script")]
    installer: Option<String>,

    #[clap(long, help = "URL of the install script fetched on a cache miss")]
    installer_url: Option<String>,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the path of the binary that would be used
    Path,
    /// Print the version reported by the resolved binary
    Version,
    /// Run the resolved binary with the given arguments
    Run {
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Manage the binary cache
    Cache {
        #[clap(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Show cache location, marker and size
    Info,
    /// Remove the cache directory
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let config = load_config(&cli)?;
    log::debug!("Using configuration: {:?}", config);

    let mut downloader = InstallScriptDownloader::new();
    if let Some(url) = &cli.installer_url {
        downloader = downloader.with_script_url(url.clone());
    }
    if let Some(command) = &cli.installer {
        downloader = downloader.with_command(command.clone());
    }
    let locator = Arc::new(BinaryLocator::new(&config, Arc::new(downloader)));

    match cli.command {
        Commands::Path => {
            let path = locator.get_binary_path().await?;
            println!("{}", path.display());
        }
        Commands::Version => {
            let path = locator.get_binary_path().await?;
            match get_binary_version(&path).await {
                Some(version) => println!("{}", version),
                None => anyhow::bail!("{} did not report a version", path.display()),
            }
        }
        Commands::Run { args } => {
            ExecutionRunner::new(locator).run(&args).await?;
        }
        Commands::Cache { action } => {
            handle_cache_command(locator.cache(), action).await?;
        }
    }

    Ok(())
}

/// Builder defaults, then `DENO_BRIDGE_*` variables, then flags
fn load_config(cli: &Cli) -> Result<BridgeConfig> {
    let mut builder = BridgeConfig::builder().with_env_overrides()?;

    if let Some(cache_dir) = &cli.cache_dir {
        builder = builder.cache_dir(cache_dir.clone());
    }
    if cli.no_global {
        builder = builder.use_global(false);
    }
    if let Some(range) = &cli.version_range {
        builder = builder.version_range(range.clone());
    }

    Ok(builder.build()?)
}

async fn handle_cache_command(cache: &VersionCache, action: CacheCommands) -> Result<()> {
    match action {
        CacheCommands::Info => {
            println!("Cache directory: {}", cache.cache_dir().display());
            match cache.read().await {
                Some(version) => println!("Cached version: {}", version),
                None => println!("Cached version: none"),
            }
            let stats = cache.stats().await?;
            println!("Files: {} ({})", stats.file_count, stats.total_size_human());
        }
        CacheCommands::Clear => {
            cache.clear().await?;
            println!("Cache cleared: {}", cache.cache_dir().display());
        }
    }

    Ok(())
}
