//! Billed main entry point

use anyhow::Context;
use billed_api::start_server;
use billed_config::{Config, ConfigError};
use billed_core::MemoryStore;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "billed")]
#[command(version = "0.1.0")]
#[command(about = "Employee expense-report screens", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let (config, missing) = match Config::load(&args.config) {
        Ok(config) => (config, false),
        Err(ConfigError::FileNotFound { .. }) => (Config::default(), true),
        Err(e) => {
            for suggestion in e.suggestions() {
                eprintln!("  - {}", suggestion);
            }
            return Err(e).with_context(|| format!("Failed to load {}", args.config.display()));
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if missing {
        log::warn!("Config file {} not found, using defaults", args.config.display());
    } else {
        log::info!("Config loaded from {}", args.config.display());
    }

    let rt = Runtime::new()?;
    rt.block_on(async {
        let store = Arc::new(MemoryStore::new(config.store.file_base_url.clone()));

        if let Some(fixtures) = &config.store.fixtures {
            match store.load_fixtures(fixtures).await {
                Ok(count) => log::info!("Seeded store with {} bills", count),
                Err(e) => log::error!("Failed to load fixtures {}: {}", fixtures.display(), e),
            }
        }

        start_server(config, store).await.context("Server failed")
    })
}
