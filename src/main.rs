use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

use reelsync::api;
use reelsync::catalog::CatalogService;
use reelsync::cli::{Args, Command};
use reelsync::config::Config;
use reelsync::diagnostics::Diagnostics;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging comes up before the config so its own messages are kept
    let (filter, filter_handle) = reload::Layer::new(env_filter(args.log_level("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    filter_handle.reload(env_filter(args.log_level(&config.log_level)))?;

    match &args.command {
        Some(Command::Serve { port, host }) => {
            eprintln!("\x1b[35m🌐 Reelsync REST API Server\x1b[0m");
            eprintln!("\x1b[36m━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\x1b[0m\n");

            let catalog = open_catalog(&config)?;
            let host = host.clone().unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            api::start_server(catalog, host, port).await?;
        }
        Some(Command::Sync) => {
            eprintln!(
                "\x1b[36m📂 Scanning\x1b[0m {}",
                config.library.series_dir.display()
            );

            let catalog = open_catalog(&config)?;
            let series = catalog.get_series(true).await?;

            eprintln!("\x1b[32m✓\x1b[0m {} series in catalog\n", series.len());
            println!("{}", serde_json::to_string_pretty(series.as_ref())?);
        }
        Some(Command::Candidates { series }) => {
            let catalog = open_catalog(&config)?;
            let candidates: Vec<_> = catalog
                .get_conversion_candidates()
                .await?
                .into_iter()
                .filter(|c| series.as_ref().map_or(true, |name| &c.series_name == name))
                .collect();

            eprintln!(
                "\x1b[33m🎞  {} file(s) not in {}\x1b[0m\n",
                candidates.len(),
                config.library.target_format
            );
            println!("{}", serde_json::to_string_pretty(&candidates)?);
        }
        None => {
            eprintln!("\x1b[33m⚠️  No command specified.\x1b[0m\n");
            eprintln!("\x1b[36mℹ️  Reelsync keeps a series library in sync with its catalog store.\x1b[0m");
            eprintln!("\x1b[36m   Run '\x1b[1;32mreelsync --help\x1b[0;36m' to see all available commands.\x1b[0m\n");
            eprintln!("\x1b[1mQuick Start:\x1b[0m");
            eprintln!("  \x1b[32mreelsync sync\x1b[0m         Reconcile the library and print the catalog");
            eprintln!("  \x1b[32mreelsync candidates\x1b[0m   List files awaiting conversion");
            eprintln!("  \x1b[32mreelsync serve\x1b[0m        Start REST API server\n");

            std::process::exit(1);
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn open_catalog(config: &Config) -> Result<Arc<CatalogService>> {
    let catalog = CatalogService::from_config(config, Diagnostics::default())
        .with_context(|| format!("Failed to open catalog store at {}", config.database.path.display()))?;
    Ok(Arc::new(catalog))
}
