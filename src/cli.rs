use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "reelsync")]
#[command(version)]
#[command(about = "Keeps a TV series library in sync with its catalog store", long_about = None)]
pub struct Args {
    /// Path to a config.yaml (defaults to ./config.yaml, then ~/.config/reelsync/config.yaml)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// Log level to run with; `--verbose` overrides the configured one
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        if self.verbose {
            "debug"
        } else {
            configured
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the REST API server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Scan the library, reconcile it with the store and print the catalog
    Sync,

    /// List files that still need converting to the target format
    Candidates {
        /// Only show files belonging to this series
        #[arg(short, long, value_name = "NAME")]
        series: Option<String>,
    },
}
