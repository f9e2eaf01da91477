//! binlogctl
//!
//! Command-line tools for binlogs stored under a local directory.
//!
//! # Commands
//!
//! - `inspect` - Decode one binlog and summarize it
//! - `verify` - Decode every binlog and report corrupt ones
//! - `path` - Split a binlog key into its ids

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Binlog maintenance tools.
#[derive(Parser)]
#[command(name = "binlogctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory backing the object store
    #[arg(global = true, short, long)]
    dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one binlog and summarize it
    Inspect {
        /// Storage key of the binlog
        key: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Decode every binlog and report corrupt ones
    Verify {
        /// Only check keys starting with this prefix
        #[arg(short, long, default_value = "")]
        prefix: String,
    },

    /// Split a binlog key into its ids
    Path {
        /// Storage key to parse
        key: String,

        /// Root the key was built under (defaults to the store root)
        #[arg(short, long)]
        root: Option<String>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { key, format } => {
            let dir = cli.dir.ok_or("Store directory required for inspect")?;
            commands::inspect::run(&dir, &key, &format).await?;
        }
        Commands::Verify { prefix } => {
            let dir = cli.dir.ok_or("Store directory required for verify")?;
            commands::verify::run(&dir, &prefix).await?;
        }
        Commands::Path { key, root } => {
            let root = match (root, cli.dir) {
                (Some(root), _) => root,
                (None, Some(dir)) => commands::store_root(&dir).await?,
                (None, None) => return Err("Either --root or --dir is required for path".into()),
            };
            commands::path::run(&root, &key)?;
        }
        Commands::Version => {
            println!("binlogctl v{}", env!("CARGO_PKG_VERSION"));
            println!("binlog format v{}", binlog_codec::format::FORMAT_VERSION);
        }
    }

    Ok(())
}
