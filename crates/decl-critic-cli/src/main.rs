//! decl-critic CLI tool.
//!
//! Usage:
//! ```bash
//! decl-critic check path/to/index.d.ts [--source path/to/index.js] [--debug]
//! decl-critic list-kinds
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Critique declaration files against the modules they describe
#[derive(Parser)]
#[command(name = "decl-critic")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Critique one declaration file
    Check {
        /// Path of the declaration file to critique
        declaration: PathBuf,

        /// Path of the source module to check against. Without it, the
        /// published package is downloaded from the registry.
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Skip all registry interaction (requires --source)
        #[arg(long)]
        offline: bool,

        /// Finding kinds to enable on top of the defaults (repeatable)
        #[arg(long)]
        enable: Vec<String>,

        /// Finding kinds to disable (repeatable)
        #[arg(long)]
        disable: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Print inference diagnostics
        #[arg(long)]
        debug: bool,
    },

    /// List finding kinds and their default enablement
    ListKinds,
}

/// Output format for findings.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-finding compact format.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            declaration,
            source,
            offline,
            enable,
            disable,
            format,
            debug,
        } => commands::check::run(commands::check::CheckArgs {
            declaration,
            source,
            offline,
            enable,
            disable,
            format,
            debug,
            config: cli.config,
        }),
        Commands::ListKinds => {
            commands::list_kinds::run();
            Ok(())
        }
    }
}
