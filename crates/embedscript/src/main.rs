//! embedscript CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "embedscript")]
#[command(version)]
#[command(about = "Language intelligence for scripts embedded in markup", long_about = None)]
struct Cli {
    /// Workspace root used for project configuration and module resolution
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the language server over stdio
    Lsp,

    /// Report diagnostics for script fragments in files
    Check {
        /// Files to check (.svelte, .html, .js, .ts, ...)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Format the script fragment of each file
    Format {
        /// Files to format
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Rewrite files in place instead of printing them
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the LSP transport and command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "embedscript=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let workspace = match cli.workspace {
        Some(workspace) => workspace,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Lsp => commands::lsp::execute(),
        Commands::Check { files, json } => commands::check::execute(&workspace, &files, json),
        Commands::Format { files, write } => commands::format::execute(&files, write),
    }
}
