//! Lineage CLI
//!
//! Operator commands over a workspace of inheriting entity definitions.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(root = %cli.root.display(), "Verbose mode enabled");
    execute_command(&cli.root, cli.command)
}

/// Log to stderr. `RUST_LOG` applies unless `--verbose` forces debug.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}

fn execute_command(root: &std::path::Path, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Resolve {
            entity,
            field,
            mode,
            pins,
            json,
        } => commands::run_resolve(root, &entity, &field, mode, &pins, json),
        Commands::Relations { entity, json } => commands::run_relations(root, &entity, json),
        Commands::Check { entity } => commands::run_check(root, &entity),
        Commands::Versions { entity } => commands::run_versions(root, &entity),
        Commands::Commit {
            entity,
            message,
            author,
        } => commands::run_commit(root, &entity, &message, author.as_deref()),
        Commands::Stable { entity, id, unset } => commands::run_stable(root, &entity, id, !unset),
        Commands::Rename { old, new } => commands::run_rename(root, &old, &new),
        Commands::Variants { entity } => commands::run_variants(root, &entity),
    }
}
