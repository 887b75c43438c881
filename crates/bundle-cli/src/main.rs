//! Bundle resolver CLI
//!
//! Resolves plugin bundle manifests and inspects plugin layers.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, LayersAction};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{} failed to initialize logging: {}", "warning:".yellow().bold(), e);
    }
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    execute_command(cli.command)
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Resolve {
            manifest,
            frontend,
            json,
        } => commands::run_resolve(&manifest, frontend, json),
        Commands::Layers { action } => match action {
            LayersAction::Sort { selectors } => commands::run_layers_sort(&selectors),
            LayersAction::Dedupe { parts } => commands::run_layers_dedupe(&parts),
        },
    }
}
