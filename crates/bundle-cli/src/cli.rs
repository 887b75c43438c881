//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Resolve plugin bundles and inspect plugin layers
#[derive(Parser, Debug)]
#[command(name = "bundles")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve the plugins declared in a bundle manifest
    ///
    /// Examples:
    ///   bundles resolve bundles.toml             # Workspace plugins
    ///   bundles resolve bundles.toml --frontend  # Also resolve frontend-only plugins
    ///   bundles resolve bundles.toml --json      # Machine-readable output
    Resolve {
        /// Path to the bundle manifest (TOML)
        manifest: PathBuf,

        /// Resolve frontend-only plugins on top of the workspace result
        #[arg(long)]
        frontend: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Inspect plugin layers
    Layers {
        #[command(subcommand)]
        action: LayersAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LayersAction {
    /// Order layer selectors so that dependencies come first
    Sort {
        /// Layer selectors, e.g. frontendImpl commonApi
        #[arg(required = true)]
        selectors: Vec<String>,
    },

    /// Move code shared between frontend and workspace layers to common layers
    Dedupe {
        /// Path to plugin parts (JSON map of selector to layer)
        parts: PathBuf,
    },
}
