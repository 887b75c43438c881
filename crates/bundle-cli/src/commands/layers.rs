//! The `layers` commands

use std::path::Path;

use bundle_model::{LayerSelector, PluginParts, sort_by_internal_dependencies};
use colored::Colorize;

use crate::error::{CliError, Result};

/// Run the layers sort command
///
/// Unknown selectors are reported and skipped.
pub fn run_layers_sort(selectors: &[String]) -> Result<()> {
    let mut parsed = Vec::with_capacity(selectors.len());
    for raw in selectors {
        match raw.parse::<LayerSelector>() {
            Ok(selector) => parsed.push(selector),
            Err(e) => {
                tracing::warn!(selector = %raw, "Skipping unknown layer selector");
                eprintln!("{} {}", "warning:".yellow().bold(), e);
            }
        }
    }
    if parsed.is_empty() {
        return Err(CliError::user(format!(
            "no known layer selectors given (known: {})",
            LayerSelector::ALL.map(LayerSelector::as_str).join(", ")
        )));
    }

    for selector in sort_by_internal_dependencies(&parsed)? {
        println!("{selector}");
    }
    Ok(())
}

/// Run the layers dedupe command
pub fn run_layers_dedupe(parts_path: &Path) -> Result<()> {
    if !parts_path.exists() {
        return Err(CliError::user(format!(
            "parts file not found: {}",
            parts_path.display()
        )));
    }
    let content = std::fs::read_to_string(parts_path)?;
    let parts: PluginParts = serde_json::from_str(&content)?;
    let before = parts.len();

    let deduplicated = parts.eliminate_intersections();
    tracing::debug!(before, after = deduplicated.len(), "Deduplicated plugin parts");

    println!("{}", serde_json::to_string_pretty(&deduplicated)?);
    Ok(())
}
