//! The `resolve` command

use std::path::Path;
use std::sync::Arc;

use bundle_resolver::{BundleManifest, DependencyResolver, PluginRepository, Resolution};
use colored::Colorize;
use serde_json::json;

use crate::error::Result;

/// Run the resolve command
pub fn run_resolve(manifest_path: &Path, frontend: bool, json: bool) -> Result<()> {
    let manifest = BundleManifest::from_path(manifest_path)?;
    let repository: Arc<dyn PluginRepository> = Arc::new(manifest.repository());
    tracing::debug!(
        manifest = %manifest_path.display(),
        repository = %repository.presentable_name(),
        cache_key = %repository.cache_key(),
        "Loaded bundle manifest"
    );
    let resolver = DependencyResolver::with_settings(repository, manifest.settings.clone());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let (workspace, frontend_resolution) = runtime.block_on(async {
        let workspace = resolver
            .resolve_workspace(&manifest.commands, &manifest.ship_version)
            .await;
        let frontend_resolution = if frontend {
            Some(
                resolver
                    .resolve_frontend(&manifest.commands, &manifest.ship_version, &workspace.config)
                    .await,
            )
        } else {
            None
        };
        (workspace, frontend_resolution)
    });

    if json {
        let output = json!({
            "workspace": workspace,
            "frontend": frontend_resolution,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_resolution("Workspace", &workspace);
    if let Some(frontend_resolution) = &frontend_resolution {
        println!();
        print_resolution("Frontend", frontend_resolution);
    }
    Ok(())
}

fn print_resolution(label: &str, resolution: &Resolution) {
    println!(
        "{} (ship {})",
        format!("{label} plugins").bold(),
        resolution.config.ship_version
    );

    if resolution.config.bundles_to_load.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for descriptor in &resolution.config.bundles_to_load {
        let marker = if descriptor.is_frontend_only() {
            " frontend-only".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<28} {}{}",
            descriptor.name.as_str().green(),
            descriptor.version,
            marker
        );
    }

    for problem in &resolution.problems {
        eprintln!("{} {}", "warning:".yellow().bold(), problem);
    }
}
