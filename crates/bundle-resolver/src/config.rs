//! Declarative bundle manifest and resolver settings.
//!
//! A manifest describes one resolution: the ship version, the desired-plugin
//! commands, and the plugins available to resolve against.
//!
//! ```toml
//! ship_version = "2.4"
//!
//! [settings]
//! drop_frontend_only = true
//!
//! [[commands]]
//! add = "fleet.kotlin"
//!
//! [[commands]]
//! remove = "fleet.legacy"
//!
//! [[plugins]]
//! name = "fleet.kotlin"
//! version = "2.4.1"
//! deps = { "fleet.jvm" = "^2.0" }
//! ```

use std::path::Path;

use bundle_model::{PluginDescriptor, PluginVersion};
use serde::{Deserialize, Serialize};

use crate::command::PluginCommand;
use crate::static_repository::StaticRepository;
use crate::{Error, Result};

/// Knobs of the dependency resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Skip frontend-only descriptors during workspace resolution.
    pub drop_frontend_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub ship_version: PluginVersion,

    #[serde(default)]
    pub settings: ResolverSettings,

    #[serde(default)]
    pub commands: Vec<PluginCommand>,

    /// Plugins available for resolution.
    #[serde(default)]
    pub plugins: Vec<PluginDescriptor>,
}

impl BundleManifest {
    /// Parse a manifest from TOML content.
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: BundleManifest = toml::from_str(content)?;
        Ok(manifest)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ManifestNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// In-memory repository over the declared plugins.
    pub fn repository(&self) -> StaticRepository {
        StaticRepository::new(self.plugins.iter().cloned())
    }
}
