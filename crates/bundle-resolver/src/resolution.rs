//! Resolution output: the resolved plugin set and its diagnostics.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use bundle_model::{PluginDescriptor, PluginName, PluginVersion, VersionRequirement};
use serde::{Deserialize, Serialize};

/// The plugins to load for a ship version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPluginsConfig {
    pub bundles_to_load: BTreeSet<PluginDescriptor>,
    pub ship_version: PluginVersion,
}

impl ResolvedPluginsConfig {
    pub fn empty(ship_version: PluginVersion) -> Self {
        Self {
            bundles_to_load: BTreeSet::new(),
            ship_version,
        }
    }

    /// Descriptor loaded under `name`.
    ///
    /// Scans the set; build [`Self::by_name`] once for repeated lookups.
    pub fn get(&self, name: &PluginName) -> Option<&PluginDescriptor> {
        self.bundles_to_load.iter().find(|d| &d.name == name)
    }

    pub fn contains(&self, name: &PluginName) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &PluginName> {
        self.bundles_to_load.iter().map(|d| &d.name)
    }

    /// Loaded descriptors keyed by name.
    pub fn by_name(&self) -> BTreeMap<&PluginName, &PluginDescriptor> {
        self.bundles_to_load.iter().map(|d| (&d.name, d)).collect()
    }
}

/// A resolution diagnostic. Problems never abort resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    PluginNotFound {
        name: PluginName,
    },
    /// `plugin` requires a version of `dependency` other than the one
    /// already taken.
    Conflict {
        plugin: PluginName,
        dependency: PluginName,
        taken: PluginVersion,
        required: VersionRequirement,
    },
    FetchIssue {
        plugin: PluginName,
        cause: String,
    },
}

impl Problem {
    /// The plugin the problem is reported against.
    pub fn plugin(&self) -> &PluginName {
        match self {
            Self::PluginNotFound { name } => name,
            Self::Conflict { plugin, .. } | Self::FetchIssue { plugin, .. } => plugin,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PluginNotFound { name } => write!(f, "plugin '{name}' not found"),
            Self::Conflict {
                plugin,
                dependency,
                taken,
                required,
            } => write!(
                f,
                "'{plugin}' requires {dependency} {required}, but {dependency} {taken} was already taken"
            ),
            Self::FetchIssue { plugin, cause } => {
                write!(f, "failed to fetch '{plugin}': {cause}")
            }
        }
    }
}

/// Result of one resolver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub config: ResolvedPluginsConfig,
    pub problems: Vec<Problem>,
}

impl Resolution {
    /// True when resolution produced no diagnostics.
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}
