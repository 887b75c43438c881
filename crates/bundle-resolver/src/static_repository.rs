//! In-memory repository over a fixed plugin set.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bundle_model::{PluginDescriptor, PluginName, PluginVersion};
use sha2::{Digest, Sha256};

use crate::Result;
use crate::repository::PluginRepository;
use crate::resolution::ResolvedPluginsConfig;

const CACHE_KEY_PREFIX: &str = "static-sha256:";

/// Repository backed by descriptors held in memory.
///
/// The cache key is derived from the sorted contents, so two repositories
/// built from the same plugins in any order share a key.
#[derive(Debug, Clone)]
pub struct StaticRepository {
    plugins: BTreeMap<(PluginName, PluginVersion), PluginDescriptor>,
    ship_versions: BTreeSet<PluginVersion>,
    cache_key: String,
}

impl StaticRepository {
    pub fn new(plugins: impl IntoIterator<Item = PluginDescriptor>) -> Self {
        Self::build(plugins, BTreeSet::new())
    }

    /// Build a repository from already resolved configurations.
    pub fn from_configs(configs: impl IntoIterator<Item = ResolvedPluginsConfig>) -> Self {
        let mut plugins = Vec::new();
        let mut ship_versions = BTreeSet::new();
        for config in configs {
            ship_versions.insert(config.ship_version);
            plugins.extend(config.bundles_to_load);
        }
        Self::build(plugins, ship_versions)
    }

    fn build(
        plugins: impl IntoIterator<Item = PluginDescriptor>,
        ship_versions: BTreeSet<PluginVersion>,
    ) -> Self {
        let plugins: BTreeMap<_, _> = plugins
            .into_iter()
            .map(|d| ((d.name.clone(), d.version.clone()), d))
            .collect();
        let cache_key = compute_cache_key(plugins.values(), &ship_versions);
        Self {
            plugins,
            ship_versions,
            cache_key,
        }
    }

    pub fn ship_versions(&self) -> &BTreeSet<PluginVersion> {
        &self.ship_versions
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

fn compute_cache_key<'a>(
    plugins: impl Iterator<Item = &'a PluginDescriptor>,
    ship_versions: &BTreeSet<PluginVersion>,
) -> String {
    let mut sorted: Vec<&PluginDescriptor> = plugins.collect();
    sorted.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.version.cmp(&b.version))
            .then_with(|| a.deps.keys().cmp(b.deps.keys()))
    });

    let ships: Vec<String> = ship_versions
        .iter()
        .map(PluginVersion::to_marketplace_string)
        .collect();
    // Whole descriptors, so ship ranges and meta flags move the key too.
    let entries: Vec<String> = sorted
        .iter()
        .map(|d| {
            d.canonical_json().unwrap_or_else(|e| {
                tracing::warn!(plugin = %d, error = %e, "Descriptor has no canonical form");
                d.to_string()
            })
        })
        .collect();

    let canonical = format!("ship={};plugins={}", ships.join(","), entries.join(";"));
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{}{:x}", CACHE_KEY_PREFIX, hasher.finalize())
}

#[async_trait]
impl PluginRepository for StaticRepository {
    async fn latest_versions(
        &self,
        names: &BTreeSet<PluginName>,
        ship_version: &PluginVersion,
    ) -> Result<BTreeMap<PluginName, PluginVersion>> {
        let mut latest: BTreeMap<PluginName, PluginVersion> = BTreeMap::new();
        for descriptor in self.plugins.values() {
            if !names.contains(&descriptor.name) || !descriptor.is_compatible_with(ship_version) {
                continue;
            }
            match latest.get(&descriptor.name) {
                Some(current) if *current >= descriptor.version => {}
                _ => {
                    latest.insert(descriptor.name.clone(), descriptor.version.clone());
                }
            }
        }
        Ok(latest)
    }

    async fn get_plugin(
        &self,
        name: &PluginName,
        version: &PluginVersion,
    ) -> Result<Option<PluginDescriptor>> {
        Ok(self.plugins.get(&(name.clone(), version.clone())).cloned())
    }

    fn cache_key(&self) -> String {
        self.cache_key.clone()
    }

    fn presentable_name(&self) -> String {
        format!("in-memory ({} plugins)", self.plugins.len())
    }
}
