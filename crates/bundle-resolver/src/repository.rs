//! Plugin repositories: where descriptors come from.
//!
//! [`PluginRepository`] is the seam between resolution and the outside
//! world (network, local cache, in-memory sets). Repositories compose: the
//! later operand of [`compose`] shadows the earlier one.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use bundle_model::{PluginDescriptor, PluginName, PluginVersion};

use crate::Result;

/// Cache key reported by [`EmptyRepository`].
pub const EMPTY_CACHE_KEY: &str = "empty";

/// Source of plugin descriptors.
///
/// Implementations must be safe to query concurrently; the resolver issues
/// one `get_plugin` call per plugin of a round at the same time.
#[async_trait]
pub trait PluginRepository: Send + Sync {
    /// Latest version of each name compatible with `ship_version`.
    ///
    /// Names without a compatible candidate are omitted from the result.
    async fn latest_versions(
        &self,
        names: &BTreeSet<PluginName>,
        ship_version: &PluginVersion,
    ) -> Result<BTreeMap<PluginName, PluginVersion>>;

    /// Fetch the descriptor for an exact version.
    async fn get_plugin(
        &self,
        name: &PluginName,
        version: &PluginVersion,
    ) -> Result<Option<PluginDescriptor>>;

    /// Identity of the repository contents.
    ///
    /// Equal keys mean equal contents; a changed key means earlier
    /// resolutions against this repository are stale.
    fn cache_key(&self) -> String;

    fn presentable_name(&self) -> String;
}

/// A repository with no plugins.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRepository;

#[async_trait]
impl PluginRepository for EmptyRepository {
    async fn latest_versions(
        &self,
        _names: &BTreeSet<PluginName>,
        _ship_version: &PluginVersion,
    ) -> Result<BTreeMap<PluginName, PluginVersion>> {
        Ok(BTreeMap::new())
    }

    async fn get_plugin(
        &self,
        _name: &PluginName,
        _version: &PluginVersion,
    ) -> Result<Option<PluginDescriptor>> {
        Ok(None)
    }

    fn cache_key(&self) -> String {
        EMPTY_CACHE_KEY.to_string()
    }

    fn presentable_name(&self) -> String {
        "empty".to_string()
    }
}

/// Two repositories layered on top of each other.
///
/// Lookups prefer `overlay` and fall back to `base`; latest versions are
/// merged taking the greater version per name.
#[derive(Clone)]
pub struct CompositeRepository {
    base: Arc<dyn PluginRepository>,
    overlay: Arc<dyn PluginRepository>,
}

/// Compose two repositories; `b` shadows `a`.
pub fn compose(a: Arc<dyn PluginRepository>, b: Arc<dyn PluginRepository>) -> CompositeRepository {
    CompositeRepository {
        base: a,
        overlay: b,
    }
}

#[async_trait]
impl PluginRepository for CompositeRepository {
    async fn latest_versions(
        &self,
        names: &BTreeSet<PluginName>,
        ship_version: &PluginVersion,
    ) -> Result<BTreeMap<PluginName, PluginVersion>> {
        let mut merged = self.base.latest_versions(names, ship_version).await?;
        for (name, version) in self.overlay.latest_versions(names, ship_version).await? {
            match merged.get(&name) {
                Some(existing) if *existing >= version => {}
                _ => {
                    merged.insert(name, version);
                }
            }
        }
        Ok(merged)
    }

    async fn get_plugin(
        &self,
        name: &PluginName,
        version: &PluginVersion,
    ) -> Result<Option<PluginDescriptor>> {
        if let Some(descriptor) = self.overlay.get_plugin(name, version).await? {
            return Ok(Some(descriptor));
        }
        tracing::trace!(%name, %version, "Falling back to base repository");
        self.base.get_plugin(name, version).await
    }

    fn cache_key(&self) -> String {
        format!("{}-{}", self.base.cache_key(), self.overlay.cache_key())
    }

    fn presentable_name(&self) -> String {
        format!(
            "{} + {}",
            self.base.presentable_name(),
            self.overlay.presentable_name()
        )
    }
}

impl std::fmt::Debug for CompositeRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeRepository")
            .field("base", &self.base.presentable_name())
            .field("overlay", &self.overlay.presentable_name())
            .finish()
    }
}
