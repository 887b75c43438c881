//! Shared fixtures for resolver integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bundle_model::{PluginDescriptor, PluginName, PluginVersion, VersionRequirement};
use bundle_resolver::{Error, PluginRepository, Result, StaticRepository};

pub fn v(s: &str) -> PluginVersion {
    PluginVersion::parse(s).unwrap()
}

pub fn above(s: &str) -> VersionRequirement {
    VersionRequirement::Above(v(s))
}

pub fn compatible(s: &str) -> VersionRequirement {
    VersionRequirement::CompatibleWith(v(s))
}

pub fn plugin(name: &str, version: &str) -> PluginDescriptor {
    PluginDescriptor::new(name, v(version))
}

/// Loaded plugins as `name@version` strings, sorted.
pub fn loaded(resolution: &bundle_resolver::Resolution) -> Vec<String> {
    resolution
        .config
        .bundles_to_load
        .iter()
        .map(|d| d.to_string())
        .collect()
}

/// In-memory repository with injectable failures and latency.
///
/// Every `get_plugin` call is recorded so tests can assert on fetch order
/// and count.
pub struct FakeRepository {
    inner: StaticRepository,
    failing: BTreeSet<PluginName>,
    delays: BTreeMap<PluginName, Duration>,
    fail_latest: bool,
    fetches: Mutex<Vec<(PluginName, PluginVersion)>>,
}

impl FakeRepository {
    pub fn new(plugins: impl IntoIterator<Item = PluginDescriptor>) -> Self {
        Self {
            inner: StaticRepository::new(plugins),
            failing: BTreeSet::new(),
            delays: BTreeMap::new(),
            fail_latest: false,
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// Make every fetch of `name` fail.
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Delay every fetch of `name`.
    pub fn delayed(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.into(), delay);
        self
    }

    /// Make latest-version lookups fail.
    pub fn failing_latest(mut self) -> Self {
        self.fail_latest = true;
        self
    }

    pub fn fetches(&self) -> Vec<(PluginName, PluginVersion)> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n.as_str() == name)
            .count()
    }
}

#[async_trait]
impl PluginRepository for FakeRepository {
    async fn latest_versions(
        &self,
        names: &BTreeSet<PluginName>,
        ship_version: &PluginVersion,
    ) -> Result<BTreeMap<PluginName, PluginVersion>> {
        if self.fail_latest {
            return Err(Error::repository("fake", "index unavailable"));
        }
        self.inner.latest_versions(names, ship_version).await
    }

    async fn get_plugin(
        &self,
        name: &PluginName,
        version: &PluginVersion,
    ) -> Result<Option<PluginDescriptor>> {
        self.fetches
            .lock()
            .unwrap()
            .push((name.clone(), version.clone()));
        if let Some(delay) = self.delays.get(name) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(name) {
            return Err(Error::repository("fake", format!("cannot download {name}")));
        }
        self.inner.get_plugin(name, version).await
    }

    fn cache_key(&self) -> String {
        format!("fake-{}", self.inner.cache_key())
    }

    fn presentable_name(&self) -> String {
        "fake".to_string()
    }
}
