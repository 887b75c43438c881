//! Plugin identity and descriptors.
//!
//! A [`PluginDescriptor`] is what a repository hands back for a
//! `(name, version)` pair. Descriptors are immutable once fetched. All
//! collections are `BTreeMap`s so two equal descriptors serialize to the
//! same bytes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::version::{PluginVersion, ShipVersionRange, VersionRequirement};

/// Metadata key flagging a plugin that is resolved against the frontend only.
pub const FRONTEND_ONLY_META_KEY: &str = "frontend-only";

/// Current descriptor format version.
pub const DESCRIPTOR_FORMAT_VERSION: u32 = 1;

/// Interned plugin identifier. Equality is by string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginName(Arc<str>);

impl PluginName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PluginName {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl AsRef<str> for PluginName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A fully described plugin at one version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: PluginName,
    pub version: PluginVersion,
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    /// Dependencies keyed by plugin name.
    #[serde(default)]
    pub deps: BTreeMap<PluginName, VersionRequirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatible_ship_version_range: Option<ShipVersionRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

fn default_format_version() -> u32 {
    DESCRIPTOR_FORMAT_VERSION
}

/// The part of a descriptor covered by its signature.
///
/// Omits the signature itself and the ship-version range.
#[derive(Debug, Serialize)]
pub struct SignablePluginDescriptor<'a> {
    pub name: &'a PluginName,
    pub version: &'a PluginVersion,
    pub format_version: u32,
    pub deps: &'a BTreeMap<PluginName, VersionRequirement>,
    pub meta: &'a BTreeMap<String, String>,
}

impl PluginDescriptor {
    /// Create a descriptor with no dependencies or metadata.
    pub fn new(name: impl Into<PluginName>, version: PluginVersion) -> Self {
        Self {
            name: name.into(),
            version,
            format_version: DESCRIPTOR_FORMAT_VERSION,
            deps: BTreeMap::new(),
            compatible_ship_version_range: None,
            signature: None,
            meta: BTreeMap::new(),
        }
    }

    /// Builder-style: add a dependency.
    pub fn with_dep(mut self, name: impl Into<PluginName>, requirement: VersionRequirement) -> Self {
        self.deps.insert(name.into(), requirement);
        self
    }

    /// Builder-style: restrict to a ship-version range.
    pub fn with_ship_range(mut self, range: ShipVersionRange) -> Self {
        self.compatible_ship_version_range = Some(range);
        self
    }

    /// Builder-style: set a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Builder-style: flag as frontend-only.
    pub fn frontend_only(self) -> Self {
        self.with_meta(FRONTEND_ONLY_META_KEY, "true")
    }

    pub fn is_frontend_only(&self) -> bool {
        self.meta
            .get(FRONTEND_ONLY_META_KEY)
            .is_some_and(|value| value == "true")
    }

    /// Whether the descriptor may be used with the given ship version.
    ///
    /// Descriptors without a range are compatible with every ship version.
    pub fn is_compatible_with(&self, ship_version: &PluginVersion) -> bool {
        self.compatible_ship_version_range
            .as_ref()
            .is_none_or(|range| range.contains(ship_version))
    }

    pub fn signable(&self) -> SignablePluginDescriptor<'_> {
        SignablePluginDescriptor {
            name: &self.name,
            version: &self.version,
            format_version: self.format_version,
            deps: &self.deps,
            meta: &self.meta,
        }
    }

    /// Bytes a signature is computed over.
    pub fn signable_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.signable())?)
    }

    /// Canonical JSON of the whole descriptor.
    pub fn canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
