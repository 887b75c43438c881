//! Per-layer code manifests and the set algebra over them.
//!
//! A [`PluginLayer`] is three sets: module-path entries, module names and
//! resources. [`PluginParts`] maps selectors to layers. An absent key means
//! the plugin has no content for that layer, and an empty layer is never
//! stored: inserting one removes the key.
//!
//! [`PluginParts::eliminate_intersections`] moves code shared by the
//! frontend and workspace layers into the matching common layer.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::layer::LayerSelector;

/// Location of a file: on local disk or at a remote URL, with an optional
/// content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Coordinates {
    Local {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hash: Option<String>,
    },
    Remote {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hash: Option<String>,
    },
}

impl Coordinates {
    pub fn local(path: impl Into<String>) -> Self {
        Self::Local {
            path: path.into(),
            hash: None,
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote {
            url: url.into(),
            hash: None,
        }
    }
}

/// A module-path entry: the module archive plus its optional descriptor text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleCoordinates {
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
}

impl ModuleCoordinates {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            descriptor: None,
        }
    }
}

/// Code of one plugin layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginLayer {
    #[serde(default)]
    pub module_path: BTreeSet<ModuleCoordinates>,
    #[serde(default)]
    pub modules: BTreeSet<String>,
    #[serde(default)]
    pub resources: BTreeSet<Coordinates>,
}

impl PluginLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: add module names.
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules.extend(modules.into_iter().map(Into::into));
        self
    }

    /// Builder-style: add module-path entries.
    pub fn with_module_path(mut self, entries: impl IntoIterator<Item = ModuleCoordinates>) -> Self {
        self.module_path.extend(entries);
        self
    }

    /// Builder-style: add resources.
    pub fn with_resources(mut self, resources: impl IntoIterator<Item = Coordinates>) -> Self {
        self.resources.extend(resources);
        self
    }

    /// True when all three sets are empty.
    pub fn is_empty(&self) -> bool {
        self.module_path.is_empty() && self.modules.is_empty() && self.resources.is_empty()
    }

    /// Elementwise intersection; `None` when `other` is absent.
    pub fn intersection(&self, other: Option<&PluginLayer>) -> Option<PluginLayer> {
        let other = other?;
        Some(PluginLayer {
            module_path: self.module_path.intersection(&other.module_path).cloned().collect(),
            modules: self.modules.intersection(&other.modules).cloned().collect(),
            resources: self.resources.intersection(&other.resources).cloned().collect(),
        })
    }

    /// Elementwise union; `self` unchanged when `other` is absent.
    pub fn union(&self, other: Option<&PluginLayer>) -> PluginLayer {
        let Some(other) = other else {
            return self.clone();
        };
        PluginLayer {
            module_path: self.module_path.union(&other.module_path).cloned().collect(),
            modules: self.modules.union(&other.modules).cloned().collect(),
            resources: self.resources.union(&other.resources).cloned().collect(),
        }
    }

    /// Elementwise difference; `self` unchanged when `other` is absent.
    pub fn subtract(&self, other: Option<&PluginLayer>) -> PluginLayer {
        let Some(other) = other else {
            return self.clone();
        };
        PluginLayer {
            module_path: self.module_path.difference(&other.module_path).cloned().collect(),
            modules: self.modules.difference(&other.modules).cloned().collect(),
            resources: self.resources.difference(&other.resources).cloned().collect(),
        }
    }
}

/// Selector triples deduplicated by [`PluginParts::eliminate_intersections`],
/// in application order: `(frontend, workspace, common)`.
pub const DEDUPLICATION_TRIPLES: [(LayerSelector, LayerSelector, LayerSelector); 3] = [
    (
        LayerSelector::Frontend,
        LayerSelector::Workspace,
        LayerSelector::Common,
    ),
    (
        LayerSelector::FrontendImpl,
        LayerSelector::WorkspaceImpl,
        LayerSelector::CommonImpl,
    ),
    (
        LayerSelector::FrontendApi,
        LayerSelector::WorkspaceApi,
        LayerSelector::CommonApi,
    ),
];

/// Layers of a plugin keyed by selector. Never stores an empty layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<LayerSelector, PluginLayer>", into = "BTreeMap<LayerSelector, PluginLayer>")]
pub struct PluginParts {
    layers: BTreeMap<LayerSelector, PluginLayer>,
}

impl PluginParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, selector: LayerSelector) -> Option<&PluginLayer> {
        self.layers.get(&selector)
    }

    /// Store a layer, or remove the selector if the layer is empty.
    pub fn insert(&mut self, selector: LayerSelector, layer: PluginLayer) {
        if layer.is_empty() {
            self.layers.remove(&selector);
        } else {
            self.layers.insert(selector, layer);
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, selector: LayerSelector, layer: PluginLayer) -> Self {
        self.insert(selector, layer);
        self
    }

    pub fn remove(&mut self, selector: LayerSelector) -> Option<PluginLayer> {
        self.layers.remove(&selector)
    }

    pub fn selectors(&self) -> impl Iterator<Item = LayerSelector> + '_ {
        self.layers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Move code shared between each frontend/workspace pair into the
    /// corresponding common layer.
    ///
    /// Triples are applied in [`DEDUPLICATION_TRIPLES`] order. Selectors
    /// outside a triple are untouched by it.
    pub fn eliminate_intersections(self) -> PluginParts {
        DEDUPLICATION_TRIPLES
            .iter()
            .fold(self, |parts, &(frontend, workspace, common)| {
                parts.eliminate_triple(frontend, workspace, common)
            })
    }

    fn eliminate_triple(
        mut self,
        frontend: LayerSelector,
        workspace: LayerSelector,
        common: LayerSelector,
    ) -> PluginParts {
        let shared = self
            .get(frontend)
            .and_then(|layer| layer.intersection(self.get(workspace)));
        let Some(shared) = shared else {
            return self;
        };

        let merged = match self.get(common) {
            Some(existing) => existing.union(Some(&shared)),
            None => shared.clone(),
        };
        let frontend_rest = self.get(frontend).map(|layer| layer.subtract(Some(&shared)));
        let workspace_rest = self.get(workspace).map(|layer| layer.subtract(Some(&shared)));

        self.insert(common, merged);
        if let Some(rest) = frontend_rest {
            self.insert(frontend, rest);
        }
        if let Some(rest) = workspace_rest {
            self.insert(workspace, rest);
        }

        tracing::trace!(%frontend, %workspace, %common, "Eliminated layer intersection");
        self
    }
}

impl From<BTreeMap<LayerSelector, PluginLayer>> for PluginParts {
    fn from(layers: BTreeMap<LayerSelector, PluginLayer>) -> Self {
        layers
            .into_iter()
            .fold(PluginParts::new(), |parts, (selector, layer)| parts.with(selector, layer))
    }
}

impl From<PluginParts> for BTreeMap<LayerSelector, PluginLayer> {
    fn from(parts: PluginParts) -> Self {
        parts.layers
    }
}

impl FromIterator<(LayerSelector, PluginLayer)> for PluginParts {
    fn from_iter<I: IntoIterator<Item = (LayerSelector, PluginLayer)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(PluginParts::new(), |parts, (selector, layer)| parts.with(selector, layer))
    }
}
