//! Plugin model for the bundle resolver.
//!
//! This crate provides plugin versions and requirements, plugin descriptors,
//! layer selectors with their ordering, and the set algebra used to
//! deduplicate code shared between plugin layers.

pub mod descriptor;
pub mod error;
pub mod layer;
pub mod ordering;
pub mod parts;
pub mod version;

pub use descriptor::{FRONTEND_ONLY_META_KEY, PluginDescriptor, PluginName};
pub use error::{Error, Result};
pub use layer::LayerSelector;
pub use ordering::{sort_by_internal_dependencies, sort_topologically};
pub use parts::{Coordinates, ModuleCoordinates, PluginLayer, PluginParts};
pub use version::{PluginVersion, ShipVersionRange, VersionRequirement};
