//! Plugin repositories and dependency resolution.
//!
//! [`DependencyResolver`] turns a list of [`PluginCommand`]s into a
//! [`Resolution`]: the plugins to load for a ship version plus the
//! [`Problem`]s found along the way. Descriptors come from a
//! [`PluginRepository`]; repositories can be layered with [`compose`].

mod command;
mod config;
pub mod error;
mod front;
mod repository;
mod resolution;
mod resolver;
mod static_repository;

pub use command::{Intent, PluginCommand};
pub use config::{BundleManifest, ResolverSettings};
pub use error::{Error, Result};
pub use repository::{
    CompositeRepository, EMPTY_CACHE_KEY, EmptyRepository, PluginRepository, compose,
};
pub use resolution::{Problem, Resolution, ResolvedPluginsConfig};
pub use resolver::DependencyResolver;
pub use static_repository::StaticRepository;
