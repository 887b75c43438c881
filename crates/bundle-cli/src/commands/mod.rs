//! Command implementations for bundle-cli

pub mod layers;
pub mod resolve;

pub use layers::{run_layers_dedupe, run_layers_sort};
pub use resolve::run_resolve;
