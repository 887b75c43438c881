//! Error types for bundle-resolver

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] bundle_model::Error),

    #[error("failed to parse bundle manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    #[error("bundle manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A repository lookup failed. The resolver reports this as a fetch
    /// issue for the affected plugin instead of aborting.
    #[error("repository '{repository}' failed: {reason}")]
    Repository { repository: String, reason: String },
}

impl Error {
    pub fn repository(repository: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Repository {
            repository: repository.into(),
            reason: reason.into(),
        }
    }
}
