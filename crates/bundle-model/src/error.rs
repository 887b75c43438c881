/// Errors raised by the plugin model.
///
/// These are hard failures: a malformed version string or a cyclic layer
/// graph is a data or configuration bug, never something the resolver
/// recovers from.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Version string does not follow either version scheme.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Requirement string is neither `^VERSION` nor `>=VERSION`.
    #[error("invalid version requirement '{requirement}': {reason}")]
    InvalidRequirement { requirement: String, reason: String },

    /// Layer selector key outside the known vocabulary.
    #[error("unknown layer selector: {0}")]
    UnknownLayer(String),

    /// The layer dependency graph contains a cycle.
    #[error("cyclic dependency: {path}")]
    CyclicDependency { path: String },

    /// Failed to serialize a descriptor to its canonical form.
    #[error("failed to serialize descriptor: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_version(version: &str, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.to_string(),
            reason: reason.into(),
        }
    }
}
