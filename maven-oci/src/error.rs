//! Error types for the bridge

use camino::Utf8PathBuf;
use registry::{RegistryError, RegistryReference};

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced by coordinate translation, bundling and publishing.
///
/// Resolution never returns these: it reports `false` and logs the cause.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Malformed coordinate, group identifier or registry URL. Always detected before any I/O.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Nothing to publish.
    #[error("artifact bundle is empty")]
    EmptyBundle,

    /// A blob or manifest push failed.
    #[error("publishing {reference}: {source}")]
    Publish {
        /// The reference being published
        reference: String,
        /// The registry failure
        #[source]
        source: RegistryError,
    },

    /// An artifact file could not be read.
    #[error("reading artifact file {path}: {source}")]
    Io {
        /// The file being read
        path: Utf8PathBuf,
        /// The I/O failure
        #[source]
        source: std::io::Error,
    },
}

impl BridgeError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        BridgeError::InvalidInput(message.into())
    }

    pub(crate) fn publish(
        reference: &RegistryReference,
    ) -> impl FnOnce(RegistryError) -> Self + '_ {
        move |source| BridgeError::Publish {
            reference: reference.to_string(),
            source,
        }
    }
}
