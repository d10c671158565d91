//! Error types for the registry

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Error types for registry client operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Blob not found
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    /// Manifest not found
    #[error("manifest not found: {0}")]
    ManifestNotFound(String),

    /// Invalid digest format
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Invalid registry reference
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Stored or received manifest could not be understood
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// Unsupported manifest media type
    #[error("unsupported manifest type: {0}")]
    UnsupportedManifestType(String),

    /// Digest mismatch
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Expected digest
        expected: String,
        /// Actual digest
        actual: String,
    },

    /// Storage error
    #[error("storage error: {0}")]
    Storage(#[from] storage::StorageError),

    /// Manifest (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure in a transport implementation outside this crate
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl RegistryError {
    /// Wrap an arbitrary transport failure.
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        RegistryError::Transport(error.into())
    }

    /// Whether the error means the requested content does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            RegistryError::BlobNotFound(_) | RegistryError::ManifestNotFound(_) => true,
            RegistryError::Storage(error) => error.is_not_found(),
            _ => false,
        }
    }

    /// Get the OCI distribution error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::BlobNotFound(_) => "BLOB_UNKNOWN",
            RegistryError::ManifestNotFound(_) => "MANIFEST_UNKNOWN",
            RegistryError::InvalidDigest(_) | RegistryError::DigestMismatch { .. } => {
                "DIGEST_INVALID"
            }
            RegistryError::InvalidManifest(_)
            | RegistryError::UnsupportedManifestType(_)
            | RegistryError::Serialization(_) => "MANIFEST_INVALID",
            RegistryError::InvalidReference(_) => "NAME_INVALID",
            RegistryError::Storage(_) | RegistryError::Transport(_) => "UNKNOWN",
        }
    }
}
