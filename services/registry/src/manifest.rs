//! OCI image manifest model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};

/// Media type of an OCI image manifest.
pub const OCI_MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// Media type of the empty config blob used by artifact manifests.
pub const OCI_EMPTY_MEDIA_TYPE: &str = "application/vnd.oci.empty.v1+json";

/// Content of the empty config blob.
pub const OCI_EMPTY_CONTENT: &[u8] = b"{}";

/// Annotation holding a human readable title, used for layer file names.
pub const ANNOTATION_TITLE: &str = "org.opencontainers.image.title";

/// Annotation holding the version of the packaged software.
pub const ANNOTATION_VERSION: &str = "org.opencontainers.image.version";

/// Annotation holding the creation time, RFC 3339.
pub const ANNOTATION_CREATED: &str = "org.opencontainers.image.created";

/// String annotations attached to manifests and descriptors.
pub type Annotations = BTreeMap<String, String>;

/// A content descriptor: media type, digest and size of a blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content.
    pub media_type: String,

    /// Digest of the referenced content.
    pub digest: Digest,

    /// Size of the referenced content, in bytes.
    pub size: u64,

    /// Arbitrary metadata for this descriptor.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: Annotations,
}

impl Descriptor {
    /// Describe `data` with the given media type.
    pub fn for_content(media_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            digest: Digest::sha256(data),
            size: data.len() as u64,
            annotations: Annotations::new(),
        }
    }

    /// The descriptor of the empty `{}` config blob.
    pub fn empty_config() -> Self {
        Self::for_content(OCI_EMPTY_MEDIA_TYPE, OCI_EMPTY_CONTENT)
    }

    /// Add an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Look up an annotation.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// An OCI image manifest, used here as an artifact manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Always `2`.
    pub schema_version: u32,

    /// Manifest media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Type of artifact carried by this manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,

    /// Config blob descriptor.
    pub config: Descriptor,

    /// Content blobs, in order.
    pub layers: Vec<Descriptor>,

    /// Manifest level metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: Annotations,
}

impl Manifest {
    /// An artifact manifest with the empty config and no layers.
    pub fn artifact(artifact_type: impl Into<String>) -> Self {
        Self {
            schema_version: 2,
            media_type: Some(OCI_MANIFEST_MEDIA_TYPE.to_string()),
            artifact_type: Some(artifact_type.into()),
            config: Descriptor::empty_config(),
            layers: Vec::new(),
            annotations: Annotations::new(),
        }
    }

    /// Look up a manifest annotation.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// The manifest media type, falling back to the type implied by the schema.
    pub fn effective_media_type(&self) -> &str {
        self.media_type
            .as_deref()
            .unwrap_or(OCI_MANIFEST_MEDIA_TYPE)
    }

    /// Serialize to the canonical JSON bytes pushed to a registry.
    pub fn to_bytes(&self) -> RegistryResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse and validate manifest bytes.
    pub fn from_bytes(data: &[u8]) -> RegistryResult<Self> {
        let manifest: Manifest = serde_json::from_slice(data)
            .map_err(|err| RegistryError::InvalidManifest(err.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check schema version and media type.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.schema_version != 2 {
            return Err(RegistryError::InvalidManifest(format!(
                "unsupported schema version {}",
                self.schema_version
            )));
        }
        validate_manifest_type(self.effective_media_type())
    }
}

/// Validate manifest type
fn validate_manifest_type(content_type: &str) -> RegistryResult<()> {
    match content_type {
        "application/vnd.docker.distribution.manifest.v2+json"
        | "application/vnd.oci.image.manifest.v1+json" => Ok(()),
        _ => Err(RegistryError::UnsupportedManifestType(
            content_type.to_string(),
        )),
    }
}
