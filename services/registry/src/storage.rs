//! Registry client backed by a storage bucket

use bytes::Bytes;
use camino::Utf8PathBuf;

use crate::client::RegistryClient;
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};
use crate::manifest::Manifest;
use crate::reference::RegistryReference;

/// A registry kept in one bucket of a [`storage::Storage`].
///
/// Layout within the bucket:
///
/// - `blobs/<algorithm>/<encoded>`: blob content, shared by all repositories
/// - `manifests/<repository>/<digest>`: manifest JSON, by digest
/// - `tags/<repository>/<tag>`: the digest a tag points to
///
/// Tag files are replaced whole on every manifest push, which gives last-write-wins
/// semantics for concurrent publishes of the same tag.
#[derive(Clone, Debug)]
pub struct StorageRegistry {
    storage: storage::Storage,
    bucket: String,
}

impl StorageRegistry {
    /// Create a new registry in `bucket` of `storage`.
    pub fn new(storage: storage::Storage, bucket: impl Into<String>) -> Self {
        Self {
            storage,
            bucket: bucket.into(),
        }
    }

    /// Bucket used by this registry.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Get the path for a blob
    fn blob_path(&self, digest: &Digest) -> Utf8PathBuf {
        Utf8PathBuf::from(format!(
            "blobs/{}/{}",
            digest.algorithm(),
            digest.encoded()
        ))
    }

    /// Get the path for a manifest
    fn manifest_path(&self, repository: &str, digest: &Digest) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("manifests/{}/{}", repository, digest))
    }

    /// Get the path for a tag
    fn tag_path(&self, repository: &str, tag: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("tags/{}/{}", repository, tag))
    }

    /// Resolve a tag to the manifest digest it points to.
    async fn read_tag(&self, reference: &RegistryReference) -> RegistryResult<Option<Digest>> {
        let path = self.tag_path(&reference.repository(), reference.tag());
        match self.storage.get(&self.bucket, &path).await {
            Ok(data) => {
                let digest = String::from_utf8_lossy(&data).trim().parse()?;
                Ok(Some(digest))
            }
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

#[async_trait::async_trait]
impl RegistryClient for StorageRegistry {
    #[tracing::instrument(skip_all, fields(%reference, %digest))]
    async fn blob_exists(
        &self,
        reference: &RegistryReference,
        digest: &Digest,
    ) -> RegistryResult<bool> {
        Ok(self
            .storage
            .exists(&self.bucket, &self.blob_path(digest))
            .await?)
    }

    #[tracing::instrument(skip_all, fields(%reference, %media_type, size = data.len()))]
    async fn put_blob(
        &self,
        reference: &RegistryReference,
        data: Bytes,
        media_type: &str,
    ) -> RegistryResult<Digest> {
        let digest = Digest::sha256(&data);
        let path = self.blob_path(&digest);

        if self.storage.exists(&self.bucket, &path).await? {
            tracing::trace!(%digest, "blob already stored");
            return Ok(digest);
        }

        self.storage.put(&self.bucket, &path, &data).await?;
        tracing::debug!(%digest, "stored blob");
        Ok(digest)
    }

    #[tracing::instrument(skip_all, fields(%reference, %digest))]
    async fn get_blob(
        &self,
        reference: &RegistryReference,
        digest: &Digest,
    ) -> RegistryResult<Bytes> {
        let path = self.blob_path(digest);
        let data = self
            .storage
            .get(&self.bucket, &path)
            .await
            .map_err(|error| {
                if error.is_not_found() {
                    RegistryError::BlobNotFound(digest.to_string())
                } else {
                    error.into()
                }
            })?;

        Ok(Bytes::from(data))
    }

    #[tracing::instrument(skip_all, fields(%reference))]
    async fn put_manifest(
        &self,
        reference: &RegistryReference,
        manifest: &Manifest,
    ) -> RegistryResult<Digest> {
        manifest.validate()?;

        let data = manifest.to_bytes()?;
        let digest = Digest::sha256(&data);
        let repository = reference.repository();

        // Content first, so a tag never points at a missing manifest.
        self.storage
            .put(&self.bucket, &self.manifest_path(&repository, &digest), &data)
            .await?;

        self.storage
            .put(
                &self.bucket,
                &self.tag_path(&repository, reference.tag()),
                digest.to_string().as_bytes(),
            )
            .await?;

        tracing::debug!(%digest, "tagged manifest");
        Ok(digest)
    }

    #[tracing::instrument(skip_all, fields(%reference))]
    async fn get_manifest(
        &self,
        reference: &RegistryReference,
    ) -> RegistryResult<Option<Manifest>> {
        let Some(digest) = self.read_tag(reference).await? else {
            return Ok(None);
        };

        let path = self.manifest_path(&reference.repository(), &digest);
        let data = self
            .storage
            .get(&self.bucket, &path)
            .await
            .map_err(|error| {
                if error.is_not_found() {
                    RegistryError::ManifestNotFound(format!("{reference} ({digest})"))
                } else {
                    error.into()
                }
            })?;

        digest.verify(&data)?;
        Ok(Some(Manifest::from_bytes(&data)?))
    }
}
