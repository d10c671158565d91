//! The registry client boundary

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::digest::Digest;
use crate::error::RegistryResult;
use crate::manifest::Manifest;
use crate::reference::RegistryReference;

/// Operations a registry must provide to publish and resolve artifacts.
///
/// Blobs are scoped to the repository of `reference`; its tag is ignored by the blob
/// operations. Implementations own transport, authentication and retry policy.
#[async_trait::async_trait]
pub trait RegistryClient: fmt::Debug + Send + Sync {
    /// Whether a blob with this digest is already present.
    async fn blob_exists(&self, reference: &RegistryReference, digest: &Digest)
        -> RegistryResult<bool>;

    /// Store a blob and return its digest.
    async fn put_blob(
        &self,
        reference: &RegistryReference,
        data: Bytes,
        media_type: &str,
    ) -> RegistryResult<Digest>;

    /// Fetch a blob. A missing blob is [`crate::RegistryError::BlobNotFound`].
    async fn get_blob(
        &self,
        reference: &RegistryReference,
        digest: &Digest,
    ) -> RegistryResult<Bytes>;

    /// Store `manifest` under the tag of `reference`, replacing whatever the tag pointed to.
    /// Returns the manifest digest.
    async fn put_manifest(
        &self,
        reference: &RegistryReference,
        manifest: &Manifest,
    ) -> RegistryResult<Digest>;

    /// Fetch the manifest tagged by `reference`, or `None` when the tag does not exist.
    async fn get_manifest(&self, reference: &RegistryReference) -> RegistryResult<Option<Manifest>>;
}

macro_rules! forward_client {
    ($($ty:ty),*) => {
        $(
            #[async_trait::async_trait]
            impl<C> RegistryClient for $ty
            where
                C: RegistryClient + ?Sized,
            {
                async fn blob_exists(
                    &self,
                    reference: &RegistryReference,
                    digest: &Digest,
                ) -> RegistryResult<bool> {
                    (**self).blob_exists(reference, digest).await
                }

                async fn put_blob(
                    &self,
                    reference: &RegistryReference,
                    data: Bytes,
                    media_type: &str,
                ) -> RegistryResult<Digest> {
                    (**self).put_blob(reference, data, media_type).await
                }

                async fn get_blob(
                    &self,
                    reference: &RegistryReference,
                    digest: &Digest,
                ) -> RegistryResult<Bytes> {
                    (**self).get_blob(reference, digest).await
                }

                async fn put_manifest(
                    &self,
                    reference: &RegistryReference,
                    manifest: &Manifest,
                ) -> RegistryResult<Digest> {
                    (**self).put_manifest(reference, manifest).await
                }

                async fn get_manifest(
                    &self,
                    reference: &RegistryReference,
                ) -> RegistryResult<Option<Manifest>> {
                    (**self).get_manifest(reference).await
                }
            }
        )*
    };
}

forward_client!(Arc<C>, Box<C>);
