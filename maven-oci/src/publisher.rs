//! Pushing an [`ArtifactBundle`] to a registry as a single artifact manifest.

use bytes::Bytes;
use registry::manifest::{ANNOTATION_CREATED, ANNOTATION_TITLE, ANNOTATION_VERSION};
use registry::{
    Descriptor, Digest, Manifest, RegistryClient, RegistryError, RegistryReference, RegistryResult,
};

use crate::bundler::{ArtifactBundle, ArtifactFile, ArtifactSource};
use crate::coordinate::MavenCoordinate;
use crate::error::{BridgeError, BridgeResult};
use crate::layout;

/// A manifest that was pushed and tagged.
#[derive(Debug, Clone)]
pub struct PublishedManifest {
    /// Where the manifest was tagged.
    pub reference: RegistryReference,
    /// Digest of the manifest as returned by the registry.
    pub digest: Digest,
    /// The manifest content.
    pub manifest: Manifest,
}

/// Publishes bundles through a [`RegistryClient`].
#[derive(Debug, Clone)]
pub struct Publisher<C> {
    client: C,
}

impl<C> Publisher<C>
where
    C: RegistryClient,
{
    /// Publish through `client`.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Push every blob of `bundle`, then a manifest tagged `reference` that lists them.
    ///
    /// Blobs are pushed in bundle order after the empty config blob; blobs the registry
    /// already has are not uploaded again. The manifest is pushed last, so a failure
    /// part way leaves at most orphaned blobs and never a manifest without its layers.
    /// Publishing again replaces the tag.
    #[tracing::instrument(skip_all, fields(coordinate = %coordinate, reference = %reference))]
    pub async fn publish(
        &self,
        coordinate: &MavenCoordinate,
        bundle: &ArtifactBundle,
        reference: &RegistryReference,
    ) -> BridgeResult<PublishedManifest> {
        if bundle.is_empty() {
            return Err(BridgeError::EmptyBundle);
        }
        if bundle.coordinate() != coordinate {
            return Err(BridgeError::invalid(format!(
                "bundle was built for {}, not {coordinate}",
                bundle.coordinate()
            )));
        }

        let manifest = artifact_manifest(coordinate, bundle, reference);

        self.push_blob(
            reference,
            &manifest.config,
            Bytes::from_static(registry::manifest::OCI_EMPTY_CONTENT),
        )
        .await
        .map_err(BridgeError::publish(reference))?;

        for (file, descriptor) in bundle.iter().zip(&manifest.layers) {
            tracing::debug!(name = file.name(), digest = %descriptor.digest, "Pushing blob");
            self.push_blob(reference, descriptor, file.data().clone())
                .await
                .map_err(BridgeError::publish(reference))?;
        }

        let digest = self
            .client
            .put_manifest(reference, &manifest)
            .await
            .map_err(BridgeError::publish(reference))?;

        tracing::info!(%digest, layers = manifest.layers.len(), "Published");

        Ok(PublishedManifest {
            reference: reference.clone(),
            digest,
            manifest,
        })
    }

    async fn push_blob(
        &self,
        reference: &RegistryReference,
        descriptor: &Descriptor,
        data: Bytes,
    ) -> RegistryResult<()> {
        if self.client.blob_exists(reference, &descriptor.digest).await? {
            tracing::trace!(digest = %descriptor.digest, "Blob already present");
            return Ok(());
        }

        let digest = self
            .client
            .put_blob(reference, data, &descriptor.media_type)
            .await?;
        if digest != descriptor.digest {
            return Err(RegistryError::DigestMismatch {
                expected: descriptor.digest.to_string(),
                actual: digest.to_string(),
            });
        }
        Ok(())
    }
}

fn layer_descriptor(file: &ArtifactFile) -> Descriptor {
    let descriptor = Descriptor::for_content(file.media_type(), file.data())
        .with_annotation(ANNOTATION_TITLE, file.name())
        .with_annotation(layout::ANNOTATION_ROLE, file.role().as_str())
        .with_annotation(layout::ANNOTATION_EXTENSION, file.extension());

    match file.source() {
        ArtifactSource::File(_) => descriptor,
        ArtifactSource::Checksum {
            algorithm,
            target_role,
            ..
        } => descriptor
            .with_annotation(layout::ANNOTATION_CHECKSUM_ALGORITHM, algorithm.as_str())
            .with_annotation(layout::ANNOTATION_CHECKSUM_TARGET_ROLE, target_role.as_str()),
    }
}

fn artifact_manifest(
    coordinate: &MavenCoordinate,
    bundle: &ArtifactBundle,
    reference: &RegistryReference,
) -> Manifest {
    let mut manifest = Manifest::artifact(layout::ARTIFACT_TYPE);
    manifest.layers = bundle.iter().map(layer_descriptor).collect();

    for (key, value) in [
        (layout::ANNOTATION_GROUP_ID, coordinate.group_id().to_string()),
        (layout::ANNOTATION_ARTIFACT_ID, coordinate.artifact_id().to_string()),
        (layout::ANNOTATION_MAVEN_VERSION, coordinate.version().to_string()),
        (layout::ANNOTATION_REFERENCE, reference.to_string()),
        (
            ANNOTATION_TITLE,
            format!("{}:{}", coordinate.group_id(), coordinate.artifact_id()),
        ),
        (ANNOTATION_VERSION, coordinate.version().to_string()),
        (
            ANNOTATION_CREATED,
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ),
    ] {
        manifest.annotations.insert(key.to_string(), value);
    }

    manifest
}
