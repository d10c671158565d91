//! Integration tests for the storage-backed registry

use std::sync::Arc;

use bytes::Bytes;
use registry::manifest::ANNOTATION_TITLE;
use registry::{Descriptor, Digest, Manifest, RegistryClient, RegistryReference, StorageRegistry};
use storage::{MemoryStorage, TempDriver};

/// Helper to create a registry on disk
fn disk_registry() -> StorageRegistry {
    let driver = TempDriver::new().unwrap();
    StorageRegistry::new(driver.into(), "test-registry")
}

fn reference() -> RegistryReference {
    "registry.example.com/maven/com-example/app:1.0.0"
        .parse()
        .unwrap()
}

async fn push_artifact(registry: &dyn RegistryClient, reference: &RegistryReference) -> Manifest {
    let config = registry
        .put_blob(
            reference,
            Bytes::from_static(b"{}"),
            "application/vnd.oci.empty.v1+json",
        )
        .await
        .unwrap();
    assert_eq!(config, Descriptor::empty_config().digest);

    let mut manifest = Manifest::artifact("application/vnd.maven.artifact.v1");
    for (name, data) in [
        ("app-1.0.0.jar", &b"PK\x03\x04"[..]),
        ("app-1.0.0.pom", &b"<project/>"[..]),
    ] {
        let digest = registry
            .put_blob(reference, Bytes::copy_from_slice(data), "application/octet-stream")
            .await
            .unwrap();
        let descriptor = Descriptor::for_content("application/octet-stream", data)
            .with_annotation(ANNOTATION_TITLE, name);
        assert_eq!(descriptor.digest, digest);
        manifest.layers.push(descriptor);
    }

    registry.put_manifest(reference, &manifest).await.unwrap();
    manifest
}

#[tokio::test]
async fn test_publish_and_pull_on_disk() {
    let registry = disk_registry();
    let reference = reference();

    let manifest = push_artifact(&registry, &reference).await;

    let pulled = registry.get_manifest(&reference).await.unwrap().unwrap();
    assert_eq!(pulled, manifest);

    for layer in &pulled.layers {
        assert!(registry.blob_exists(&reference, &layer.digest).await.unwrap());
        let data = registry.get_blob(&reference, &layer.digest).await.unwrap();
        layer.digest.verify(&data).unwrap();
        assert_eq!(data.len() as u64, layer.size);
    }
}

#[tokio::test]
async fn test_missing_tag_is_none() {
    let registry = disk_registry();
    assert!(registry.get_manifest(&reference()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_blob_not_found() {
    let registry = disk_registry();
    let err = registry
        .get_blob(&reference(), &Digest::sha256(b"missing"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.error_code(), "BLOB_UNKNOWN");
}

#[tokio::test]
async fn test_shared_client_through_arc() {
    let registry: Arc<dyn RegistryClient> = Arc::new(StorageRegistry::new(
        MemoryStorage::with_buckets(&["registry"]).into(),
        "registry",
    ));
    let reference = reference();

    let manifest = push_artifact(&registry, &reference).await;
    let pulled = registry.get_manifest(&reference).await.unwrap();
    assert_eq!(pulled, Some(manifest));
}

#[tokio::test]
async fn test_tags_are_independent() {
    let registry = disk_registry();
    let first = reference();
    let second: RegistryReference = "registry.example.com/maven/com-example/app:2.0.0"
        .parse()
        .unwrap();

    push_artifact(&registry, &first).await;
    assert!(registry.get_manifest(&second).await.unwrap().is_none());

    let mut replacement = Manifest::artifact("application/vnd.maven.artifact.v1");
    replacement
        .annotations
        .insert("replaced".to_string(), "yes".to_string());
    registry.put_manifest(&second, &replacement).await.unwrap();

    let pulled_first = registry.get_manifest(&first).await.unwrap().unwrap();
    let pulled_second = registry.get_manifest(&second).await.unwrap().unwrap();
    assert_eq!(pulled_first.layers.len(), 2);
    assert_eq!(pulled_second, replacement);
}
