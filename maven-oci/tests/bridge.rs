//! Publishing and resolving through a storage-backed registry

use std::sync::Arc;

use bytes::Bytes;
use camino::{Utf8Path, Utf8PathBuf};
use maven_oci::{
    bundler, ArtifactBundle, BridgeError, ChecksumAlgorithm, MavenCoordinate, Publisher,
    RegistryConfig, Resolver,
};
use registry::{
    Digest, Manifest, RegistryClient, RegistryError, RegistryReference, RegistryResult,
    StorageRegistry,
};
use storage::{Storage, TempDriver};

const BUCKET: &str = "registry";

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn root(&self) -> &Utf8Path {
        Utf8Path::from_path(self.dir.path()).unwrap()
    }

    fn write(&self, name: &str, content: &[u8]) -> Utf8PathBuf {
        let path = self.root().join("build").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn destination(&self) -> Utf8PathBuf {
        self.root().join("repository")
    }

    fn resolved(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.destination()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    fn read(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.destination().join(name)).unwrap()
    }
}

fn disk_registry() -> (Storage, StorageRegistry) {
    let storage: Storage = TempDriver::new().unwrap().into();
    let registry = StorageRegistry::new(storage.clone(), BUCKET);
    (storage, registry)
}

fn config() -> RegistryConfig {
    RegistryConfig::new("https://registry.example.com/maven")
}

fn coordinate(version: &str) -> MavenCoordinate {
    MavenCoordinate::new("com.example", "a", version).unwrap()
}

async fn publish<C: RegistryClient>(
    client: C,
    workspace: &Workspace,
    coordinate: &MavenCoordinate,
    jar: &[u8],
) -> maven_oci::PublishedManifest {
    let files = [
        workspace.write("a.jar", jar),
        workspace.write("a.pom", b"<project><artifactId>a</artifactId></project>"),
    ];
    let bundle = bundler::bundle(&files, coordinate).await.unwrap();
    let reference = config().reference(coordinate).unwrap();
    Publisher::new(client)
        .publish(coordinate, &bundle, &reference)
        .await
        .unwrap()
}

#[tokio::test]
async fn publish_then_resolve() {
    let workspace = Workspace::new();
    let (_storage, registry) = disk_registry();
    let coordinate = coordinate("1.0");

    let published = publish(registry.clone(), &workspace, &coordinate, b"PK\x03\x04jar").await;
    assert_eq!(
        published.reference.to_string(),
        "registry.example.com/maven/com-example/a:1.0"
    );
    assert_eq!(published.manifest.layers.len(), 6);

    let resolver = Resolver::new(registry);
    assert!(resolver.exists(&coordinate, &config()).await);
    assert!(
        resolver
            .resolve(&coordinate, &config(), &workspace.destination())
            .await
    );

    assert_eq!(
        workspace.resolved(),
        [
            "a-1.0.jar",
            "a-1.0.jar.md5",
            "a-1.0.jar.sha1",
            "a-1.0.pom",
            "a-1.0.pom.md5",
            "a-1.0.pom.sha1",
        ]
    );
    assert_eq!(workspace.read("a-1.0.jar"), b"PK\x03\x04jar");
    assert_eq!(
        workspace.read("a-1.0.pom"),
        b"<project><artifactId>a</artifactId></project>"
    );
    assert_eq!(
        workspace.read("a-1.0.jar.sha1"),
        ChecksumAlgorithm::Sha1.hex_digest(b"PK\x03\x04jar").as_bytes()
    );
    assert_eq!(
        workspace.read("a-1.0.jar.md5"),
        ChecksumAlgorithm::Md5.hex_digest(b"PK\x03\x04jar").as_bytes()
    );
}

#[tokio::test]
async fn extensionless_primary_keeps_its_name() {
    let workspace = Workspace::new();
    let (_storage, registry) = disk_registry();
    let coordinate = coordinate("1.0");

    let files = [workspace.write("app", b"#!/bin/sh\necho hi\n")];
    let bundle = bundler::bundle(&files, &coordinate).await.unwrap();
    let mut bundled: Vec<&str> = bundle.iter().map(|file| file.name()).collect();
    bundled.sort();
    let reference = config().reference(&coordinate).unwrap();
    Publisher::new(registry.clone())
        .publish(&coordinate, &bundle, &reference)
        .await
        .unwrap();

    let resolver = Resolver::new(registry);
    assert!(
        resolver
            .resolve(&coordinate, &config(), &workspace.destination())
            .await
    );
    assert_eq!(workspace.resolved(), ["a-1.0", "a-1.0.md5", "a-1.0.sha1"]);
    assert_eq!(workspace.resolved(), bundled);
    assert_eq!(workspace.read("a-1.0"), b"#!/bin/sh\necho hi\n");
    assert_eq!(
        workspace.read("a-1.0.sha1"),
        ChecksumAlgorithm::Sha1
            .hex_digest(b"#!/bin/sh\necho hi\n")
            .as_bytes()
    );
}

#[tokio::test]
async fn resolve_twice_is_idempotent() {
    let workspace = Workspace::new();
    let (_storage, registry) = disk_registry();
    let coordinate = coordinate("1.0");
    publish(registry.clone(), &workspace, &coordinate, b"jar").await;

    let resolver = Resolver::new(registry);
    assert!(
        resolver
            .resolve(&coordinate, &config(), &workspace.destination())
            .await
    );
    let first = workspace.resolved();
    assert!(
        resolver
            .resolve(&coordinate, &config(), &workspace.destination())
            .await
    );
    assert_eq!(workspace.resolved(), first);
}

#[tokio::test]
async fn republish_replaces_the_tag() {
    let workspace = Workspace::new();
    let (_storage, registry) = disk_registry();
    let coordinate = coordinate("1.0-SNAPSHOT");

    publish(registry.clone(), &workspace, &coordinate, b"first build").await;
    publish(registry.clone(), &workspace, &coordinate, b"second build").await;

    let resolver = Resolver::new(registry);
    assert!(
        resolver
            .resolve(&coordinate, &config(), &workspace.destination())
            .await
    );
    assert_eq!(workspace.read("a-1.0-SNAPSHOT.jar"), b"second build");
}

#[tokio::test]
async fn versions_are_independent() {
    let workspace = Workspace::new();
    let (_storage, registry) = disk_registry();

    publish(registry.clone(), &workspace, &coordinate("1.0"), b"one").await;

    let resolver = Resolver::new(registry);
    assert!(resolver.exists(&coordinate("1.0"), &config()).await);
    assert!(!resolver.exists(&coordinate("2.0"), &config()).await);
}

#[tokio::test]
async fn missing_coordinate_writes_nothing() {
    let workspace = Workspace::new();
    let (_storage, registry) = disk_registry();
    let resolver = Resolver::new(registry);

    assert!(!resolver.exists(&coordinate("1.0"), &config()).await);
    assert!(
        !resolver
            .resolve(&coordinate("1.0"), &config(), &workspace.destination())
            .await
    );
    assert!(workspace.resolved().is_empty());
}

#[tokio::test]
async fn invalid_registry_url_is_absent() {
    let workspace = Workspace::new();
    let (_storage, registry) = disk_registry();
    let resolver = Resolver::new(registry);
    let config = RegistryConfig::new("");

    assert!(!resolver.exists(&coordinate("1.0"), &config).await);
    assert!(
        !resolver
            .resolve(&coordinate("1.0"), &config, &workspace.destination())
            .await
    );
    assert!(workspace.resolved().is_empty());
}

#[tokio::test]
async fn corrupted_blob_writes_nothing() {
    let workspace = Workspace::new();
    let (storage, registry) = disk_registry();
    let coordinate = coordinate("1.0");
    let published = publish(registry.clone(), &workspace, &coordinate, b"jar").await;

    let pom = &published.manifest.layers[3];
    let path = format!("blobs/{}/{}", pom.digest.algorithm(), pom.digest.encoded());
    storage
        .put(BUCKET, Utf8Path::new(&path), b"tampered")
        .await
        .unwrap();

    let resolver = Resolver::new(registry);
    assert!(resolver.exists(&coordinate, &config()).await);
    assert!(
        !resolver
            .resolve(&coordinate, &config(), &workspace.destination())
            .await
    );
    assert!(workspace.resolved().is_empty());
}

#[tokio::test]
async fn colliding_groups_share_a_reference() {
    let workspace = Workspace::new();
    let (_storage, registry) = disk_registry();
    let dotted = MavenCoordinate::new("com.example", "a", "1.0").unwrap();
    let dashed = MavenCoordinate::new("com-example", "a", "1.0").unwrap();

    publish(registry.clone(), &workspace, &dotted, b"dotted").await;
    publish(registry.clone(), &workspace, &dashed, b"dashed").await;

    let resolver = Resolver::new(registry);
    assert!(
        resolver
            .resolve(&dotted, &config(), &workspace.destination())
            .await
    );
    assert_eq!(workspace.read("a-1.0.jar"), b"dashed");
}

#[tokio::test]
async fn shared_client_handle() {
    let workspace = Workspace::new();
    let (_storage, registry) = disk_registry();
    let client: Arc<dyn RegistryClient> = Arc::new(registry);
    let coordinate = coordinate("1.0");

    publish(client.clone(), &workspace, &coordinate, b"jar").await;
    assert!(Resolver::new(client).exists(&coordinate, &config()).await);
}

/// A registry that cannot be reached.
#[derive(Debug)]
struct Unreachable;

#[async_trait::async_trait]
impl RegistryClient for Unreachable {
    async fn blob_exists(&self, _: &RegistryReference, _: &Digest) -> RegistryResult<bool> {
        Err(RegistryError::transport("connection refused"))
    }

    async fn put_blob(&self, _: &RegistryReference, _: Bytes, _: &str) -> RegistryResult<Digest> {
        Err(RegistryError::transport("connection refused"))
    }

    async fn get_blob(&self, _: &RegistryReference, _: &Digest) -> RegistryResult<Bytes> {
        Err(RegistryError::transport("connection refused"))
    }

    async fn put_manifest(&self, _: &RegistryReference, _: &Manifest) -> RegistryResult<Digest> {
        Err(RegistryError::transport("connection refused"))
    }

    async fn get_manifest(&self, _: &RegistryReference) -> RegistryResult<Option<Manifest>> {
        Err(RegistryError::transport("connection refused"))
    }
}

#[tokio::test]
async fn unreachable_registry() {
    let workspace = Workspace::new();
    let coordinate = coordinate("1.0");
    let files = [workspace.write("a.jar", b"jar")];
    let bundle = bundler::bundle(&files, &coordinate).await.unwrap();
    let reference = config().reference(&coordinate).unwrap();

    let err = Publisher::new(Unreachable)
        .publish(&coordinate, &bundle, &reference)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Publish { .. }), "{err}");

    let resolver = Resolver::new(Unreachable);
    assert!(!resolver.exists(&coordinate, &config()).await);
    assert!(
        !resolver
            .resolve(&coordinate, &config(), &workspace.destination())
            .await
    );
    assert!(workspace.resolved().is_empty());
}

#[tokio::test]
async fn empty_bundle() {
    let workspace = Workspace::new();
    let (_storage, registry) = disk_registry();
    let coordinate = coordinate("1.0");

    let files = [workspace.write("a.jar.sha1", b"stale")];
    let err = bundler::bundle(&files, &coordinate).await.unwrap_err();
    assert!(matches!(err, BridgeError::EmptyBundle));

    let reference = config().reference(&coordinate).unwrap();
    let err = Publisher::new(registry.clone())
        .publish(&coordinate, &ArtifactBundle::new(coordinate.clone()), &reference)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::EmptyBundle));
    assert!(!Resolver::new(registry).exists(&coordinate, &config()).await);
}
