//! # Maven artifacts in OCI registries
//!
//! Publishes Maven artifacts (jars, POMs, sources, javadoc) to an OCI registry as a
//! single artifact manifest per coordinate, and resolves them back into a Maven
//! repository layout on disk.
//!
//! A coordinate `groupId:artifactId:version` lives at
//! `host/{prefix}/{sanitized group}/{artifactId}:{version}`; see [`group`] for how
//! group identifiers become path segments.
//!
//! ## Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use maven_oci::{bundler, MavenCoordinate, Publisher, RegistryConfig, Resolver};
//! use registry::StorageRegistry;
//! use storage::MemoryStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = MemoryStorage::with_buckets(&["registry"]).into();
//! let client = StorageRegistry::new(storage, "registry");
//! let config = RegistryConfig::new("https://registry.example.com");
//! let coordinate: MavenCoordinate = "com.example:my-artifact:1.0.0".parse()?;
//!
//! let bundle = bundler::bundle(&["target/app.jar", "pom.xml"], &coordinate).await?;
//! Publisher::new(client.clone())
//!     .publish(&coordinate, &bundle, &config.reference(&coordinate)?)
//!     .await?;
//!
//! let resolver = Resolver::new(client);
//! assert!(resolver.exists(&coordinate, &config).await);
//! assert!(resolver.resolve(&coordinate, &config, Utf8Path::new("repository")).await);
//! # Ok(())
//! # }
//! ```

pub mod bundler;
mod checksum;
mod config;
mod coordinate;
mod error;
pub mod group;
pub mod layout;
mod publisher;
pub mod reference;
mod resolver;

pub use bundler::{ArtifactBundle, ArtifactFile, ArtifactSource};
pub use checksum::ChecksumAlgorithm;
pub use config::{Credentials, RegistryConfig};
pub use coordinate::MavenCoordinate;
pub use error::{BridgeError, BridgeResult};
pub use layout::ArtifactRole;
pub use publisher::{PublishedManifest, Publisher};
pub use resolver::{ResolveState, Resolver};
