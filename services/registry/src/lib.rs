//! # OCI Registry client model
//!
//! Types for talking to an OCI registry following the
//! [OCI Distribution Specification](https://github.com/opencontainers/distribution-spec),
//! and a registry implementation kept in a [`storage::Storage`] bucket.
//!
//! ## Features
//!
//! - Digests, descriptors and image manifests with OCI JSON encoding
//! - `host/repository:tag` references
//! - The [`RegistryClient`] trait, implemented by transports
//! - [`StorageRegistry`], a registry over any storage backend
//!
//! ## Example
//!
//! ```no_run
//! use registry::{RegistryClient, RegistryReference, StorageRegistry};
//! use storage::MemoryStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = MemoryStorage::with_buckets(&["registry"]);
//! let registry = StorageRegistry::new(storage.into(), "registry");
//!
//! let reference: RegistryReference = "registry.example.com/com-example/app:1.0".parse()?;
//! assert!(registry.get_manifest(&reference).await?.is_none());
//! # Ok(())
//! # }
//! ```

mod client;
mod digest;
mod error;
pub mod manifest;
mod reference;
mod storage;

pub use client::RegistryClient;
pub use digest::Digest;
pub use error::{RegistryError, RegistryResult};
pub use manifest::{Annotations, Descriptor, Manifest};
pub use reference::{is_valid_tag, RegistryReference};
pub use storage::StorageRegistry;
