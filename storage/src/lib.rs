//! # Storage backends
//!
//! Configuration and unification for the backends that hold registry blobs,
//! manifests and tags.

use std::sync::Arc;

use camino::Utf8Path;
#[cfg(feature = "local")]
use camino::Utf8PathBuf;
use serde::Deserialize;
use tokio::io;

#[cfg(feature = "local")]
pub(crate) mod local;

pub(crate) mod memory;
#[cfg(feature = "tmp")]
pub(crate) mod temp;

#[cfg(feature = "local")]
#[doc(inline)]
pub use local::LocalDriver;

#[doc(inline)]
pub use memory::MemoryStorage;

#[cfg(feature = "tmp")]
#[doc(inline)]
pub use temp::TempDriver;

#[doc(inline)]
pub use storage_driver::{Driver, Metadata, StorageError, StorageErrorKind};

/// Declarative choice of storage backend, as read from a configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StorageConfig {
    /// Keep everything in memory, with a single pre-created bucket.
    Memory {
        /// Bucket to create.
        bucket: String,
    },

    /// Keep objects on the local filesystem, under `path`.
    #[cfg(feature = "local")]
    Local {
        /// Root directory of the store.
        path: Utf8PathBuf,
    },

    /// Keep objects in a temporary directory removed when the storage is dropped.
    #[cfg(feature = "tmp")]
    Temp,
}

impl StorageConfig {
    /// Construct the configured backend.
    #[tracing::instrument]
    pub async fn build(self) -> Result<Storage, StorageError> {
        let client: Storage = match self {
            StorageConfig::Memory { bucket } => MemoryStorage::with_buckets(&[&bucket]).into(),
            #[cfg(feature = "local")]
            StorageConfig::Local { path } => LocalDriver::new(path).into(),
            #[cfg(feature = "tmp")]
            StorageConfig::Temp => TempDriver::new()
                .map_err(|err| StorageError::io("temp", err))?
                .into(),
        };
        Ok(client)
    }
}

pub(crate) type ArcDriver = Arc<dyn Driver + Send + Sync>;

/// Cheaply cloneable handle to a storage driver.
#[derive(Debug, Clone)]
pub struct Storage {
    driver: ArcDriver,
}

impl<D> From<D> for Storage
where
    D: Driver + Send + Sync + 'static,
{
    fn from(value: D) -> Self {
        Storage::new(value)
    }
}

impl Storage {
    /// Wrap a driver.
    pub fn new<D: Driver + Send + Sync + 'static>(driver: D) -> Self {
        Self {
            driver: Arc::new(driver),
        }
    }

    /// Name of the underlying driver.
    pub fn name(&self) -> &str {
        self.driver.name()
    }

    /// Get object metadata.
    #[tracing::instrument(skip(self), fields(driver=self.driver.name()))]
    pub async fn metadata(
        &self,
        bucket: &str,
        remote: &Utf8Path,
    ) -> Result<Metadata, StorageError> {
        self.driver.metadata(bucket, remote).await
    }

    /// Check whether an object exists.
    #[tracing::instrument(skip(self), fields(driver=self.driver.name()))]
    pub async fn exists(&self, bucket: &str, remote: &Utf8Path) -> Result<bool, StorageError> {
        self.driver.exists(bucket, remote).await
    }

    /// Stream an object into `writer`.
    #[tracing::instrument(skip(self, writer), fields(driver=self.driver.name()))]
    pub async fn download<'d, W>(
        &'d self,
        bucket: &str,
        remote: &Utf8Path,
        writer: &mut W,
    ) -> Result<(), StorageError>
    where
        W: io::AsyncWrite + Unpin + Send + Sync + 'd,
    {
        tracing::trace!(%remote, "Downloading from: {bucket}/{remote}");
        self.driver.download(bucket, remote, writer).await?;
        Ok(())
    }

    /// Stream `reader` into an object, replacing any previous content.
    #[tracing::instrument(skip(self, reader), fields(driver=self.driver.name()))]
    pub async fn upload<'d, R>(
        &'d self,
        bucket: &str,
        remote: &Utf8Path,
        reader: &mut R,
    ) -> Result<(), StorageError>
    where
        R: io::AsyncBufRead + Unpin + Send + Sync + 'd,
    {
        tracing::trace!(%remote, "Uploading to: {bucket}/{remote}");
        self.driver.upload(bucket, remote, reader).await?;
        Ok(())
    }

    /// Read a whole object into memory.
    pub async fn get(&self, bucket: &str, remote: &Utf8Path) -> Result<Vec<u8>, StorageError> {
        let mut data = Vec::new();
        self.download(bucket, remote, &mut data).await?;
        Ok(data)
    }

    /// Write a whole object from memory.
    pub async fn put(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let mut reader = io::BufReader::new(data);
        self.upload(bucket, remote, &mut reader).await
    }
}
