use std::{fmt, ops::Deref, sync::Arc};

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use tokio::io;

use crate::error::StorageError;

/// A reader stream for object contents.
pub type Reader<'r> = dyn io::AsyncBufRead + Unpin + Send + Sync + 'r;

/// A writer stream for object contents.
pub type Writer<'w> = dyn io::AsyncWrite + Unpin + Send + Sync + 'w;

/// Object metadata, which will be generically provided by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Metadata {
    /// The size of the object in bytes.
    pub size: u64,

    /// The creation timestamp of the object.
    pub created: DateTime<Utc>,
}

/// A storage driver, which provides content-addressed registries with a place to keep
/// blobs, manifests and tag pointers.
///
/// Objects are addressed by a bucket name and a relative path within that bucket.
#[async_trait::async_trait]
pub trait Driver: fmt::Debug {
    /// The name of the driver, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Get the metadata for an object, by path.
    async fn metadata(&self, bucket: &str, remote: &Utf8Path) -> Result<Metadata, StorageError>;

    /// Upload an object, using a reader stream to provide the contents.
    ///
    /// Uploading to an existing path replaces the object.
    async fn upload(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        reader: &mut Reader<'_>,
    ) -> Result<(), StorageError>;

    /// Download an object into a writer stream.
    async fn download(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        writer: &mut Writer<'_>,
    ) -> Result<(), StorageError>;

    /// Check whether an object exists.
    ///
    /// A [`crate::StorageErrorKind::NotFound`] from [`Driver::metadata`] maps to `false`,
    /// every other error is returned.
    async fn exists(&self, bucket: &str, remote: &Utf8Path) -> Result<bool, StorageError> {
        match self.metadata(bucket, remote).await {
            Ok(_) => Ok(true),
            Err(error) if error.is_not_found() => Ok(false),
            Err(error) => Err(error),
        }
    }
}

#[async_trait::async_trait]
impl<D> Driver for Arc<D>
where
    D: ?Sized + Driver + Sync + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.deref().name()
    }

    async fn metadata(&self, bucket: &str, remote: &Utf8Path) -> Result<Metadata, StorageError> {
        self.deref().metadata(bucket, remote).await
    }

    async fn upload(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        reader: &mut Reader<'_>,
    ) -> Result<(), StorageError> {
        self.deref().upload(bucket, remote, reader).await
    }

    async fn download(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        writer: &mut Writer<'_>,
    ) -> Result<(), StorageError> {
        self.deref().download(bucket, remote, writer).await
    }

    async fn exists(&self, bucket: &str, remote: &Utf8Path) -> Result<bool, StorageError> {
        self.deref().exists(bucket, remote).await
    }
}
