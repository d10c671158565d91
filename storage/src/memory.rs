use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use tokio::{io::AsyncWriteExt, sync::RwLock};

use storage_driver::{Driver, Metadata, Reader, StorageError, StorageErrorKind, Writer};

const ENGINE: &str = "memory";

fn missing_bucket(bucket: &str) -> StorageError {
    StorageError::builder(
        ENGINE,
        StorageErrorKind::NotFound,
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Bucket not found: {bucket}"),
        ),
    )
    .bucket(bucket)
    .context("bucket not found")
    .build()
}

fn missing_path(bucket: &str, remote: &Utf8Path) -> StorageError {
    StorageError::builder(
        ENGINE,
        StorageErrorKind::NotFound,
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Path not found: {remote}"),
        ),
    )
    .bucket(bucket)
    .path(remote.as_str())
    .context("path not found")
    .build()
}

#[derive(Debug)]
struct MemoryFileItem {
    created: DateTime<Utc>,
    data: Vec<u8>,
}

impl AsRef<[u8]> for MemoryFileItem {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for MemoryFileItem {
    fn from(data: Vec<u8>) -> Self {
        Self {
            created: Utc::now(),
            data,
        }
    }
}

impl From<&MemoryFileItem> for Metadata {
    fn from(value: &MemoryFileItem) -> Self {
        Self {
            created: value.created,
            size: value.data.len() as u64,
        }
    }
}

/// Storage driver that keeps objects in memory.
///
/// Used as the in-process registry backend in tests and for throwaway registries.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    buckets: RwLock<HashMap<String, HashMap<Utf8PathBuf, MemoryFileItem>>>,
}

impl MemoryStorage {
    /// Create a new `MemoryStorage` instance, with no buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new `MemoryStorage` instance, with the given buckets.
    pub fn with_buckets(buckets: &[&str]) -> Self {
        let map = buckets
            .iter()
            .map(|bucket| (bucket.to_string(), HashMap::new()))
            .collect();

        Self {
            buckets: RwLock::new(map),
        }
    }

    /// Create a new bucket in the storage.
    pub async fn create_bucket(&self, bucket: String) {
        let mut buckets = self.buckets.write().await;
        buckets.entry(bucket).or_default();
    }
}

#[async_trait::async_trait]
impl Driver for MemoryStorage {
    fn name(&self) -> &'static str {
        ENGINE
    }

    async fn metadata(&self, bucket: &str, remote: &Utf8Path) -> Result<Metadata, StorageError> {
        let buckets = self.buckets.read().await;
        let bucket_map = buckets.get(bucket).ok_or_else(|| missing_bucket(bucket))?;
        Ok(bucket_map
            .get(remote)
            .ok_or_else(|| missing_path(bucket, remote))?
            .into())
    }

    async fn upload(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        local: &mut Reader<'_>,
    ) -> Result<(), StorageError> {
        let mut buf = Vec::new();

        tokio::io::copy(local, &mut buf)
            .await
            .map_err(|err| StorageError::io(ENGINE, err))?;

        let mut buckets = self.buckets.write().await;
        let bucket_map = buckets.entry(bucket.to_string()).or_default();
        bucket_map.insert(remote.to_owned(), buf.into());

        Ok(())
    }

    async fn download(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        local: &mut Writer<'_>,
    ) -> Result<(), StorageError> {
        let buckets = self.buckets.read().await;
        let bucket_map = buckets.get(bucket).ok_or_else(|| missing_bucket(bucket))?;
        let mut buf = bucket_map
            .get(remote)
            .ok_or_else(|| missing_path(bucket, remote))?
            .as_ref();

        tokio::io::copy(&mut buf, local)
            .await
            .map_err(|err| StorageError::io(ENGINE, err))?;

        local
            .flush()
            .await
            .map_err(|err| StorageError::io(ENGINE, err))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_bucket_is_not_found() {
        let storage = MemoryStorage::new();
        let err = storage
            .metadata("nope", Utf8Path::new("a"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.bucket(), Some("nope"));
    }
}
