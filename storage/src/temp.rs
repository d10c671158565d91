use std::io;

use camino::Utf8Path;
use tempfile::TempDir;

use crate::local::LocalDriver;
use storage_driver::{Driver, Metadata, Reader, StorageError, Writer};

/// A storage driver that keeps objects in a temporary directory, removed on drop.
///
/// Used for throwaway registries in tests and for `StorageConfig::Temp`.
#[derive(Debug)]
pub struct TempDriver {
    dir: TempDir,
    driver: LocalDriver,
}

impl TempDriver {
    /// Create a new `TempDriver` instance, storing objects in a fresh temporary directory.
    pub fn new() -> io::Result<Self> {
        let tmp = TempDir::new()?;
        let root = Utf8Path::from_path(tmp.path())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "non UTF-8 temp dir"))?
            .to_owned();

        Ok(Self {
            dir: tmp,
            driver: LocalDriver::new(root),
        })
    }

    /// Directory holding the buckets.
    pub fn root(&self) -> &Utf8Path {
        self.driver.root()
    }

    /// Whether the directory is still present.
    pub fn is_present(&self) -> bool {
        self.dir.path().is_dir()
    }
}

#[async_trait::async_trait]
impl Driver for TempDriver {
    fn name(&self) -> &'static str {
        "temp"
    }

    async fn metadata(&self, bucket: &str, remote: &Utf8Path) -> Result<Metadata, StorageError> {
        self.driver.metadata(bucket, remote).await
    }

    async fn upload(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        local: &mut Reader<'_>,
    ) -> Result<(), StorageError> {
        self.driver.upload(bucket, remote, local).await
    }

    async fn download(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        local: &mut Writer<'_>,
    ) -> Result<(), StorageError> {
        self.driver.download(bucket, remote, local).await
    }
}
