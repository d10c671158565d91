use std::sync::atomic::{AtomicU64, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use tokio::io::AsyncWriteExt;

use storage_driver::{Driver, Metadata, Reader, StorageError, StorageErrorKind, Writer};

const ENGINE: &str = "local";

static PARTIAL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Storage driver that keeps objects as files under a root directory.
///
/// Each bucket is a directory below the root. Uploads are written to a sibling
/// partial file and renamed into place, so readers never observe a half-written object.
#[derive(Debug)]
pub struct LocalDriver {
    root: Utf8PathBuf,
}

impl LocalDriver {
    /// Create a driver rooted at `root`. The directory is created on first upload.
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// Directory holding the buckets.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn path(&self, bucket: &str, remote: &Utf8Path) -> Result<Utf8PathBuf, StorageError> {
        if remote.is_absolute()
            || remote
                .components()
                .any(|c| matches!(c, camino::Utf8Component::ParentDir))
        {
            return Err(StorageError::builder(
                ENGINE,
                StorageErrorKind::InvalidRequest,
                format!("path escapes the bucket: {remote}"),
            )
            .bucket(bucket)
            .path(remote.as_str())
            .build());
        }

        let mut path = self.root.join(bucket);
        path.push(remote);
        Ok(path)
    }

    fn error(bucket: &str, remote: &Utf8Path, context: &str, err: std::io::Error) -> StorageError {
        StorageError::builder(ENGINE, StorageErrorKind::from_io(&err), err)
            .bucket(bucket)
            .path(remote.as_str())
            .context(context)
            .build()
    }
}

#[async_trait::async_trait]
impl Driver for LocalDriver {
    fn name(&self) -> &'static str {
        ENGINE
    }

    async fn metadata(&self, bucket: &str, remote: &Utf8Path) -> Result<Metadata, StorageError> {
        let path = self.path(bucket, remote)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|err| Self::error(bucket, remote, "metadata", err))?;
        if !metadata.is_file() {
            return Err(Self::error(
                bucket,
                remote,
                "metadata",
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a file"),
            ));
        }

        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|err| Self::error(bucket, remote, "created timestamp", err))?;

        Ok(Metadata {
            size: metadata.len(),
            created: created.into(),
        })
    }

    async fn upload(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        local: &mut Reader<'_>,
    ) -> Result<(), StorageError> {
        let path = self.path(bucket, remote)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| Self::error(bucket, remote, "create parent directories", err))?;
        }

        let partial = Utf8PathBuf::from(format!(
            "{path}.partial-{}-{}",
            std::process::id(),
            PARTIAL_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let mut writer = tokio::io::BufWriter::new(
            tokio::fs::File::create(&partial)
                .await
                .map_err(|err| Self::error(bucket, remote, "create partial file", err))?,
        );

        let written = async {
            tokio::io::copy(local, &mut writer).await?;
            writer.shutdown().await?;
            tokio::fs::rename(&partial, &path).await
        }
        .await;

        if let Err(err) = written {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(Self::error(bucket, remote, "write file", err));
        }

        Ok(())
    }

    async fn download(
        &self,
        bucket: &str,
        remote: &Utf8Path,
        local: &mut Writer<'_>,
    ) -> Result<(), StorageError> {
        let path = self.path(bucket, remote)?;

        let mut reader = tokio::io::BufReader::new(
            tokio::fs::File::open(&path)
                .await
                .map_err(|err| Self::error(bucket, remote, "open file", err))?,
        );

        tokio::io::copy(&mut reader, local)
            .await
            .map_err(|err| Self::error(bucket, remote, "copy", err))?;

        local
            .flush()
            .await
            .map_err(|err| Self::error(bucket, remote, "flush writer", err))?;

        Ok(())
    }
}
