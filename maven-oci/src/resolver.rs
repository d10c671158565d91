//! Pulling a published coordinate back into a Maven repository layout on disk.
//!
//! Resolution moves through [`ResolveState`] in order. Every blob is fetched and
//! verified before anything is written, and files are staged next to the destination
//! and renamed into place, so a failed resolution leaves no partial files behind.
//! Callers only learn whether resolution succeeded; the reason for a failure is logged.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;

use bytes::Bytes;
use camino::{Utf8Path, Utf8PathBuf};
use registry::{Descriptor, Digest, RegistryClient, RegistryError};

use crate::checksum::ChecksumAlgorithm;
use crate::config::RegistryConfig;
use crate::coordinate::MavenCoordinate;
use crate::error::BridgeError;
use crate::layout::{self, ArtifactRole};

/// Progress of a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    /// Nothing done yet.
    Start,
    /// The registry reference was computed.
    ReferenceBuilt,
    /// The manifest was fetched and every layer mapped to a file name.
    ManifestFetched,
    /// Every blob was fetched and verified.
    BlobsFetched,
    /// Files are in place in the destination.
    LayoutWritten,
    /// Resolution stopped. Terminal.
    Failed,
}

impl fmt::Display for ResolveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolveState::Start => "start",
            ResolveState::ReferenceBuilt => "reference-built",
            ResolveState::ManifestFetched => "manifest-fetched",
            ResolveState::BlobsFetched => "blobs-fetched",
            ResolveState::LayoutWritten => "layout-written",
            ResolveState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Progress {
    state: ResolveState,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: ResolveState::Start,
        }
    }

    fn advance(&mut self, next: ResolveState) {
        tracing::trace!(from = %self.state, to = %next, "Resolve state");
        self.state = next;
    }
}

#[derive(Debug, thiserror::Error)]
enum ResolveError {
    #[error(transparent)]
    Input(#[from] BridgeError),

    #[error("nothing is published at {0}")]
    NotPublished(String),

    #[error("manifest has no layers")]
    Empty,

    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("layer {digest} is not a Maven file: {reason}")]
    UnknownLayer { digest: Digest, reason: &'static str },

    #[error("refusing to write {0:?}")]
    UnsafeName(String),

    #[error("manifest lists {0} more than once")]
    DuplicateFile(String),

    #[error("{checksum} does not match {target}")]
    ChecksumMismatch { checksum: String, target: String },

    #[error("writing {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    fn code(&self) -> &'static str {
        match self {
            ResolveError::Input(_) => "INVALID_INPUT",
            ResolveError::NotPublished(_) => "MANIFEST_UNKNOWN",
            ResolveError::Registry(error) => error.error_code(),
            ResolveError::Empty | ResolveError::UnknownLayer { .. } => "MANIFEST_INVALID",
            ResolveError::UnsafeName(_) | ResolveError::DuplicateFile(_) => "NAME_INVALID",
            ResolveError::ChecksumMismatch { .. } => "DIGEST_INVALID",
            ResolveError::Io { .. } => "IO",
        }
    }

    fn io(path: &Utf8Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| ResolveError::Io {
            path: path.to_owned(),
            source,
        }
    }
}

/// A manifest layer and the file it becomes.
#[derive(Debug)]
struct PlannedFile<'m> {
    name: String,
    layer: &'m Descriptor,
    checksum: Option<(ChecksumAlgorithm, String)>,
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(&['/', '\\', '\0'][..])
}

/// Map a layer to the file name it takes in the Maven layout for `coordinate`.
fn plan_layer<'m>(
    coordinate: &MavenCoordinate,
    layer: &'m Descriptor,
) -> Result<PlannedFile<'m>, ResolveError> {
    let unknown = |reason| ResolveError::UnknownLayer {
        digest: layer.digest.clone(),
        reason,
    };

    let role = match layer.annotation(layout::ANNOTATION_ROLE) {
        Some(role) => role
            .parse::<ArtifactRole>()
            .map_err(|_| unknown("unknown role"))?,
        None => ArtifactRole::from_media_type(&layer.media_type)
            .ok_or_else(|| unknown("no role annotation and unrecognized media type"))?,
    };

    let extension = layer
        .annotation(layout::ANNOTATION_EXTENSION)
        .unwrap_or(match role {
            ArtifactRole::Descriptor => "pom",
            _ => layout::DEFAULT_EXTENSION,
        });

    let planned = if role == ArtifactRole::Checksum {
        let algorithm: ChecksumAlgorithm = layer
            .annotation(layout::ANNOTATION_CHECKSUM_ALGORITHM)
            .and_then(|algorithm| algorithm.parse().ok())
            .ok_or_else(|| unknown("checksum without a known algorithm"))?;
        let target_role: ArtifactRole = layer
            .annotation(layout::ANNOTATION_CHECKSUM_TARGET_ROLE)
            .and_then(|role| role.parse().ok())
            .filter(|role| *role != ArtifactRole::Checksum)
            .ok_or_else(|| unknown("checksum without a target"))?;

        let target = layout::file_name(coordinate, target_role, extension);
        PlannedFile {
            name: layout::checksum_file_name(&target, algorithm),
            layer,
            checksum: Some((algorithm, target)),
        }
    } else {
        PlannedFile {
            name: layout::file_name(coordinate, role, extension),
            layer,
            checksum: None,
        }
    };

    if !is_safe_file_name(&planned.name) {
        return Err(ResolveError::UnsafeName(planned.name));
    }
    Ok(planned)
}

/// Fetches published coordinates through a [`RegistryClient`].
#[derive(Debug, Clone)]
pub struct Resolver<C> {
    client: C,
}

impl<C> Resolver<C>
where
    C: RegistryClient,
{
    /// Resolve through `client`.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Whether a manifest is tagged for `coordinate` in the registry at `config`.
    ///
    /// Any failure, including an invalid coordinate or URL, counts as absent.
    #[tracing::instrument(skip_all, fields(coordinate = %coordinate, registry = %config.url))]
    pub async fn exists(&self, coordinate: &MavenCoordinate, config: &RegistryConfig) -> bool {
        let reference = match config.reference(coordinate) {
            Ok(reference) => reference,
            Err(error) => {
                tracing::warn!(%error, "Cannot build reference");
                return false;
            }
        };

        match self.client.get_manifest(&reference).await {
            Ok(Some(_)) => true,
            Ok(None) => {
                tracing::debug!(%reference, "Not published");
                false
            }
            Err(error) => {
                tracing::warn!(%reference, code = error.error_code(), %error, "Manifest lookup failed");
                false
            }
        }
    }

    /// Fetch every file published for `coordinate` into `destination`.
    ///
    /// Returns `true` once every file is in place under its Maven-layout name, replacing
    /// files of the same name. On `false`, `destination` is left as it was.
    #[tracing::instrument(skip_all, fields(coordinate = %coordinate, registry = %config.url, %destination))]
    pub async fn resolve(
        &self,
        coordinate: &MavenCoordinate,
        config: &RegistryConfig,
        destination: &Utf8Path,
    ) -> bool {
        let mut progress = Progress::new();
        match self
            .try_resolve(coordinate, config, destination, &mut progress)
            .await
        {
            Ok(files) => {
                tracing::info!(files, "Resolved");
                true
            }
            Err(error) => {
                tracing::warn!(after = %progress.state, code = error.code(), %error, "Resolution failed");
                progress.advance(ResolveState::Failed);
                false
            }
        }
    }

    async fn try_resolve(
        &self,
        coordinate: &MavenCoordinate,
        config: &RegistryConfig,
        destination: &Utf8Path,
        progress: &mut Progress,
    ) -> Result<usize, ResolveError> {
        let reference = config.reference(coordinate)?;
        progress.advance(ResolveState::ReferenceBuilt);

        let manifest = self
            .client
            .get_manifest(&reference)
            .await?
            .ok_or_else(|| ResolveError::NotPublished(reference.to_string()))?;
        if manifest.layers.is_empty() {
            return Err(ResolveError::Empty);
        }

        let mut names = HashSet::new();
        let mut plan = Vec::with_capacity(manifest.layers.len());
        for layer in &manifest.layers {
            let planned = plan_layer(coordinate, layer)?;
            if !names.insert(planned.name.clone()) {
                return Err(ResolveError::DuplicateFile(planned.name));
            }
            plan.push(planned);
        }
        progress.advance(ResolveState::ManifestFetched);

        let mut fetched = Vec::with_capacity(plan.len());
        for planned in plan {
            let data = self.client.get_blob(&reference, &planned.layer.digest).await?;
            planned.layer.digest.verify(&data)?;
            tracing::debug!(name = %planned.name, size = data.len(), "Fetched blob");
            fetched.push((planned, data));
        }
        verify_checksums(&fetched)?;
        progress.advance(ResolveState::BlobsFetched);

        write_layout(destination, &fetched).await?;
        progress.advance(ResolveState::LayoutWritten);

        Ok(fetched.len())
    }
}

/// Check every checksum file against the file it covers, when that file was fetched too.
fn verify_checksums(files: &[(PlannedFile<'_>, Bytes)]) -> Result<(), ResolveError> {
    let by_name: HashMap<&str, &Bytes> = files
        .iter()
        .map(|(planned, data)| (planned.name.as_str(), data))
        .collect();

    for (planned, data) in files {
        let Some((algorithm, target)) = &planned.checksum else {
            continue;
        };
        let Some(target_data) = by_name.get(target.as_str()) else {
            tracing::debug!(checksum = %planned.name, %target, "Checksum target not published");
            continue;
        };
        if !algorithm.matches(data, target_data) {
            return Err(ResolveError::ChecksumMismatch {
                checksum: planned.name.clone(),
                target: target.clone(),
            });
        }
    }
    Ok(())
}

/// Write `files` into `destination`, all or nothing.
///
/// A failure leaves `destination` as it was: replaced files are restored, and the
/// directory itself is removed again if this call created it.
async fn write_layout(
    destination: &Utf8Path,
    files: &[(PlannedFile<'_>, Bytes)],
) -> Result<(), ResolveError> {
    let created = match tokio::fs::metadata(destination).await {
        Ok(_) => false,
        Err(error) if error.kind() == io::ErrorKind::NotFound => true,
        Err(error) => return Err(ResolveError::io(destination)(error)),
    };
    tokio::fs::create_dir_all(destination)
        .await
        .map_err(ResolveError::io(destination))?;

    let result = replace_files(destination, files).await;
    if result.is_err() && created {
        if let Err(error) = tokio::fs::remove_dir_all(destination).await {
            tracing::warn!(%destination, %error, "Could not remove destination");
        }
    }
    result
}

/// A file moved into the destination, and where the file it replaced was put.
#[derive(Debug)]
struct Replaced {
    target: Utf8PathBuf,
    previous: Option<Utf8PathBuf>,
}

async fn replace_files(
    destination: &Utf8Path,
    files: &[(PlannedFile<'_>, Bytes)],
) -> Result<(), ResolveError> {
    let staging = tempfile::Builder::new()
        .prefix(".maven-oci-")
        .tempdir_in(destination)
        .map_err(ResolveError::io(destination))?;
    let staging_path = Utf8PathBuf::try_from(staging.path().to_path_buf())
        .map_err(|err| ResolveError::io(destination)(err.into_io_error()))?;

    for (index, (_, data)) in files.iter().enumerate() {
        let path = staging_path.join(index.to_string());
        tokio::fs::write(&path, data)
            .await
            .map_err(ResolveError::io(&path))?;
    }

    let mut replaced: Vec<Replaced> = Vec::with_capacity(files.len());
    for (index, (planned, _)) in files.iter().enumerate() {
        let staged = staging_path.join(index.to_string());
        let previous = staging_path.join(format!("{index}.previous"));
        match swap_in(&staged, &destination.join(&planned.name), &previous).await {
            Ok(swapped) => replaced.push(swapped),
            Err(error) => {
                roll_back(&replaced).await;
                return Err(error);
            }
        }
    }

    Ok(())
}

/// Move `staged` to `target`, first moving any existing `target` to `previous`.
async fn swap_in(
    staged: &Utf8Path,
    target: &Utf8Path,
    previous: &Utf8Path,
) -> Result<Replaced, ResolveError> {
    let previous = match tokio::fs::rename(target, previous).await {
        Ok(()) => Some(previous.to_owned()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => None,
        Err(error) => return Err(ResolveError::io(target)(error)),
    };

    let replaced = Replaced {
        target: target.to_owned(),
        previous,
    };
    if let Err(error) = tokio::fs::rename(staged, target).await {
        roll_back(std::slice::from_ref(&replaced)).await;
        return Err(ResolveError::io(target)(error));
    }
    Ok(replaced)
}

/// Undo `replaced`, latest first.
async fn roll_back(replaced: &[Replaced]) {
    for Replaced { target, previous } in replaced.iter().rev() {
        let restored = match previous {
            Some(previous) => tokio::fs::rename(previous, target).await,
            None => match tokio::fs::remove_file(target).await {
                Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(error) = restored {
            tracing::warn!(%target, %error, "Could not roll back resolved file");
        }
    }
}
