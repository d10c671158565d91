//! Turning local artifact files into the ordered list of blobs pushed for a coordinate.

use std::collections::HashSet;

use bytes::Bytes;
use camino::{Utf8Path, Utf8PathBuf};

use crate::checksum::{ChecksumAlgorithm, SIDE_FILE_EXTENSIONS};
use crate::coordinate::MavenCoordinate;
use crate::error::{BridgeError, BridgeResult};
use crate::layout::{self, ArtifactRole};

/// Where the bytes of an [`ArtifactFile`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Read from a local file.
    File(Utf8PathBuf),

    /// Computed over another file of the bundle.
    Checksum {
        /// Digest algorithm.
        algorithm: ChecksumAlgorithm,
        /// Maven-layout name of the file the checksum covers.
        target: String,
        /// Role of the file the checksum covers.
        target_role: ArtifactRole,
    },
}

/// One blob of a publication, named as it appears in a Maven repository.
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    name: String,
    media_type: &'static str,
    role: ArtifactRole,
    extension: String,
    source: ArtifactSource,
    data: Bytes,
}

impl ArtifactFile {
    /// Maven-layout file name, e.g. `my-artifact-1.0.0.jar`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Media type of the blob.
    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    /// Role of the file within the publication.
    pub fn role(&self) -> ArtifactRole {
        self.role
    }

    /// Extension of the file, or of the covered file for checksums.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Origin of the content.
    pub fn source(&self) -> &ArtifactSource {
        &self.source
    }

    /// Blob content.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size of the blob in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// The files published for one coordinate, in push order.
///
/// Every input file is followed by its `.sha1` and `.md5` side-files.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    coordinate: MavenCoordinate,
    files: Vec<ArtifactFile>,
}

impl ArtifactBundle {
    /// A bundle with no files.
    pub fn new(coordinate: MavenCoordinate) -> Self {
        Self {
            coordinate,
            files: Vec::new(),
        }
    }

    /// The coordinate the file names were derived from.
    pub fn coordinate(&self) -> &MavenCoordinate {
        &self.coordinate
    }

    /// Files in push order.
    pub fn files(&self) -> &[ArtifactFile] {
        &self.files
    }

    /// Iterate over files in push order.
    pub fn iter(&self) -> std::slice::Iter<'_, ArtifactFile> {
        self.files.iter()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the bundle has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all blobs, in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(ArtifactFile::size).sum()
    }

    /// Look up a file by its Maven-layout name.
    pub fn get(&self, name: &str) -> Option<&ArtifactFile> {
        self.files.iter().find(|file| file.name == name)
    }
}

impl<'a> IntoIterator for &'a ArtifactBundle {
    type Item = &'a ArtifactFile;
    type IntoIter = std::slice::Iter<'a, ArtifactFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read `files` and bundle them, with generated checksums, for `coordinate`.
///
/// Each file is renamed to its Maven-layout name (`{artifactId}-{version}` plus the suffix
/// implied by its role) and followed by one side-file per [`ChecksumAlgorithm`].
/// Inputs that are themselves checksum or signature side-files are skipped since the
/// bundle generates its own. Two inputs that map to the same layout name are rejected,
/// and so is a list with nothing left to publish.
#[tracing::instrument(skip_all, fields(coordinate = %coordinate, inputs = files.len()))]
pub async fn bundle<P>(files: &[P], coordinate: &MavenCoordinate) -> BridgeResult<ArtifactBundle>
where
    P: AsRef<Utf8Path>,
{
    if files.is_empty() {
        return Err(BridgeError::EmptyBundle);
    }

    let mut bundle = ArtifactBundle::new(coordinate.clone());
    let mut names = HashSet::new();

    for path in files {
        let path = path.as_ref();
        let original = path
            .file_name()
            .ok_or_else(|| BridgeError::invalid(format!("{path} does not name a file")))?;

        let extension = layout::extension_of(original).to_ascii_lowercase();
        if SIDE_FILE_EXTENSIONS.contains(&extension.as_str()) {
            tracing::warn!(%path, "Skipping side-file input, checksums are generated");
            continue;
        }

        let role = ArtifactRole::from_file_name(original);
        let name = layout::file_name(coordinate, role, &extension);
        if !names.insert(name.clone()) {
            return Err(BridgeError::invalid(format!(
                "{path} maps to {name}, which another input already uses"
            )));
        }

        let data = tokio::fs::read(path).await.map_err(|source| BridgeError::Io {
            path: path.to_owned(),
            source,
        })?;
        let data = Bytes::from(data);

        tracing::debug!(%path, %name, %role, size = data.len(), "Bundling artifact");

        let checksums: Vec<ArtifactFile> = ChecksumAlgorithm::ALL
            .iter()
            .map(|algorithm| ArtifactFile {
                name: layout::checksum_file_name(&name, *algorithm),
                media_type: layout::MEDIA_TYPE_CHECKSUM,
                role: ArtifactRole::Checksum,
                extension: extension.clone(),
                source: ArtifactSource::Checksum {
                    algorithm: *algorithm,
                    target: name.clone(),
                    target_role: role,
                },
                data: Bytes::from(algorithm.hex_digest(&data)),
            })
            .collect();

        bundle.files.push(ArtifactFile {
            media_type: layout::media_type_for(&name),
            name,
            role,
            extension,
            source: ArtifactSource::File(path.to_owned()),
            data,
        });
        bundle.files.extend(checksums);
    }

    if bundle.is_empty() {
        return Err(BridgeError::EmptyBundle);
    }

    tracing::debug!(files = bundle.len(), size = bundle.total_size(), "Bundled");
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inputs {
        dir: tempfile::TempDir,
    }

    impl Inputs {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn write(&self, name: &str, content: &[u8]) -> Utf8PathBuf {
            let path = Utf8Path::from_path(self.dir.path()).unwrap().join(name);
            std::fs::write(&path, content).unwrap();
            path
        }
    }

    fn coordinate() -> MavenCoordinate {
        MavenCoordinate::new("com.example", "my-artifact", "1.0.0").unwrap()
    }

    #[tokio::test]
    async fn jar_and_pom() {
        let inputs = Inputs::new();
        let jar = inputs.write("build-output.jar", b"jar bytes");
        let pom = inputs.write("pom.pom", b"<project/>");

        let bundle = bundle(&[jar.clone(), pom], &coordinate()).await.unwrap();

        let names: Vec<&str> = bundle.iter().map(ArtifactFile::name).collect();
        assert_eq!(
            names,
            [
                "my-artifact-1.0.0.jar",
                "my-artifact-1.0.0.jar.sha1",
                "my-artifact-1.0.0.jar.md5",
                "my-artifact-1.0.0.pom",
                "my-artifact-1.0.0.pom.sha1",
                "my-artifact-1.0.0.pom.md5",
            ]
        );

        let primary = &bundle.files()[0];
        assert_eq!(primary.role(), ArtifactRole::Primary);
        assert_eq!(primary.media_type(), layout::MEDIA_TYPE_JAVA_ARCHIVE);
        assert_eq!(primary.source(), &ArtifactSource::File(jar));
        assert_eq!(primary.data().as_ref(), b"jar bytes");

        let sha1 = &bundle.files()[1];
        assert_eq!(sha1.role(), ArtifactRole::Checksum);
        assert_eq!(sha1.media_type(), layout::MEDIA_TYPE_CHECKSUM);
        assert_eq!(
            sha1.data().as_ref(),
            ChecksumAlgorithm::Sha1.hex_digest(b"jar bytes").as_bytes()
        );
        assert_eq!(
            sha1.source(),
            &ArtifactSource::Checksum {
                algorithm: ChecksumAlgorithm::Sha1,
                target: "my-artifact-1.0.0.jar".into(),
                target_role: ArtifactRole::Primary,
            }
        );

        let md5 = bundle.get("my-artifact-1.0.0.jar.md5").unwrap();
        assert_eq!(
            md5.data().as_ref(),
            ChecksumAlgorithm::Md5.hex_digest(b"jar bytes").as_bytes()
        );

        let pom = bundle.get("my-artifact-1.0.0.pom").unwrap();
        assert_eq!(pom.role(), ArtifactRole::Descriptor);
        assert_eq!(pom.media_type(), layout::MEDIA_TYPE_XML);
    }

    #[tokio::test]
    async fn every_file_gets_two_checksums() {
        let inputs = Inputs::new();
        let files = [
            inputs.write("lib.jar", b"1"),
            inputs.write("lib-sources.jar", b"2"),
            inputs.write("lib-javadoc.jar", b"3"),
            inputs.write("lib.pom", b"4"),
            inputs.write("lib.module", b"5"),
        ];

        let bundle = bundle(&files, &coordinate()).await.unwrap();
        assert_eq!(bundle.len(), 3 * files.len());
        assert_eq!(
            bundle.iter().filter(|f| f.role() == ArtifactRole::Checksum).count(),
            2 * files.len()
        );

        let names: HashSet<&str> = bundle.iter().map(ArtifactFile::name).collect();
        assert_eq!(names.len(), bundle.len());
        for name in [
            "my-artifact-1.0.0-sources.jar",
            "my-artifact-1.0.0-javadoc.jar",
            "my-artifact-1.0.0.module",
            "my-artifact-1.0.0.module.sha1",
        ] {
            assert!(names.contains(name), "{name}");
        }
    }

    #[tokio::test]
    async fn side_files_are_skipped() {
        let inputs = Inputs::new();
        let files = [
            inputs.write("lib.jar", b"jar"),
            inputs.write("lib.jar.sha1", b"stale"),
            inputs.write("lib.jar.asc", b"signature"),
        ];

        let bundle = bundle(&files, &coordinate()).await.unwrap();
        assert_eq!(bundle.len(), 3);
        assert_eq!(
            bundle.get("my-artifact-1.0.0.jar.sha1").unwrap().data().as_ref(),
            ChecksumAlgorithm::Sha1.hex_digest(b"jar").as_bytes()
        );
    }

    #[tokio::test]
    async fn colliding_inputs_are_rejected() {
        let inputs = Inputs::new();
        let files = [inputs.write("a.jar", b"a"), inputs.write("b.jar", b"b")];

        let err = bundle(&files, &coordinate()).await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidInput(_)), "{err}");
    }

    #[tokio::test]
    async fn missing_file() {
        let inputs = Inputs::new();
        let missing = Utf8Path::from_path(inputs.dir.path()).unwrap().join("missing.jar");

        let err = bundle(&[missing.clone()], &coordinate()).await.unwrap_err();
        match err {
            BridgeError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn no_inputs() {
        let files: [Utf8PathBuf; 0] = [];
        let err = bundle(&files, &coordinate()).await.unwrap_err();
        assert!(matches!(err, BridgeError::EmptyBundle));
    }

    #[tokio::test]
    async fn only_side_files() {
        let inputs = Inputs::new();
        let files = [inputs.write("lib.jar.md5", b"stale")];
        let err = bundle(&files, &coordinate()).await.unwrap_err();
        assert!(matches!(err, BridgeError::EmptyBundle));
    }
}
