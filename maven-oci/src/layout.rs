//! Maven repository layout: artifact roles, file names, media types and the
//! annotations that carry them through a registry manifest.

use std::fmt;
use std::str::FromStr;

use crate::coordinate::MavenCoordinate;
use crate::error::BridgeError;

/// `artifactType` of every manifest published by this crate.
pub const ARTIFACT_TYPE: &str = "application/vnd.maven.artifact.v1";

/// Manifest annotation: the Maven group id, as given.
pub const ANNOTATION_GROUP_ID: &str = "maven.group-id";
/// Manifest annotation: the Maven artifact id.
pub const ANNOTATION_ARTIFACT_ID: &str = "maven.artifact-id";
/// Manifest annotation: the Maven version.
pub const ANNOTATION_MAVEN_VERSION: &str = "maven.version";
/// Manifest annotation: the registry reference the manifest was published under.
pub const ANNOTATION_REFERENCE: &str = "maven.reference";

/// Layer annotation: the [`ArtifactRole`] of the layer.
pub const ANNOTATION_ROLE: &str = "maven.role";
/// Layer annotation: extension of the artifact (of the checksummed artifact, for checksums).
pub const ANNOTATION_EXTENSION: &str = "maven.extension";
/// Layer annotation: algorithm of a checksum layer.
pub const ANNOTATION_CHECKSUM_ALGORITHM: &str = "maven.checksum.algorithm";
/// Layer annotation: role of the artifact a checksum layer covers.
pub const ANNOTATION_CHECKSUM_TARGET_ROLE: &str = "maven.checksum.target-role";

/// Media type of jar-like archives.
pub const MEDIA_TYPE_JAVA_ARCHIVE: &str = "application/java-archive";
/// Media type of POMs and other XML.
pub const MEDIA_TYPE_XML: &str = "application/xml";
/// Media type of Gradle module metadata and other JSON.
pub const MEDIA_TYPE_JSON: &str = "application/json";
/// Media type of compressed tarballs.
pub const MEDIA_TYPE_GZIP: &str = "application/gzip";
/// Media type of checksum side-files.
pub const MEDIA_TYPE_CHECKSUM: &str = "text/plain";
/// Media type of anything else.
pub const MEDIA_TYPE_OCTET_STREAM: &str = "application/octet-stream";

const SOURCES_SUFFIX: &str = "-sources.jar";
const JAVADOC_SUFFIX: &str = "-javadoc.jar";
/// Extension assumed for primary artifacts whose manifest does not record one.
pub(crate) const DEFAULT_EXTENSION: &str = "jar";

/// What a file is within a Maven publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactRole {
    /// The main artifact, usually a jar.
    Primary,
    /// `-sources.jar`
    Sources,
    /// `-javadoc.jar`
    Javadoc,
    /// The `.pom`
    Descriptor,
    /// A generated `.sha1` or `.md5` side-file.
    Checksum,
}

impl ArtifactRole {
    /// Name used in layer annotations.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactRole::Primary => "primary",
            ArtifactRole::Sources => "sources",
            ArtifactRole::Javadoc => "javadoc",
            ArtifactRole::Descriptor => "descriptor",
            ArtifactRole::Checksum => "checksum",
        }
    }

    /// Infer the role of an input file from its name.
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(SOURCES_SUFFIX) {
            ArtifactRole::Sources
        } else if lower.ends_with(JAVADOC_SUFFIX) {
            ArtifactRole::Javadoc
        } else if lower.ends_with(".pom") || lower == "pom.xml" {
            ArtifactRole::Descriptor
        } else {
            ArtifactRole::Primary
        }
    }

    /// Infer the role of a layer from its media type, for manifests without role annotations.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            MEDIA_TYPE_JAVA_ARCHIVE => Some(ArtifactRole::Primary),
            MEDIA_TYPE_XML => Some(ArtifactRole::Descriptor),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactRole {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(ArtifactRole::Primary),
            "sources" => Ok(ArtifactRole::Sources),
            "javadoc" => Ok(ArtifactRole::Javadoc),
            "descriptor" => Ok(ArtifactRole::Descriptor),
            "checksum" => Ok(ArtifactRole::Checksum),
            other => Err(BridgeError::invalid(format!("unknown artifact role {other:?}"))),
        }
    }
}

/// Extension of a file name, treating `.tar.gz` as a single extension.
///
/// Names without a dot have no extension.
pub fn extension_of(name: &str) -> &str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".tar.gz") && name.len() > ".tar.gz".len() {
        return &name[name.len() - "tar.gz".len()..];
    }
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => extension,
        _ => "",
    }
}

/// Media type for a file name.
pub fn media_type_for(name: &str) -> &'static str {
    match extension_of(name).to_ascii_lowercase().as_str() {
        "jar" | "war" | "ear" | "aar" => MEDIA_TYPE_JAVA_ARCHIVE,
        "pom" | "xml" => MEDIA_TYPE_XML,
        "json" | "module" => MEDIA_TYPE_JSON,
        "tar" | "tar.gz" | "tgz" => MEDIA_TYPE_GZIP,
        _ => MEDIA_TYPE_OCTET_STREAM,
    }
}

/// Maven-layout file name of an artifact with `role` and `extension` for `coordinate`.
///
/// Checksums are named after the artifact they cover, see [`checksum_file_name`].
pub fn file_name(coordinate: &MavenCoordinate, role: ArtifactRole, extension: &str) -> String {
    let stem = coordinate.file_stem();
    match role {
        ArtifactRole::Sources => format!("{stem}{SOURCES_SUFFIX}"),
        ArtifactRole::Javadoc => format!("{stem}{JAVADOC_SUFFIX}"),
        ArtifactRole::Descriptor => format!("{stem}.pom"),
        ArtifactRole::Primary | ArtifactRole::Checksum if extension.is_empty() => stem,
        ArtifactRole::Primary | ArtifactRole::Checksum => format!("{stem}.{extension}"),
    }
}

/// Name of the checksum side-file of `target`.
pub fn checksum_file_name(target: &str, algorithm: crate::ChecksumAlgorithm) -> String {
    format!("{target}.{}", algorithm.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChecksumAlgorithm;

    fn coordinate() -> MavenCoordinate {
        MavenCoordinate::new("com.example", "my-artifact", "1.0.0").unwrap()
    }

    #[test]
    fn roles_from_names() {
        assert_eq!(
            ArtifactRole::from_file_name("lib.jar"),
            ArtifactRole::Primary
        );
        assert_eq!(
            ArtifactRole::from_file_name("lib-sources.jar"),
            ArtifactRole::Sources
        );
        assert_eq!(
            ArtifactRole::from_file_name("lib-javadoc.jar"),
            ArtifactRole::Javadoc
        );
        assert_eq!(
            ArtifactRole::from_file_name("lib.pom"),
            ArtifactRole::Descriptor
        );
        assert_eq!(
            ArtifactRole::from_file_name("LIB.POM"),
            ArtifactRole::Descriptor
        );
        assert_eq!(
            ArtifactRole::from_file_name("pom.xml"),
            ArtifactRole::Descriptor
        );
        assert_eq!(
            ArtifactRole::from_file_name("settings.xml"),
            ArtifactRole::Primary
        );
        assert_eq!(
            ArtifactRole::from_file_name("lib-sources.zip"),
            ArtifactRole::Primary
        );
        assert_eq!(
            ArtifactRole::from_file_name("lib.module"),
            ArtifactRole::Primary
        );
    }

    #[test]
    fn role_names_round_trip() {
        for role in [
            ArtifactRole::Primary,
            ArtifactRole::Sources,
            ArtifactRole::Javadoc,
            ArtifactRole::Descriptor,
            ArtifactRole::Checksum,
        ] {
            assert_eq!(role.as_str().parse::<ArtifactRole>().unwrap(), role);
        }
        assert!("binary".parse::<ArtifactRole>().is_err());
    }

    #[test]
    fn extensions() {
        assert_eq!(extension_of("lib.jar"), "jar");
        assert_eq!(extension_of("dist.tar.gz"), "tar.gz");
        assert_eq!(extension_of("dist.TAR.GZ"), "TAR.GZ");
        assert_eq!(extension_of("dist.tgz"), "tgz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".hidden"), "");
        assert_eq!(extension_of("a.b.c"), "c");
    }

    #[test]
    fn media_types() {
        assert_eq!(media_type_for("lib.jar"), MEDIA_TYPE_JAVA_ARCHIVE);
        assert_eq!(media_type_for("app.war"), MEDIA_TYPE_JAVA_ARCHIVE);
        assert_eq!(media_type_for("app.EAR"), MEDIA_TYPE_JAVA_ARCHIVE);
        assert_eq!(media_type_for("lib.aar"), MEDIA_TYPE_JAVA_ARCHIVE);
        assert_eq!(media_type_for("lib.pom"), MEDIA_TYPE_XML);
        assert_eq!(media_type_for("settings.xml"), MEDIA_TYPE_XML);
        assert_eq!(media_type_for("lib.module"), MEDIA_TYPE_JSON);
        assert_eq!(media_type_for("dist.tar.gz"), MEDIA_TYPE_GZIP);
        assert_eq!(media_type_for("dist.tgz"), MEDIA_TYPE_GZIP);
        assert_eq!(media_type_for("lib.so"), MEDIA_TYPE_OCTET_STREAM);
        assert_eq!(media_type_for("README"), MEDIA_TYPE_OCTET_STREAM);
    }

    #[test]
    fn layout_names() {
        let coordinate = coordinate();
        assert_eq!(
            file_name(&coordinate, ArtifactRole::Primary, "jar"),
            "my-artifact-1.0.0.jar"
        );
        assert_eq!(
            file_name(&coordinate, ArtifactRole::Primary, "tar.gz"),
            "my-artifact-1.0.0.tar.gz"
        );
        assert_eq!(
            file_name(&coordinate, ArtifactRole::Primary, ""),
            "my-artifact-1.0.0"
        );
        assert_eq!(
            file_name(&coordinate, ArtifactRole::Sources, "jar"),
            "my-artifact-1.0.0-sources.jar"
        );
        assert_eq!(
            file_name(&coordinate, ArtifactRole::Javadoc, "jar"),
            "my-artifact-1.0.0-javadoc.jar"
        );
        assert_eq!(
            file_name(&coordinate, ArtifactRole::Descriptor, "pom"),
            "my-artifact-1.0.0.pom"
        );
        assert_eq!(
            checksum_file_name("my-artifact-1.0.0.jar", ChecksumAlgorithm::Sha1),
            "my-artifact-1.0.0.jar.sha1"
        );
    }
}
