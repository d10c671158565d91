//! Maven coordinates

use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, BridgeResult};

/// A Maven `groupId:artifactId:version` triple.
///
/// All three parts are validated on construction, so a coordinate can always be turned
/// into a registry reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MavenCoordinate {
    group_id: String,
    artifact_id: String,
    version: String,
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

impl MavenCoordinate {
    /// Validate and build a coordinate.
    ///
    /// - `group_id`: non-empty, letters, digits, `.`, `_` and `-`, with no empty dotted segment
    /// - `artifact_id`: non-empty, letters, digits, `.`, `_` and `-`
    /// - `version`: a legal OCI tag, since it becomes the tag of the manifest
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> BridgeResult<Self> {
        let group_id = group_id.into();
        let artifact_id = artifact_id.into();
        let version = version.into();

        if group_id.is_empty()
            || !group_id.chars().all(is_identifier_char)
            || group_id.split('.').any(str::is_empty)
        {
            return Err(BridgeError::invalid(format!(
                "invalid group id: {group_id:?}"
            )));
        }

        if artifact_id.is_empty() || !artifact_id.chars().all(is_identifier_char) {
            return Err(BridgeError::invalid(format!(
                "invalid artifact id: {artifact_id:?}"
            )));
        }

        if !registry::is_valid_tag(&version) {
            return Err(BridgeError::invalid(format!(
                "version {version:?} is not usable as a registry tag"
            )));
        }

        Ok(Self {
            group_id,
            artifact_id,
            version,
        })
    }

    /// The group identifier, e.g. `com.example`.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// The artifact identifier, e.g. `my-artifact`.
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// The version, e.g. `1.0.0`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The `{artifactId}-{version}` stem shared by every file of this coordinate.
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.artifact_id, self.version)
    }
}

impl fmt::Display for MavenCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl FromStr for MavenCoordinate {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group_id, artifact_id, version] => Self::new(*group_id, *artifact_id, *version),
            _ => Err(BridgeError::invalid(format!(
                "expected groupId:artifactId:version, got {s:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let coordinate: MavenCoordinate = "com.example:my-artifact:1.0.0".parse().unwrap();
        assert_eq!(coordinate.group_id(), "com.example");
        assert_eq!(coordinate.artifact_id(), "my-artifact");
        assert_eq!(coordinate.version(), "1.0.0");
        assert_eq!(coordinate.to_string(), "com.example:my-artifact:1.0.0");
        assert_eq!(coordinate.file_stem(), "my-artifact-1.0.0");
    }

    #[test]
    fn mixed_case_group_is_accepted() {
        let coordinate = MavenCoordinate::new("Org.Example_Tools", "Core", "2.1-SNAPSHOT").unwrap();
        assert_eq!(coordinate.group_id(), "Org.Example_Tools");
    }

    #[test]
    fn rejects_malformed_parts() {
        for (group, artifact, version) in [
            ("", "a", "1.0"),
            ("com..example", "a", "1.0"),
            (".com", "a", "1.0"),
            ("com example", "a", "1.0"),
            ("com/example", "a", "1.0"),
            ("com.example", "", "1.0"),
            ("com.example", "a/b", "1.0"),
            ("com.example", "a", ""),
            ("com.example", "a", "1.0+build"),
            ("com.example", "a", "-1"),
        ] {
            let err = MavenCoordinate::new(group, artifact, version).unwrap_err();
            assert!(
                matches!(err, BridgeError::InvalidInput(_)),
                "{group}:{artifact}:{version}"
            );
        }
    }

    #[test]
    fn parse_requires_three_parts() {
        for input in ["com.example:a", "com.example:a:1.0:jar", "", "::"] {
            assert!(input.parse::<MavenCoordinate>().is_err(), "{input:?}");
        }
    }
}
