//! Registry references (`host/repository:tag`)

use std::fmt;
use std::str::FromStr;

use crate::error::RegistryError;

/// Maximum tag length allowed by the OCI distribution specification.
const MAX_TAG_LENGTH: usize = 128;

/// Check a tag against the OCI grammar `[A-Za-z0-9_][A-Za-z0-9._-]{0,127}`.
pub fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    tag.len() <= MAX_TAG_LENGTH
        && (first.is_ascii_alphanumeric() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || "._-".contains(c))
}

/// A fully qualified reference to a tagged manifest in a registry.
///
/// Serializes as `host/seg1/.../segN:tag`. The host may carry a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryReference {
    host: String,
    path_segments: Vec<String>,
    tag: String,
}

impl RegistryReference {
    /// Assemble a reference from its parts.
    ///
    /// Fails when the host is empty, there are no path segments, any segment is empty or
    /// contains `/`, or the tag is not a legal OCI tag.
    pub fn new(
        host: impl Into<String>,
        path_segments: Vec<String>,
        tag: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let host = host.into();
        let tag = tag.into();

        if host.is_empty() || host.contains('/') {
            return Err(RegistryError::InvalidReference(format!(
                "invalid host: {host:?}"
            )));
        }
        if path_segments.is_empty() {
            return Err(RegistryError::InvalidReference(
                "reference has no repository path".to_string(),
            ));
        }
        if let Some(segment) = path_segments
            .iter()
            .find(|segment| segment.is_empty() || segment.contains(&['/', ':'][..]))
        {
            return Err(RegistryError::InvalidReference(format!(
                "invalid path segment: {segment:?}"
            )));
        }
        if !is_valid_tag(&tag) {
            return Err(RegistryError::InvalidReference(format!(
                "invalid tag: {tag:?}"
            )));
        }

        Ok(Self {
            host,
            path_segments,
            tag,
        })
    }

    /// Registry host, including the port when one was given.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Repository path segments, in order.
    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    /// Tag of the manifest.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Repository name: the path segments joined by `/`.
    pub fn repository(&self) -> String {
        self.path_segments.join("/")
    }
}

impl fmt::Display for RegistryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)?;
        for segment in &self.path_segments {
            write!(f, "/{segment}")?;
        }
        write!(f, ":{}", self.tag)
    }
}

impl FromStr for RegistryReference {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, tag) = s
            .rsplit_once(':')
            .filter(|(name, _)| name.contains('/'))
            .filter(|(_, tag)| !tag.contains('/'))
            .ok_or_else(|| RegistryError::InvalidReference(format!("missing tag: {s}")))?;

        let mut parts = name.split('/');
        let host = parts.next().unwrap_or_default();
        let path_segments = parts.map(str::to_string).collect();

        Self::new(host, path_segments, tag)
    }
}
