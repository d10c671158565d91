//! Building registry references from Maven coordinates.

use registry::RegistryReference;
use url::Url;

use crate::coordinate::MavenCoordinate;
use crate::error::{BridgeError, BridgeResult};
use crate::group;

/// Build the registry reference for `coordinate` under `registry_url`.
///
/// The reference is `host[:port]/{prefix...}/{sanitized group}/{artifactId}:{version}`,
/// where the prefix is the lowercased path of `registry_url` with empty segments dropped.
/// A URL without a scheme is treated as `https`; scheme, credentials, query and fragment
/// are not part of the reference.
///
/// ```
/// use maven_oci::{reference, MavenCoordinate};
///
/// let coordinate = MavenCoordinate::new("com.example", "my-artifact", "1.0.0").unwrap();
/// let reference = reference::build("https://registry.example.com", &coordinate).unwrap();
/// assert_eq!(
///     reference.to_string(),
///     "registry.example.com/com-example/my-artifact:1.0.0"
/// );
/// ```
pub fn build(
    registry_url: &str,
    coordinate: &MavenCoordinate,
) -> BridgeResult<RegistryReference> {
    let trimmed = registry_url.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::invalid("registry url is empty"));
    }

    let url = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("https://{trimmed}"))
    }
    .map_err(|err| BridgeError::invalid(format!("invalid registry url {trimmed:?}: {err}")))?;

    let host = match (url.host_str(), url.port()) {
        (Some(host), _) if host.is_empty() => None,
        (Some(host), Some(port)) => Some(format!("{}:{port}", host.to_lowercase())),
        (Some(host), None) => Some(host.to_lowercase()),
        (None, _) => None,
    }
    .ok_or_else(|| BridgeError::invalid(format!("registry url {trimmed:?} has no host")))?;

    let mut segments: Vec<String> = url
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty())
        .map(str::to_lowercase)
        .collect();
    segments.push(group::sanitize(coordinate.group_id())?.into_inner());
    segments.push(coordinate.artifact_id().to_string());

    RegistryReference::new(host, segments, coordinate.version())
        .map_err(|err| BridgeError::invalid(err.to_string()))
}
