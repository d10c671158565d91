//! Mapping between Maven group identifiers and registry path segments.
//!
//! Registry path components must be lowercase and admit very little punctuation,
//! while Maven group identifiers are dotted, mixed-case names. The mapping here
//! is deterministic but lossy: characters that cannot appear in a path segment
//! are dropped rather than escaped, and separators collapse to a single `-`.
//! Already-published references depend on exactly this behaviour.
//!
//! Distinct groups may share a segment (`com.example` and `com-example` both become
//! `com-example`). Such collisions are not detected.

use std::fmt;

use crate::error::{BridgeError, BridgeResult};

/// A registry-legal path segment derived from a group identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedGroup(String);

impl SanitizedGroup {
    /// The segment text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the segment text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SanitizedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedGroup {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '_' | '-') || c.is_whitespace()
}

/// Convert a group identifier to a registry path segment.
///
/// The input is lowercased, every run of `.`, `_`, `-` or whitespace becomes a single `-`,
/// anything outside `[a-z0-9-]` is dropped, and separators are trimmed from both ends.
///
/// ```
/// use maven_oci::group::sanitize;
///
/// assert_eq!(sanitize("com.Example_tools").unwrap().as_str(), "com-example-tools");
/// assert!(sanitize("...").is_err());
/// ```
pub fn sanitize(group_id: &str) -> BridgeResult<SanitizedGroup> {
    if group_id.trim().is_empty() {
        return Err(BridgeError::invalid("group id is empty"));
    }

    let mut segment = String::with_capacity(group_id.len());
    let mut pending_separator = false;

    for c in group_id.chars().flat_map(char::to_lowercase) {
        if is_separator(c) {
            pending_separator = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            // Dropped characters leave a pending separator in place, so `a.@.b` is `a-b`.
            if pending_separator && !segment.is_empty() {
                segment.push('-');
            }
            pending_separator = false;
            segment.push(c);
        }
    }

    if segment.is_empty() {
        return Err(BridgeError::invalid(format!(
            "group id {group_id:?} has no characters usable in a registry path"
        )));
    }

    debug_assert!(is_valid(&segment));
    Ok(SanitizedGroup(segment))
}

/// Recover a dotted group identifier from a segment by turning every `-` into `.`.
///
/// Characters dropped by [`sanitize`] cannot be recovered, so this only inverts
/// groups made of letters, digits and single dots.
pub fn reverse(segment: &str) -> BridgeResult<String> {
    if segment.is_empty() {
        return Err(BridgeError::invalid("group segment is empty"));
    }
    Ok(segment.replace('-', "."))
}

/// Whether `segment` is a legal registry path segment: non-empty, lowercase alphanumerics,
/// `-`, `_` and `.`, not starting or ending with a separator.
pub fn is_valid(segment: &str) -> bool {
    let legal =
        |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-');
    let separator = |c: char| matches!(c, '.' | '_' | '-');

    match (segment.chars().next(), segment.chars().last()) {
        (Some(first), Some(last)) => {
            !separator(first) && !separator(last) && segment.chars().all(legal)
        }
        _ => false,
    }
}
