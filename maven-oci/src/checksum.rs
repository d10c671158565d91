//! Maven side-file checksums

use std::fmt;
use std::str::FromStr;

use sha1::{Digest as _, Sha1};

use crate::error::BridgeError;

/// Algorithms Maven publishes checksum side-files for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    /// `.sha1`
    Sha1,
    /// `.md5`
    Md5,
}

impl ChecksumAlgorithm {
    /// Every algorithm a bundle carries, in publish order.
    pub const ALL: [ChecksumAlgorithm; 2] = [ChecksumAlgorithm::Sha1, ChecksumAlgorithm::Md5];

    /// Name used in annotations and as the file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Md5 => "md5",
        }
    }

    /// Lowercase hex digest of `data`.
    pub fn hex_digest(&self, data: &[u8]) -> String {
        match self {
            ChecksumAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
            ChecksumAlgorithm::Md5 => hex::encode(md5::compute(data).0),
        }
    }

    /// Whether a checksum file's content matches `data`.
    ///
    /// Checksum files written by other tools may append the file name after the digest
    /// or use uppercase hex, so only the first token is compared, ignoring case.
    pub fn matches(&self, checksum_file: &[u8], data: &[u8]) -> bool {
        let Ok(text) = std::str::from_utf8(checksum_file) else {
            return false;
        };
        text.split_whitespace()
            .next()
            .is_some_and(|expected| expected.eq_ignore_ascii_case(&self.hex_digest(data)))
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha1" => Ok(ChecksumAlgorithm::Sha1),
            "md5" => Ok(ChecksumAlgorithm::Md5),
            other => Err(BridgeError::invalid(format!(
                "unknown checksum algorithm {other:?}"
            ))),
        }
    }
}

/// Extensions of side-files Maven derives from an artifact rather than authoring.
pub(crate) const SIDE_FILE_EXTENSIONS: &[&str] = &["sha1", "md5", "sha256", "sha512", "asc"];
