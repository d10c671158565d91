//! Content digests

use std::fmt;
use std::str::FromStr;

use sha2::{Digest as _, Sha256};

use crate::error::{RegistryError, RegistryResult};

/// A content digest in `algorithm:encoded` form, e.g. `sha256:9f86d0...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    algorithm: String,
    encoded: String,
}

impl Digest {
    /// Compute the sha256 digest of `data`.
    pub fn sha256(data: &[u8]) -> Self {
        Self {
            algorithm: "sha256".to_string(),
            encoded: hex::encode(Sha256::digest(data)),
        }
    }

    /// The algorithm part, e.g. `sha256`.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The encoded (hex) part.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Check that `data` hashes to this digest.
    pub fn verify(&self, data: &[u8]) -> RegistryResult<()> {
        if self.algorithm != "sha256" {
            return Err(RegistryError::InvalidDigest(format!(
                "unsupported digest algorithm: {}",
                self.algorithm
            )));
        }

        let actual = Digest::sha256(data);
        if &actual != self {
            return Err(RegistryError::DigestMismatch {
                expected: self.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

impl FromStr for Digest {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidDigest(s.to_string());

        let (algorithm, encoded) = s.split_once(':').ok_or_else(invalid)?;
        if algorithm.is_empty() || encoded.is_empty() {
            return Err(invalid());
        }

        let algorithm_ok = algorithm
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+._-".contains(c));
        let encoded_ok = encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "=_-".contains(c));
        if !algorithm_ok || !encoded_ok {
            return Err(invalid());
        }

        if algorithm == "sha256"
            && (encoded.len() != 64
                || !encoded
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)))
        {
            return Err(invalid());
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            encoded: encoded.to_string(),
        })
    }
}

impl serde::Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
