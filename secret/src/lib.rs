//! Wrapper for registry passwords and tokens which keeps them out of logs.

use std::{borrow::Cow, fmt, ops::Deref};

use serde::Deserialize;
use zeroize::Zeroize;

/// A semi-secret value, such as a registry password.
///
/// The wrapper prevents the value from appearing in debug reprs and
/// clears owned values from memory on drop.
///
/// Use [Secret::revealed] to get the underlying value.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub struct Secret(Cow<'static, str>);

impl Drop for Secret {
    fn drop(&mut self) {
        if let Cow::Owned(ref mut s) = self.0 {
            s.zeroize()
        }
    }
}

/// Tiny wrapper struct to indicate that the inner object should
/// be directly printed in fmt::Debug implementations.
struct DirectDebug<D>(D);

impl<D> fmt::Debug for DirectDebug<D>
where
    D: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&DirectDebug("****")).finish()
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.revealed() == other.revealed()
    }
}

impl Eq for Secret {}

impl Secret {
    /// Expose the underlying value
    pub fn revealed(&self) -> &str {
        self.0.deref()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value.into())
    }
}

impl From<&'static str> for Secret {
    fn from(value: &'static str) -> Self {
        Secret(value.into())
    }
}
