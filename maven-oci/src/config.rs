//! Registry connection settings

use registry::RegistryReference;
use secret::Secret;
use serde::Deserialize;

use crate::coordinate::MavenCoordinate;
use crate::error::BridgeResult;

/// Where artifacts live, and how a transport should reach it.
///
/// Only `url` takes part in building references. `insecure` and `credentials` are
/// for the [`registry::RegistryClient`] that talks to the registry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryConfig {
    /// Registry base URL, optionally with a path prefix, e.g. `https://ghcr.io/acme`.
    pub url: String,

    /// Allow plain HTTP.
    #[serde(default)]
    pub insecure: bool,

    /// Credentials for registries that require them.
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

/// Username and password or token for a registry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Password or access token.
    pub password: Secret,
}

impl RegistryConfig {
    /// Anonymous, TLS-only access to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            insecure: false,
            credentials: None,
        }
    }

    /// Attach credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<Secret>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// URL scheme a transport should use.
    pub fn scheme(&self) -> &'static str {
        if self.insecure {
            "http"
        } else {
            "https"
        }
    }

    /// The reference `coordinate` is published under in this registry.
    pub fn reference(&self, coordinate: &MavenCoordinate) -> BridgeResult<RegistryReference> {
        crate::reference::build(&self.url, coordinate)
    }
}
