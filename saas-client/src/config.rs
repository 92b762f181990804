//! Configuration for the platform connection.

use std::time::Duration;

use serde::Deserialize;

/// Domain root of the production platform deployment.
pub const DEFAULT_ROOT: &str = "saasapi.com";

/// Domain root of the developer sandbox deployment.
pub const DEVELOPER_ROOT: &str = "developer.saasapi.com";

const DEFAULT_SCHEME: &str = "http://";
const DEFAULT_DOMAIN_SEPARATOR: &str = ".";
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Connection configuration.
///
/// The defaults target the production platform; point `root` at
/// [`DEVELOPER_ROOT`] (or a test server) to talk to another deployment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    /// URL scheme prepended to every constructed URL.
    pub scheme: String,
    /// Domain root of the platform deployment.
    pub root: String,
    /// Separator between a partner slug and the platform root.
    pub domain_separator: String,
    /// Timeout for every remote call, in milliseconds.
    pub http_timeout_ms: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_owned(),
            root: DEFAULT_ROOT.to_owned(),
            domain_separator: DEFAULT_DOMAIN_SEPARATOR.to_owned(),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

impl PlatformConfig {
    /// Configuration for the developer sandbox deployment.
    #[must_use]
    pub fn developer() -> Self {
        Self {
            root: DEVELOPER_ROOT.to_owned(),
            ..Self::default()
        }
    }

    /// Whether `host` belongs to the platform's own deployment.
    ///
    /// True for the root itself and for any instance hosted under it
    /// (`foo.saasapi.com`); an unrelated domain that merely embeds the root
    /// string does not match.
    #[must_use]
    pub fn is_platform_host(&self, host: &str) -> bool {
        host == self.root
            || host
                .strip_suffix(&self.root)
                .is_some_and(|prefix| prefix.ends_with(&self.domain_separator))
    }

    /// The remote-call timeout as a [`Duration`].
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}
