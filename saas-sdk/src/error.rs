//! Error types for the SaaS platform SDK.

use thiserror::Error;

/// Errors that can occur when talking to the platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SdkError {
    /// The SDK or its deployment is misconfigured.
    ///
    /// Raised by the in-process backend when the tenant instance path does
    /// not resolve, and by the builder when a backend cannot be bound. A
    /// misconfigured deployment must not look like "no data".
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The bound backend does not implement this operation.
    ///
    /// The in-process backend has no notion of centrally tracked sessions,
    /// plans, or rules; calling those capabilities fails fast instead of
    /// returning empty data.
    #[error("operation `{operation}` is not supported by the `{backend}` backend")]
    Unsupported {
        /// Backend the operation was invoked on (`"local"` / `"remote"`).
        backend: &'static str,
        /// The operation that is missing there.
        operation: &'static str,
    },

    /// The platform could not be reached or answered with garbage.
    ///
    /// The first-party HTTP backend degrades reads to empty resources
    /// instead of surfacing this; custom [`PlatformClient`] implementations
    /// may propagate it.
    ///
    /// [`PlatformClient`]: crate::api::PlatformClient
    #[error("platform unavailable: {0}")]
    Upstream(String),

    /// The directory gateway behind the in-process backend failed.
    #[error("directory gateway error: {0}")]
    Gateway(String),

    /// The owner-app lookup behind an identity-bound URL failed.
    ///
    /// There is no safe slug to substitute into a partner URL, so this is
    /// re-raised to the caller with the original failure's message attached.
    #[error("owner app lookup failed: {0}")]
    OwnerAppLookup(String),
}

impl SdkError {
    /// Configuration error with the given reason.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Unsupported-operation error for the given backend.
    #[must_use]
    pub fn unsupported(backend: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }

    /// Upstream failure with the given reason.
    pub fn upstream(reason: impl Into<String>) -> Self {
        Self::Upstream(reason.into())
    }
}
