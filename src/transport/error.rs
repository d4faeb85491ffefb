//! Error types for the transport module.
//!
//! Every variant carries the URL or path it concerns so a fatal error printed
//! at the end of a run says exactly which exchange failed.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to the portal.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Connect or read timed out.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-redirect, non-success HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The portal kept challenging after credentials were supplied.
    #[error("credentials rejected by {url}")]
    AuthRejected {
        /// The URL that rejected the credentials.
        url: String,
    },

    /// Credentials could not be obtained from the operator.
    #[error("cannot obtain credentials: {reason}")]
    Credentials {
        /// Why the credential provider gave up.
        reason: String,
    },

    /// File system error while writing a transfer.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The URL (or a redirect target) is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl TransportError {
    /// Creates a network error, promoting reqwest timeouts to [`TransportError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an auth-rejected error.
    pub fn auth_rejected(url: impl Into<String>) -> Self {
        Self::AuthRejected { url: url.into() }
    }

    /// Creates a credential acquisition error.
    pub fn credentials(reason: impl Into<String>) -> Self {
        Self::Credentials {
            reason: reason.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URL or path, which the source errors do not carry.
