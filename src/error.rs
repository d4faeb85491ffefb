//! Run-level error taxonomy.
//!
//! Transport failures live in [`crate::transport::TransportError`]. This module
//! holds the remaining kinds: configuration problems, page retrieval failures,
//! operator input that failed validation, and the aggregate [`RunError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// The run cannot be configured (platform set, filename filter, catalog store).
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Input ended while an interactive answer was still required.
    #[error("input closed while waiting for: {prompt}")]
    PromptClosed {
        /// The question that was left unanswered.
        prompt: String,
    },

    /// The console itself failed.
    #[error("console error: {source}")]
    Console {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog page did not list any platform.
    #[error("no platforms found on catalog page {url}")]
    NoPlatforms {
        /// The catalog page that was scraped.
        url: String,
    },

    /// A cached catalog line is not `code;description`.
    #[error("malformed line {line} in platform catalog {path}: {content:?}")]
    MalformedCatalogLine {
        /// The catalog file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// The catalog file could not be read or written.
    #[error("cannot access platform catalog {path}: {source}")]
    CatalogIo {
        /// The catalog file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The filename filter is not a valid regular expression.
    #[error("invalid filename pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },
}

impl ConfigurationError {
    /// Creates a prompt-closed error.
    pub fn prompt_closed(prompt: impl Into<String>) -> Self {
        Self::PromptClosed {
            prompt: prompt.into(),
        }
    }

    /// Creates a catalog IO error.
    pub fn catalog_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CatalogIo {
            path: path.into(),
            source,
        }
    }
}

/// A search or detail page could not be fetched mid-pipeline.
#[derive(Debug, Error)]
#[error("cannot retrieve patch {patch} for platform {platform}: {source}")]
pub struct RetrievalError {
    /// Patch being processed.
    pub patch: String,
    /// Platform code being processed.
    pub platform: String,
    /// The failed exchange.
    #[source]
    pub source: TransportError,
}

/// Operator input that does not name valid platforms or files.
///
/// Always recovered by asking again; never ends a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing was entered where at least one code is required.
    #[error("no platform codes entered")]
    Empty,
    /// A platform code is not in the catalog.
    #[error("unknown platform code {0:?}")]
    UnknownPlatform(String),
    /// A file selection token is not a number.
    #[error("{0:?} is not a file number")]
    NotANumber(String),
    /// A file number is not in the current list.
    #[error("no file numbered {0}")]
    UnknownOrdinal(usize),
}

/// Fatal failure of a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Login or file transfer failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Run configuration failed.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A portal page could not be fetched.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}
