//! Link discovery on portal pages.
//!
//! The portal has no API: download links, multi-part detail links, the
//! password-protection notice and the platform list are all scraped from
//! HTML. Every markup literal lives behind [`PageContract`], so a change in
//! the vendor's markup touches only [`PortalPageContract`].

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::catalog::PlatformEntry;
use crate::error::ConfigurationError;

mod portal;

pub use portal::PortalPageContract;

/// A download URL together with the local filename derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    /// URL as found on the page.
    pub url: String,
    /// Bare filename, never a path.
    pub filename: String,
}

impl DownloadLink {
    /// Pairs `url` with its filename.
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
        }
    }
}

/// What one page yielded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageScan {
    /// Nameable download links whose filename passed the filter, in document
    /// order.
    pub links: Vec<DownloadLink>,
    /// Relative paths of multi-part detail pages, in document order.
    pub detail_paths: Vec<String>,
    /// The page carries the password-protected notice.
    pub protected: bool,
}

/// Markup and URL layout of the portal.
pub trait PageContract: Send + Sync {
    /// Page whose fetch establishes the authenticated session.
    fn login_url(&self, base: &str) -> String;

    /// Page listing every platform/language code.
    fn catalog_url(&self, base: &str) -> String;

    /// Search result page for one patch on one platform.
    fn search_url(&self, base: &str, patch: &str, platform: &str) -> String;

    /// Absolute URL of a multi-part detail page found by [`PageContract::scan`].
    fn detail_url(&self, base: &str, detail_path: &str) -> String;

    /// Finds download links, multi-part detail links and the protection notice.
    ///
    /// Links [`PageContract::filename_for`] cannot name are left out.
    fn scan(&self, html: &str, filter: &FilenameFilter) -> PageScan;

    /// Parses the platform/language option list from the catalog page.
    fn platform_options(&self, html: &str) -> Vec<PlatformEntry>;

    /// Local filename for a download URL.
    ///
    /// `None` if the URL is not a download link or its name is empty or would
    /// reach outside the destination directory.
    fn filename_for(&self, url: &str) -> Option<String>;
}

/// Operator-supplied filename filter.
///
/// The pattern must match the whole filename token (the part of the link
/// before `.zip`), not just a substring of it. An empty pattern matches
/// everything.
#[derive(Debug, Clone)]
pub struct FilenameFilter {
    pattern: String,
    regex: Regex,
}

impl FilenameFilter {
    /// Pattern used when the operator gives none.
    pub const MATCH_ALL: &'static str = ".*";

    /// Compiles `pattern` as an anchored, case-sensitive expression.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidPattern`] when `pattern` is not a
    /// valid regular expression.
    pub fn new(pattern: &str) -> Result<Self, ConfigurationError> {
        let pattern = if pattern.is_empty() {
            Self::MATCH_ALL
        } else {
            pattern
        };
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            ConfigurationError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Filter that accepts every filename.
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn match_all() -> Self {
        Self {
            pattern: Self::MATCH_ALL.to_string(),
            regex: compile_static_regex("^(?:.*)$"),
        }
    }

    /// Returns true when `token` matches the whole pattern.
    #[must_use]
    pub fn matches(&self, token: &str) -> bool {
        self.regex.is_match(token)
    }

    /// The pattern as given (or `.*`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl Default for FilenameFilter {
    fn default() -> Self {
        Self::match_all()
    }
}

/// One file to fetch: where from and where to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Download URL as found on the page.
    pub source_url: String,
    /// `stage_dir/<filename>`.
    pub destination: PathBuf,
}

impl DownloadTask {
    /// Task writing `link` into `stage_dir`.
    #[must_use]
    pub fn for_link(link: &DownloadLink, stage_dir: &Path) -> Self {
        Self {
            source_url: link.url.clone(),
            destination: stage_dir.join(&link.filename),
        }
    }

    /// Destination filename.
    #[must_use]
    pub fn filename(&self) -> String {
        self.destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Compiles a pattern known at build time.
///
/// # Panics
///
/// Panics if the pattern is invalid; only used for literals.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}
