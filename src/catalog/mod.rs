//! Platform/language catalog resolution.
//!
//! A run works against an ordered set of platform codes. The set comes from
//! one of three places, checked in order:
//!
//! 1. codes given on the command line (`platform=226P,46P`), taken as-is;
//! 2. the live catalog page, when a reset was requested or nothing is cached,
//!    narrowed down by the operator and then cached;
//! 3. the cache file written by an earlier run.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::error::{ConfigurationError, RunError, ValidationError};
use crate::extract::PageContract;
use crate::prompt::{Console, ask_until_valid};
use crate::transport::Portal;

mod store;

pub use store::{CatalogStore, DEFAULT_CATALOG_FILE};

/// Description given to codes supplied on the command line.
pub const PLACEHOLDER_DESCRIPTION: &str = "Not available";

const RESET_NOTICE: &str = "Platforms and languages need to be reset.";
const LISTING_NOTICE: &str = "Obtaining the list of platforms and languages:";
const PLATFORM_PROMPT: &str = "Enter Comma separated platforms to list: ";
const CONFIRMATION_NOTICE: &str =
    "We're going to download patches for the following Platforms/Languages:";

/// One platform/language code and its human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEntry {
    /// Portal code, e.g. `226P`.
    pub code: String,
    /// Display name, e.g. `Linux x86-64`.
    pub description: String,
}

impl PlatformEntry {
    /// Creates an entry from both parts as given.
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Insertion-ordered platform set with unique codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformCatalog {
    entries: Vec<PlatformEntry>,
}

impl PlatformCatalog {
    /// Builds a catalog keeping the first entry for each code.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = PlatformEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.code.clone()))
            .collect();
        Self { entries }
    }

    /// Catalog of command-line codes, each with the placeholder description.
    /// Blank codes are dropped.
    #[must_use]
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Self {
        Self::from_entries(
            codes
                .iter()
                .map(AsRef::as_ref)
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(|code| PlatformEntry::new(code, PLACEHOLDER_DESCRIPTION)),
        )
    }

    /// Looks up a code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&PlatformEntry> {
        self.entries.iter().find(|entry| entry.code == code)
    }

    /// Entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &PlatformEntry> {
        self.entries.iter()
    }

    /// Number of platforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no platform is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where the platform set should come from.
#[derive(Debug, Clone, Default)]
pub struct PlatformRequest {
    /// Ignore the cache and ask the portal again.
    pub reset: bool,
    /// Codes given on the command line; skip the portal and the cache.
    pub explicit_codes: Vec<String>,
}

/// Parses a comma-separated list of codes against `available`.
///
/// Blank tokens between commas are skipped, repeated codes collapse, and every
/// remaining code must exist in `available`.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] when no code is given, or
/// [`ValidationError::UnknownPlatform`] for the first code not in `available`.
pub fn validate_platform_selection(
    input: &str,
    available: &PlatformCatalog,
) -> Result<PlatformCatalog, ValidationError> {
    let mut chosen = Vec::new();
    for code in input.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let entry = available
            .get(code)
            .ok_or_else(|| ValidationError::UnknownPlatform(code.to_string()))?;
        chosen.push(entry.clone());
    }
    if chosen.is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(PlatformCatalog::from_entries(chosen))
}

/// Resolves the platform set for this run and echoes it to the operator.
///
/// # Errors
///
/// Returns [`RunError::Transport`] when the catalog page cannot be fetched and
/// [`RunError::Configuration`] when the page lists no platform, the cache is
/// unreadable or malformed, or the operator's input runs out.
#[instrument(skip_all, fields(reset = request.reset, explicit = request.explicit_codes.len()))]
pub async fn resolve_platforms(
    request: &PlatformRequest,
    store: &CatalogStore,
    portal: &dyn Portal,
    contract: &dyn PageContract,
    console: &mut dyn Console,
) -> Result<PlatformCatalog, RunError> {
    let catalog = if !request.explicit_codes.is_empty() {
        debug!("using platform codes from the command line");
        PlatformCatalog::from_codes(&request.explicit_codes)
    } else if request.reset {
        refresh_from_portal(store, portal, contract, console).await?
    } else if let Some(cached) = store.load()? {
        debug!(path = %store.path().display(), "using cached platform catalog");
        cached
    } else {
        refresh_from_portal(store, portal, contract, console).await?
    };

    if catalog.is_empty() {
        // Only reachable with explicit codes that were all blank.
        return Err(ConfigurationError::NoPlatforms {
            url: contract.catalog_url(portal.base_url()),
        }
        .into());
    }

    console.say(CONFIRMATION_NOTICE);
    for entry in catalog.iter() {
        console.say(&format!(" {} - {}", entry.code, entry.description));
    }
    info!(platforms = catalog.len(), "platform catalog resolved");
    Ok(catalog)
}

async fn refresh_from_portal(
    store: &CatalogStore,
    portal: &dyn Portal,
    contract: &dyn PageContract,
    console: &mut dyn Console,
) -> Result<PlatformCatalog, RunError> {
    console.say(RESET_NOTICE);
    console.say(LISTING_NOTICE);

    let url = contract.catalog_url(portal.base_url());
    let page = portal.fetch_text(&url).await?;
    let available = PlatformCatalog::from_entries(contract.platform_options(&page));
    if available.is_empty() {
        return Err(ConfigurationError::NoPlatforms { url }.into());
    }
    debug!(available = available.len(), "platforms offered by the portal");

    for entry in available.iter() {
        console.say(&format!(" {} - {}", entry.code, entry.description));
    }

    let chosen = ask_until_valid(console, PLATFORM_PROMPT, |input| {
        validate_platform_selection(input, &available)
    })?;
    store.save(&chosen)?;
    Ok(chosen)
}
