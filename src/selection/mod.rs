//! Per-pair discovery and file selection.
//!
//! For one (patch, platform) pair the engine fetches the search page and any
//! multi-part detail pages, numbers the matching files 1..n, shows them, and
//! resolves which of them go on the run-wide [`DownloadList`].

use std::collections::BTreeSet;

use tracing::{debug, info, instrument};

use crate::catalog::PlatformEntry;
use crate::error::{RetrievalError, RunError, ValidationError};
use crate::extract::{DownloadLink, FilenameFilter, PageContract, PageScan};
use crate::prompt::{Console, ask_until_valid};
use crate::transport::Portal;

mod list;

pub use list::DownloadList;

const FILE_PROMPT: &str = " Enter Comma separated files to download: ";
const PROTECTED_WARNING: &str = " ! This patch contains password protected files (not listed). Use the support portal to download them!";
const NO_FILES: &str = " No files available";
const ALL_REQUESTED: &str = " All files will be downloaded because download=all was specified.";

/// A file offered to the operator, numbered within its pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 1-based, dense within the pair.
    pub ordinal: usize,
    /// Download URL and the name the file is saved under.
    pub link: DownloadLink,
}

/// What the operator (or `download=all`) picked from a pair's candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionResult {
    /// Every candidate.
    All,
    /// Nothing.
    None,
    /// These ordinals, ascending and without repeats.
    Ordinals(Vec<usize>),
}

/// Parses a file selection against the offered candidates.
///
/// Accepts an empty answer (nothing), `all`, or a comma-separated list of
/// ordinals that all exist in `candidates`.
///
/// # Errors
///
/// Returns [`ValidationError::NotANumber`] for a token that is not a number
/// and [`ValidationError::UnknownOrdinal`] for a number not on offer.
pub fn validate_file_selection(
    input: &str,
    candidates: &[Candidate],
) -> Result<SelectionResult, ValidationError> {
    match input.trim() {
        "" => return Ok(SelectionResult::None),
        "all" => return Ok(SelectionResult::All),
        _ => {}
    }

    let mut ordinals = BTreeSet::new();
    for token in input.split(',').map(str::trim) {
        let ordinal: usize = token
            .parse()
            .map_err(|_| ValidationError::NotANumber(token.to_string()))?;
        if !candidates.iter().any(|c| c.ordinal == ordinal) {
            return Err(ValidationError::UnknownOrdinal(ordinal));
        }
        ordinals.insert(ordinal);
    }
    Ok(SelectionResult::Ordinals(ordinals.into_iter().collect()))
}

/// Discovery state for one (patch, platform) pair.
///
/// Built fresh for every pair, so ordinals always restart at 1.
#[derive(Debug, Clone, Default)]
pub struct PairScan {
    candidates: Vec<Candidate>,
    protected: bool,
}

impl PairScan {
    /// Empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one page into the pair and returns the detail pages it points to.
    ///
    /// A URL already seen for this pair keeps its first ordinal.
    pub fn absorb(&mut self, scan: PageScan) -> Vec<String> {
        self.protected |= scan.protected;
        for link in scan.links {
            if self.candidates.iter().any(|c| c.link.url == link.url) {
                continue;
            }
            let ordinal = self.candidates.len() + 1;
            self.candidates.push(Candidate { ordinal, link });
        }
        scan.detail_paths
    }

    /// Any page of the pair carried the password-protection notice.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// Candidates offered to the operator; none when the pair is protected.
    #[must_use]
    pub fn offered(&self) -> &[Candidate] {
        if self.protected {
            &[]
        } else {
            &self.candidates
        }
    }

    /// Links picked by `selection`, in ordinal order.
    #[must_use]
    pub fn chosen(&self, selection: &SelectionResult) -> Vec<&DownloadLink> {
        let offered = self.offered();
        match selection {
            SelectionResult::All => offered.iter().map(|c| &c.link).collect(),
            SelectionResult::None => Vec::new(),
            SelectionResult::Ordinals(ordinals) => offered
                .iter()
                .filter(|c| ordinals.contains(&c.ordinal))
                .map(|c| &c.link)
                .collect(),
        }
    }
}

/// Run-wide selection settings.
#[derive(Debug, Clone, Default)]
pub struct SelectionSettings {
    /// Filter applied to every filename.
    pub filter: FilenameFilter,
    /// Take every offered file without asking.
    pub download_all: bool,
}

/// Discovers, shows and selects the files of one pair, appending the chosen
/// links to `list`. Returns how many were appended.
///
/// # Errors
///
/// Returns [`RunError::Retrieval`] when the search page or a detail page
/// cannot be fetched, and [`RunError::Configuration`] when the operator's
/// input runs out.
#[instrument(skip_all, fields(patch = %patch, platform = %platform.code))]
pub async fn select_for_pair(
    patch: &str,
    platform: &PlatformEntry,
    settings: &SelectionSettings,
    portal: &dyn Portal,
    contract: &dyn PageContract,
    console: &mut dyn Console,
    list: &mut DownloadList,
) -> Result<usize, RunError> {
    console.say("");
    console.say(&format!(
        "Processing patch {patch} for {} and applying regexp {} to the filenames:",
        platform.description,
        settings.filter.as_str()
    ));

    let pair = discover(patch, &platform.code, &settings.filter, portal, contract).await?;
    let offered = pair.offered();

    if pair.is_protected() {
        console.say(PROTECTED_WARNING);
    } else if offered.is_empty() {
        console.say(NO_FILES);
    }
    for candidate in offered {
        console.say(&format!(" {} - {}", candidate.ordinal, candidate.link.filename));
    }

    let selection = if offered.is_empty() {
        SelectionResult::None
    } else if settings.download_all {
        console.say(&format!("{FILE_PROMPT}all"));
        console.say(ALL_REQUESTED);
        SelectionResult::All
    } else {
        ask_until_valid(console, FILE_PROMPT, |input| {
            validate_file_selection(input, offered)
        })?
    };

    let chosen = pair.chosen(&selection);
    for link in &chosen {
        list.push((*link).clone());
    }
    info!(offered = offered.len(), chosen = chosen.len(), "pair processed");
    Ok(chosen.len())
}

/// Fetches the search page and every multi-part detail page of a pair.
async fn discover(
    patch: &str,
    platform: &str,
    filter: &FilenameFilter,
    portal: &dyn Portal,
    contract: &dyn PageContract,
) -> Result<PairScan, RetrievalError> {
    let retrieval = |source| RetrievalError {
        patch: patch.to_string(),
        platform: platform.to_string(),
        source,
    };

    let mut pair = PairScan::new();
    let search_url = contract.search_url(portal.base_url(), patch, platform);
    let page = portal.fetch_text(&search_url).await.map_err(retrieval)?;
    let detail_paths = pair.absorb(contract.scan(&page, filter));

    for path in detail_paths {
        let detail_url = contract.detail_url(portal.base_url(), &path);
        debug!(url = %detail_url, "fetching multi-part detail page");
        let page = portal.fetch_text(&detail_url).await.map_err(retrieval)?;
        // Detail pages are not followed any further.
        pair.absorb(contract.scan(&page, filter));
    }
    Ok(pair)
}
