//! Top-level run driver.
//!
//! A run is four phases, strictly one after another:
//!
//! 1. **login**: fetch the warm-up page so the session is authenticated before
//!    any data request;
//! 2. **platforms**: resolve the platform catalog;
//! 3. **selection**: for every patch, for every platform, discover and select
//!    files into one [`DownloadList`];
//! 4. **download**: stream every selected file into the stage directory.
//!
//! Any fatal error ends the run; files already written stay on disk.

use std::time::Instant;

use tracing::{info, instrument};

use crate::catalog::{CatalogStore, PlatformRequest, resolve_platforms};
use crate::error::RunError;
use crate::extract::{FilenameFilter, PageContract};
use crate::options::RunOptions;
use crate::prompt::Console;
use crate::selection::{DownloadList, SelectionSettings, select_for_pair};
use crate::transport::{Portal, TransferStats, TransportError};

mod progress;

pub use progress::PhaseTimings;
use progress::TransferSpinner;

const NO_PATCHES: &str = "No patch numbers are specified.";
const PLATFORMS_REFRESHED: &str = "Platform list refreshed; no patch numbers are specified.";
const NOTHING_TO_DOWNLOAD: &str = "There's nothing to download!";
const DOWNLOADING_ALL: &str = "Downloading all selected files:";

/// What a finished run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files written to the stage directory.
    pub files: usize,
    /// Bytes written across all files.
    pub bytes: u64,
    /// Duration of each phase that ran.
    pub timings: PhaseTimings,
}

/// The services a run talks to.
pub struct RunContext<'a> {
    /// The portal session.
    pub portal: &'a dyn Portal,
    /// Page layout of the portal.
    pub contract: &'a dyn PageContract,
    /// Platform cache.
    pub store: &'a CatalogStore,
}

/// Executes one run.
///
/// # Errors
///
/// Returns the first fatal [`RunError`]: an invalid filename pattern, a
/// failed login or transfer, a platform catalog problem, or a page that
/// cannot be retrieved.
#[instrument(skip_all, fields(patches = options.patches.len()))]
pub async fn run(
    options: &RunOptions,
    context: &RunContext<'_>,
    console: &mut dyn Console,
) -> Result<RunSummary, RunError> {
    let filter = FilenameFilter::new(&options.regexp)?;
    let mut summary = RunSummary::default();

    // Nothing to fetch, so no login either.
    if !options.has_work() {
        console.say("");
        console.say(NO_PATCHES);
        return Ok(summary);
    }

    let started = Instant::now();
    login(context).await?;
    summary.timings.record("login", started);

    let started = Instant::now();
    let request = PlatformRequest {
        reset: options.reset,
        explicit_codes: options.platforms.clone(),
    };
    let catalog = resolve_platforms(
        &request,
        context.store,
        context.portal,
        context.contract,
        console,
    )
    .await?;
    summary.timings.record("platforms", started);

    if options.patches.is_empty() {
        console.say("");
        console.say(PLATFORMS_REFRESHED);
        report_timings(options, &summary, console);
        return Ok(summary);
    }

    let started = Instant::now();
    let settings = SelectionSettings {
        filter,
        download_all: options.download_all,
    };
    let mut list = DownloadList::new();
    for patch in &options.patches {
        for platform in catalog.iter() {
            select_for_pair(
                patch,
                platform,
                &settings,
                context.portal,
                context.contract,
                console,
                &mut list,
            )
            .await?;
        }
    }
    summary.timings.record("selection", started);

    let started = Instant::now();
    download_all(options, context, &list, console, &mut summary).await?;
    summary.timings.record("download", started);

    report_timings(options, &summary, console);
    info!(files = summary.files, bytes = summary.bytes, "run complete");
    Ok(summary)
}

/// Fetches the warm-up page; answers the first credential challenge.
async fn login(context: &RunContext<'_>) -> Result<(), TransportError> {
    let url = context.contract.login_url(context.portal.base_url());
    context.portal.fetch_text(&url).await?;
    info!("logged in to portal");
    Ok(())
}

async fn download_all(
    options: &RunOptions,
    context: &RunContext<'_>,
    list: &DownloadList,
    console: &mut dyn Console,
    summary: &mut RunSummary,
) -> Result<(), TransportError> {
    console.say("");
    if list.is_empty() {
        console.say(NOTHING_TO_DOWNLOAD);
        return Ok(());
    }

    console.say(DOWNLOADING_ALL);
    for task in list.tasks(&options.stage_dir) {
        let filename = task.filename();
        let spinner = TransferSpinner::start(!options.silent, &filename);
        let result = context
            .portal
            .download(&task.source_url, &task.destination, &mut |stats: TransferStats| {
                spinner.update(stats);
            })
            .await;
        spinner.finish();
        let stats = result?;

        console.say(&format!(
            " Downloading {filename}: {} MB at average speed of {} KB/s - DONE!",
            stats.mebibytes(),
            stats.kib_per_sec()
        ));
        summary.files += 1;
        summary.bytes += stats.bytes;
    }
    Ok(())
}

fn report_timings(options: &RunOptions, summary: &RunSummary, console: &mut dyn Console) {
    if !options.debug {
        return;
    }
    console.say("");
    for line in summary.timings.report() {
        console.say(&line);
    }
}
