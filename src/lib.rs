//! patchget library
//!
//! Downloads patch archives from a vendor support portal that has no API:
//! every page is scraped, every file is streamed to disk, and the operator
//! picks platforms and files at line prompts.
//!
//! # Architecture
//!
//! The library is organized into the following modules, leaf first:
//! - [`transport`] - HTTP session with cookies, redirects and on-demand credentials
//! - [`extract`] - link discovery behind a swappable page contract
//! - [`catalog`] - platform/language resolution and its on-disk cache
//! - [`selection`] - per (patch, platform) discovery and file selection
//! - [`orchestrator`] - the login, platforms, selection, download run
//! - [`prompt`] - operator console and the re-ask loop
//! - [`options`] - `key=value` run parameters

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod error;
pub mod extract;
pub mod options;
pub mod orchestrator;
pub mod prompt;
pub mod selection;
pub mod transport;
mod user_agent;

// Re-export commonly used types
pub use catalog::{CatalogStore, PlatformCatalog, PlatformEntry};
pub use error::{ConfigurationError, RetrievalError, RunError, ValidationError};
pub use extract::{DownloadLink, DownloadTask, FilenameFilter, PageContract, PortalPageContract};
pub use options::RunOptions;
pub use orchestrator::{RunContext, RunSummary, run};
pub use prompt::{Console, ScriptedConsole, TerminalConsole};
pub use selection::{DownloadList, SelectionResult};
pub use transport::{Portal, PortalClient, TransferStats, TransportError};
