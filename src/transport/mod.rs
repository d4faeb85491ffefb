//! HTTP transport for the support portal.
//!
//! One [`PortalClient`] is the session for a whole run: it owns the cookie
//! jar and the memoized credentials, follows redirects itself, and answers
//! authentication challenges on demand.
//!
//! # Features
//!
//! - Manual redirect following with relative `Location` resolution
//! - Lazy, single-use credential acquisition on the first 401 challenge
//! - Size-capped page fetches buffered through a transient file
//! - Streaming file transfers with a progress sink every MiB
//!
//! # Example
//!
//! ```no_run
//! use patchget::transport::{PortalClient, PromptingCredentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PortalClient::new(
//!     "https://updates.oracle.com",
//!     Box::new(PromptingCredentials::default()),
//! )?;
//! let page = client
//!     .fetch_text_limited("https://updates.oracle.com/Orion/SimpleSearch/switch_to_saved_searches", 1 << 20)
//!     .await?;
//! println!("{} bytes", page.len());
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use async_trait::async_trait;

mod client;
pub mod constants;
mod credentials;
mod error;

pub use client::{PortalClient, TransferStats};
pub use credentials::{CredentialProvider, Credentials, PromptingCredentials, StaticCredentials};
pub use error::TransportError;

/// Everything the pipeline needs from the network.
///
/// [`PortalClient`] is the real implementation; tests drive the pipeline with
/// fixture pages instead.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Base URL that relative portal paths are joined to.
    fn base_url(&self) -> &str;

    /// Fetches a page as text, capped at the session's page size limit.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network failure, timeout or error status.
    async fn fetch_text(&self, url: &str) -> Result<String, TransportError>;

    /// Streams `url` into a new file at `destination`.
    ///
    /// `progress` receives cumulative byte counts every MiB.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network failure or when the destination
    /// cannot be written.
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        progress: &mut (dyn FnMut(TransferStats) + Send),
    ) -> Result<TransferStats, TransportError>;
}
