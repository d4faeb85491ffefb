//! Portal HTTP client.
//!
//! Redirects are followed here rather than by reqwest so that an
//! authentication challenge on any hop can be answered and the hop retried.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::cookie::Jar;
use reqwest::header::LOCATION;
use reqwest::{Client, Response, StatusCode, redirect};
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::Portal;
use super::constants::{
    CONNECT_TIMEOUT_SECS, PAGE_SIZE_LIMIT, PROGRESS_INTERVAL_BYTES, READ_TIMEOUT_SECS,
};
use super::credentials::{CredentialProvider, Credentials};
use super::error::TransportError;
use crate::user_agent;

/// Byte count and elapsed time of a transfer.
///
/// Progress sinks receive cumulative values; a finished transfer returns the
/// totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferStats {
    /// Bytes written to the sink.
    pub bytes: u64,
    /// Time since the response body started streaming.
    pub elapsed: Duration,
}

impl TransferStats {
    /// Elapsed time in whole milliseconds.
    #[must_use]
    pub fn elapsed_millis(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    /// Average throughput in KiB/s (bytes per millisecond, like the summary line).
    #[must_use]
    pub fn kib_per_sec(&self) -> u64 {
        self.bytes / self.elapsed_millis().max(1)
    }

    /// Whole MiB transferred.
    #[must_use]
    pub fn mebibytes(&self) -> u64 {
        self.bytes / 1024 / 1024
    }
}

/// Authenticated session against the portal.
///
/// Create once per run and reuse: the cookie jar and credentials live here.
pub struct PortalClient {
    client: Client,
    base_url: String,
    provider: Box<dyn CredentialProvider>,
    credentials: OnceCell<Credentials>,
    page_size_limit: u64,
}

impl std::fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.credentials.initialized())
            .field("page_size_limit", &self.page_size_limit)
            .finish_non_exhaustive()
    }
}

impl PortalClient {
    /// Creates a session with the default timeouts (30s connect, 60s read).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        provider: Box<dyn CredentialProvider>,
    ) -> Result<Self, TransportError> {
        Self::with_timeouts(base_url, provider, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a session with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the HTTP client cannot be built.
    #[instrument(level = "debug", skip(base_url, provider))]
    pub fn with_timeouts(
        base_url: impl Into<String>,
        provider: Box<dyn CredentialProvider>,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .redirect(redirect::Policy::none())
            .cookie_provider(Arc::new(Jar::default()))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|e| TransportError::network(base_url.clone(), e))?;

        Ok(Self {
            client,
            base_url,
            provider,
            credentials: OnceCell::new(),
            page_size_limit: PAGE_SIZE_LIMIT,
        })
    }

    /// Overrides the page size cap used by [`Portal::fetch_text`].
    #[must_use]
    pub fn with_page_size_limit(mut self, limit: u64) -> Self {
        self.page_size_limit = limit;
        self
    }

    /// Returns true once credentials were obtained for this session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials.initialized()
    }

    /// Fetches `url` as text, reading at most `size_limit` body bytes.
    ///
    /// The body is buffered through a transient file that is removed before
    /// returning; a failed removal is only logged.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network failure, timeout, error status or
    /// when the buffer file cannot be used.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text_limited(
        &self,
        url: &str,
        size_limit: u64,
    ) -> Result<String, TransportError> {
        let response = self.open(url).await?;

        let buffer =
            NamedTempFile::new().map_err(|e| TransportError::io(std::env::temp_dir(), e))?;
        let buffer_path = buffer.path().to_path_buf();
        let handle = buffer
            .as_file()
            .try_clone()
            .map_err(|e| TransportError::io(&buffer_path, e))?;
        let mut file = File::from_std(handle);

        let stats = stream_into(
            response,
            &mut file,
            url,
            &buffer_path,
            Some(size_limit),
            &mut |_| {},
        )
        .await?;
        drop(file);

        let body = tokio::fs::read(&buffer_path)
            .await
            .map_err(|e| TransportError::io(&buffer_path, e))?;
        if let Err(error) = buffer.close() {
            warn!(
                path = %buffer_path.display(),
                error = %error,
                "could not remove page buffer file"
            );
        }

        debug!(bytes = stats.bytes, "page fetched");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Streams `url` into `destination`, stopping after `byte_limit` bytes if given.
    ///
    /// The destination file is only created once the portal answered with a
    /// success status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network failure, timeout, error status or
    /// when the destination cannot be written.
    #[instrument(skip(self, progress), fields(url = %url, path = %destination.display()))]
    pub async fn stream_to_file(
        &self,
        url: &str,
        destination: &Path,
        byte_limit: Option<u64>,
        progress: &mut (dyn FnMut(TransferStats) + Send),
    ) -> Result<TransferStats, TransportError> {
        let response = self.open(url).await?;
        let mut file = File::create(destination)
            .await
            .map_err(|e| TransportError::io(destination, e))?;

        let stats = stream_into(response, &mut file, url, destination, byte_limit, progress).await?;
        info!(bytes = stats.bytes, elapsed_ms = stats.elapsed_millis(), "transfer complete");
        Ok(stats)
    }

    /// Issues a GET and follows redirects until a non-redirect response.
    async fn open(&self, url: &str) -> Result<Response, TransportError> {
        let mut current = Url::parse(url).map_err(|_| TransportError::invalid_url(url))?;

        loop {
            let response = self.send_answering_challenge(&current).await?;
            let status = response.status();

            if status.is_redirection()
                && let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
            {
                let next = current
                    .join(location)
                    .map_err(|_| TransportError::invalid_url(location))?;
                debug!(from = %current, to = %next, status = status.as_u16(), "following redirect");
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(TransportError::http_status(current.as_str(), status.as_u16()));
            }

            return Ok(response);
        }
    }

    /// Sends one request; on a 401 challenge obtains credentials (once per
    /// session) and retries the same request with them.
    async fn send_answering_challenge(&self, url: &Url) -> Result<Response, TransportError> {
        let response = self.send(url, None).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let first_challenge = !self.credentials.initialized();
        let credentials = self
            .credentials
            .get_or_try_init(|| async { self.provider.credentials() })
            .await?;
        if first_challenge {
            info!(username = %credentials.username(), "authenticating with portal");
        }

        let retried = self.send(url, Some(credentials)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            return Err(TransportError::auth_rejected(url.as_str()));
        }
        Ok(retried)
    }

    async fn send(
        &self,
        url: &Url,
        credentials: Option<&Credentials>,
    ) -> Result<Response, TransportError> {
        let mut request = self.client.get(url.clone());
        if let Some(credentials) = credentials {
            request = request.basic_auth(credentials.username(), Some(credentials.password()));
        }
        request
            .send()
            .await
            .map_err(|e| TransportError::network(url.as_str(), e))
    }
}

#[async_trait]
impl Portal for PortalClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        self.fetch_text_limited(url, self.page_size_limit).await
    }

    async fn download(
        &self,
        url: &str,
        destination: &Path,
        progress: &mut (dyn FnMut(TransferStats) + Send),
    ) -> Result<TransferStats, TransportError> {
        self.stream_to_file(url, destination, None, progress).await
    }
}

/// Streams a response body into `sink`, reporting progress every MiB.
async fn stream_into<W>(
    response: Response,
    sink: &mut W,
    url: &str,
    sink_path: &Path,
    byte_limit: Option<u64>,
    progress: &mut (dyn FnMut(TransferStats) + Send),
) -> Result<TransferStats, TransportError>
where
    W: AsyncWrite + Unpin,
{
    let started = Instant::now();
    let mut writer = BufWriter::new(sink);
    let mut stream = response.bytes_stream();
    let mut bytes: u64 = 0;
    let mut next_report = PROGRESS_INTERVAL_BYTES;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| TransportError::network(url, e))?;

        let take = match byte_limit {
            Some(limit) => usize::try_from(limit.saturating_sub(bytes))
                .unwrap_or(usize::MAX)
                .min(chunk.len()),
            None => chunk.len(),
        };
        writer
            .write_all(&chunk[..take])
            .await
            .map_err(|e| TransportError::io(sink_path, e))?;
        bytes += take as u64;

        if bytes >= next_report {
            progress(TransferStats {
                bytes,
                elapsed: started.elapsed(),
            });
            next_report = (bytes / PROGRESS_INTERVAL_BYTES + 1) * PROGRESS_INTERVAL_BYTES;
        }

        if byte_limit.is_some_and(|limit| bytes >= limit) {
            debug!(bytes, "byte limit reached, stopping transfer");
            break;
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| TransportError::io(sink_path, e))?;

    Ok(TransferStats {
        bytes,
        elapsed: started.elapsed(),
    })
}
