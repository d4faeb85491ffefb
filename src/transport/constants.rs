//! Constants for the transport module (timeouts, limits, portal endpoints).

/// HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// HTTP read timeout between body chunks (60 seconds).
pub const READ_TIMEOUT_SECS: u64 = 60;

/// Progress sink cadence: one report per MiB transferred.
pub const PROGRESS_INTERVAL_BYTES: u64 = 1024 * 1024;

/// Upper bound for a scraped portal page (16 MiB).
pub const PAGE_SIZE_LIMIT: u64 = 16 * 1024 * 1024;

/// Default support portal host.
pub const DEFAULT_PORTAL_URL: &str = "https://updates.oracle.com";
