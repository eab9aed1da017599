//! Shared constants used across tempaste crates.

use std::time::Duration;

/// Lifetime of every paste, measured from its most recent insertion.
pub const PASTE_TTL: Duration = Duration::from_secs(900);

/// Random bytes drawn per identifier.
pub const ID_BYTES: usize = 3;
/// Length of the hex-encoded identifier embedded in URLs.
pub const ID_LEN: usize = ID_BYTES * 2;

/// Upper bound on identifier regeneration when a fresh id hits a live paste.
pub const MAX_ID_ATTEMPTS: usize = 8;

/// Default maximum paste size accepted by both adapters.
pub const DEFAULT_MAX_PASTE_SIZE: usize = 2 * 1024 * 1024;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default raw TCP ingest port.
pub const DEFAULT_TCP_PORT: u16 = 9999;

/// Idle time allowed between reads on a streaming connection.
pub const DEFAULT_TCP_READ_TIMEOUT: Duration = Duration::from_secs(30);
