//! Paste records and API response shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a live paste as handed out by the store.
///
/// The expiry deadline stays inside the store and is never part of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteRecord {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub view_count: u64,
}

/// Response returned to clients after a paste is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPaste {
    pub url: String,
    pub id: String,
}

impl CreatedPaste {
    /// Build the response for `id` served under `base_url`.
    pub fn new(base_url: &str, id: String) -> Self {
        Self {
            url: paste_url(base_url, &id),
            id,
        }
    }
}

/// Join a base address and a paste id into a retrieval URL.
pub fn paste_url(base_url: &str, id: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), id)
}

/// Decode raw payload bytes into paste text.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_payload(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
