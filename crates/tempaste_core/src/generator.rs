//! Paste identifier generation.

use crate::constants::{ID_BYTES, ID_LEN};
use rand::rngs::OsRng;
use rand::RngCore;

/// Source of fresh paste identifiers.
///
/// Generators make no uniqueness promise; the store rejects ids that are still live.
pub trait IdGenerator: Send + Sync + 'static {
    fn new_id(&self) -> String;
}

/// Draws [`ID_BYTES`] from the operating system CSPRNG and hex-encodes them.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomHexGenerator;

impl IdGenerator for RandomHexGenerator {
    fn new_id(&self) -> String {
        let mut bytes = [0u8; ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Check that `id` matches the public identifier format (fixed-length lowercase hex).
pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
