//! Shared ingest path used by every transport adapter.
//!
//! Adapters hand over raw payload bytes; this module validates them, mints an
//! identifier, and stores the paste. Identifier collisions with live pastes are
//! retried with a fresh id a bounded number of times.

use crate::constants::MAX_ID_ATTEMPTS;
use crate::error::AppError;
use crate::generator::{IdGenerator, RandomHexGenerator};
use crate::models::decode_payload;
use crate::store::PasteStore;
use std::sync::Arc;

/// Turns raw payloads into stored pastes.
#[derive(Clone)]
pub struct IngestService {
    store: PasteStore,
    generator: Arc<dyn IdGenerator>,
}

impl IngestService {
    /// Ingest into `store` using random hex identifiers.
    pub fn new(store: PasteStore) -> Self {
        Self::with_generator(store, Arc::new(RandomHexGenerator))
    }

    /// Ingest into `store` using a caller-supplied identifier source.
    pub fn with_generator(store: PasteStore, generator: Arc<dyn IdGenerator>) -> Self {
        Self { store, generator }
    }

    /// The store pastes are written to.
    pub fn store(&self) -> &PasteStore {
        &self.store
    }

    /// Store a request payload and return its new id.
    ///
    /// # Errors
    /// - [`AppError::PayloadTooLarge`] when the payload exceeds the store limit.
    /// - [`AppError::EmptyPayload`] for a zero-length payload.
    /// - [`AppError::GeneratorExhausted`] when no free id was found.
    pub fn ingest(&self, payload: &[u8]) -> Result<String, AppError> {
        self.check_size(payload)?;
        if payload.is_empty() {
            return Err(AppError::EmptyPayload);
        }
        self.store_with_fresh_id(decode_payload(payload).into(), payload.len())
    }

    /// Store a payload read from a raw stream.
    ///
    /// Payloads that are empty after trimming whitespace are dropped silently.
    /// The stored content keeps its original surrounding whitespace.
    ///
    /// # Returns
    /// `Ok(Some(id))` for a stored paste, `Ok(None)` when there was nothing to store.
    pub fn ingest_stream(&self, payload: &[u8]) -> Result<Option<String>, AppError> {
        self.check_size(payload)?;
        let content = decode_payload(payload);
        if content.trim().is_empty() {
            return Ok(None);
        }
        self.store_with_fresh_id(content.into(), payload.len())
            .map(Some)
    }

    fn check_size(&self, payload: &[u8]) -> Result<(), AppError> {
        let limit = self.store.max_content_size();
        if payload.len() > limit {
            return Err(AppError::PayloadTooLarge { limit });
        }
        Ok(())
    }

    fn store_with_fresh_id(
        &self,
        content: Arc<str>,
        received_len: usize,
    ) -> Result<String, AppError> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = self.generator.new_id();
            match self
                .store
                .insert_received(&id, Arc::clone(&content), received_len)
            {
                Ok(()) => {
                    tracing::debug!("Stored paste {} ({} bytes)", id, content.len());
                    return Ok(id);
                }
                Err(AppError::IdentifierCollision(_)) => {
                    tracing::debug!("Paste id {} is live, retrying (attempt {})", id, attempt);
                }
                Err(err) => return Err(err),
            }
        }
        tracing::error!("Gave up allocating a paste id after {} attempts", MAX_ID_ATTEMPTS);
        Err(AppError::GeneratorExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}
