//! Core domain library for tempaste (expiring store, ids, ingest, rendering).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across tempaste crates.
pub mod constants;
/// Application error types.
pub mod error;
/// Paste identifier generation.
pub mod generator;
/// Shared ingest path used by every transport adapter.
pub mod ingest;
/// Paste record and response models.
pub mod models;
/// Markup rendering for stored pastes.
pub mod render;
/// Expiring in-memory paste store.
pub mod store;

pub use config::Config;
pub use constants::{DEFAULT_PORT, DEFAULT_TCP_PORT, PASTE_TTL};
pub use error::AppError;
pub use generator::{IdGenerator, RandomHexGenerator};
pub use ingest::IngestService;
pub use models::{CreatedPaste, PasteRecord};
pub use render::{HtmlRenderer, Renderer};
pub use store::PasteStore;
