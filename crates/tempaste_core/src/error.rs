//! Application error types for the store, generator, and ingest paths.
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Paste content is empty")]
    EmptyPayload,

    #[error("Paste size exceeds maximum of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Invalid paste id: {0}")]
    InvalidId(String),

    #[error("Not found")]
    NotFound,

    #[error("Paste id already in use: {0}")]
    IdentifierCollision(String),

    #[error("Could not allocate a free paste id after {attempts} attempts")]
    GeneratorExhausted { attempts: usize },

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl AppError {
    /// Whether the error was caused by the client's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyPayload | Self::PayloadTooLarge { .. } | Self::InvalidId(_) | Self::NotFound
        )
    }
}
