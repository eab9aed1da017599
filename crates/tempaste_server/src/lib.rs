//! HTTP and raw TCP front-ends for tempaste, sharing one expiring store.

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for paste endpoints.
pub mod handlers;
/// Raw TCP ingest adapter.
pub mod tcp;

pub use tempaste_core::{
    config, AppError, Config, IngestService, PasteRecord, PasteStore, DEFAULT_PORT, PASTE_TTL,
};
pub use tcp::{serve_tcp, TcpSettings};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tempaste_core::{HtmlRenderer, Renderer};
use tower_http::{
    compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'none'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; frame-ancestors 'none'; base-uri 'none'; form-action 'none'";

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingest: IngestService,
    pub config: Arc<Config>,
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    /// Construct shared application state with a fresh store.
    ///
    /// Must run inside a tokio runtime so the store can reap expired pastes.
    pub fn new(config: Config) -> Self {
        let store = PasteStore::with_limits(config.ttl(), config.max_paste_size);
        Self::with_store(config, store)
    }

    /// Construct shared application state around an existing store.
    pub fn with_store(config: Config, store: PasteStore) -> Self {
        Self {
            ingest: IngestService::new(store),
            config: Arc::new(config),
            renderer: Arc::new(HtmlRenderer),
        }
    }

    /// Replace the renderer used for HTML paste pages.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// The store shared by every adapter.
    pub fn store(&self) -> &PasteStore {
        self.ingest.store()
    }
}

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_paste_size;

    Router::new()
        .route("/paste", post(handlers::paste::create_paste))
        .route("/health", get(handlers::paste::health))
        .route("/api/paste/:id", get(handlers::paste::get_paste))
        .route("/:id", get(handlers::paste::view_paste))
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

/// Resolve a listener address from an optional override and the security policy.
///
/// # Arguments
/// - `requested`: Raw override value (e.g. from `BIND`), if any.
/// - `default_port`: Port used when no valid override is given.
/// - `allow_public_access`: Whether non-loopback bind targets are permitted.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(
    requested: Option<&str>,
    default_port: u16,
    allow_public_access: bool,
) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], default_port));
    let requested = match requested {
        Some(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid bind address '{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        None => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

/// Run the Axum server with graceful shutdown support.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}
