//! Paste HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use tempaste_core::{AppError, Config, CreatedPaste, PasteRecord};

/// Base address for retrieval URLs built while answering an HTTP request.
///
/// `PUBLIC_URL` wins; otherwise the request's `Host` header is trusted, and
/// as a last resort the configured port on localhost.
pub(crate) fn request_base_url(config: &Config, headers: &HeaderMap) -> String {
    if let Some(url) = &config.public_url {
        return url.clone();
    }
    headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(|host| format!("http://{}", host))
        .unwrap_or_else(|| format!("http://localhost:{}", config.port))
}

/// Store a raw request body as a new paste.
///
/// # Returns
/// `{ "url", "id" }` for the stored paste.
///
/// # Errors
/// Rejects empty and oversized bodies without storing anything.
pub async fn create_paste(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<CreatedPaste>, Response> {
    let body = body.map_err(|rejection| body_rejection(&state.config, rejection))?;
    let id = state
        .ingest
        .ingest(&body)
        .map_err(|err| HttpError(err).into_response())?;
    let base_url = request_base_url(&state.config, &headers);
    tracing::info!("Created paste {} via HTTP ({} bytes)", id, body.len());
    Ok(Json(CreatedPaste::new(&base_url, id)))
}

/// Report bodies cut off by the body limit in the same JSON shape as other API errors.
fn body_rejection(config: &Config, rejection: BytesRejection) -> Response {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return HttpError(AppError::PayloadTooLarge {
            limit: config.max_paste_size,
        })
        .into_response();
    }
    tracing::warn!("Failed to read paste body: {}", rejection.body_text());
    rejection.into_response()
}

/// Render a paste as an HTML page.
///
/// Missing and expired pastes both get the same 404 page.
pub async fn view_paste(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store().get(&id) {
        Some(paste) => Html(state.renderer.render_paste(&paste)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html(state.renderer.render_not_found(&id)),
        )
            .into_response(),
    }
}

/// Fetch a paste as JSON. Counts as a view.
///
/// # Errors
/// Returns 404 when the paste is missing or expired.
pub async fn get_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PasteRecord>, HttpError> {
    state
        .store()
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound.into())
}

/// Liveness probe reporting the number of live pastes.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "live_pastes": state.store().len(),
    }))
}
