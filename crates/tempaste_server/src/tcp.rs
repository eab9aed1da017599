//! Raw TCP ingest adapter.
//!
//! A client connects, writes its paste, and half-closes the connection. The
//! end of the stream delimits the payload. The server answers with a single
//! line holding the retrieval URL and closes its side.
//!
//! ```text
//! echo "hello" | nc -q 1 localhost 9999
//! ```

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tempaste_core::{models::paste_url, AppError, IngestService};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

const READ_CHUNK: usize = 8 * 1024;
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Per-connection settings for the streaming adapter.
#[derive(Debug, Clone)]
pub struct TcpSettings {
    /// Base address of the HTTP side, used to build retrieval URLs.
    pub base_url: String,
    /// Idle time allowed between reads before the connection is dropped.
    pub read_timeout: Duration,
}

/// Read a whole payload until the peer closes its write side.
///
/// # Errors
/// - [`AppError::PayloadTooLarge`] as soon as more than `limit` bytes arrive.
/// - [`AppError::Transport`] on read failures or when no data arrives within `idle_timeout`.
pub async fn read_payload<R>(
    reader: &mut R,
    limit: usize,
    idle_timeout: Duration,
) -> Result<Vec<u8>, AppError>
where
    R: AsyncRead + Unpin,
{
    let mut payload = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let read = tokio::time::timeout(idle_timeout, reader.read(&mut chunk))
            .await
            .map_err(|_| {
                AppError::Transport(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "timed out waiting for paste data",
                ))
            })??;
        if read == 0 {
            return Ok(payload);
        }
        if payload.len() + read > limit {
            return Err(AppError::PayloadTooLarge { limit });
        }
        payload.extend_from_slice(&chunk[..read]);
    }
}

/// Serve a single streaming connection.
///
/// # Returns
/// The id of the stored paste, or `None` when the payload was blank.
///
/// A paste that was stored is reported as `Ok` even when the reply could not
/// be delivered.
///
/// # Errors
/// Transport failures while reading and rejected payloads. Nothing is stored
/// in either case.
pub async fn handle_connection<S>(
    mut stream: S,
    ingest: &IngestService,
    settings: &TcpSettings,
) -> Result<Option<String>, AppError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let limit = ingest.store().max_content_size();
    let payload = match read_payload(&mut stream, limit, settings.read_timeout).await {
        Ok(payload) => payload,
        Err(err @ AppError::PayloadTooLarge { .. }) => {
            let line = format!("Error: {}\n", err);
            // Best effort; the client may already be gone.
            let _ = stream.write_all(line.as_bytes()).await;
            let _ = stream.shutdown().await;
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    let stored = ingest.ingest_stream(&payload)?;
    let Some(id) = stored else {
        // Nothing to report; a failed close loses nothing.
        let _ = stream.shutdown().await;
        return Ok(None);
    };

    let line = format!(
        "Paste available at: {}\n",
        paste_url(&settings.base_url, &id)
    );
    let replied = match stream.write_all(line.as_bytes()).await {
        Ok(()) => stream.shutdown().await,
        Err(err) => Err(err),
    };
    // The paste is stored either way.
    if let Err(err) = replied {
        tracing::warn!("Paste {} created but the reply was lost: {}", id, err);
    }
    Ok(Some(id))
}

/// Accept streaming connections until `shutdown` resolves.
///
/// Each connection runs in its own task; a failing connection never affects
/// the listener or other connections.
///
/// # Errors
/// Currently infallible; accept errors are logged and retried.
pub async fn serve_tcp(
    listener: TcpListener,
    ingest: IngestService,
    settings: TcpSettings,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), io::Error> {
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("TCP ingest listener shutting down");
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let ingest = ingest.clone();
                    let settings = settings.clone();
                    tokio::spawn(async move {
                        let outcome = handle_connection(stream, &ingest, &settings).await;
                        log_outcome(peer, outcome);
                    });
                }
                Err(err) => {
                    tracing::warn!("Failed to accept TCP connection: {}", err);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

fn log_outcome(peer: SocketAddr, outcome: Result<Option<String>, AppError>) {
    match outcome {
        Ok(Some(id)) => tracing::info!("Created paste {} via TCP from {}", id, peer),
        Ok(None) => tracing::debug!("Blank TCP payload from {}, nothing stored", peer),
        Err(AppError::Transport(err)) => {
            tracing::warn!("TCP connection from {} dropped: {}", peer, err)
        }
        Err(err) if err.is_client_error() => {
            tracing::warn!("Rejected TCP payload from {}: {}", peer, err)
        }
        Err(err) => tracing::error!("Failed to store TCP paste from {}: {}", peer, err),
    }
}
