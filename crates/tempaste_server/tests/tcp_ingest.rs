//! Integration tests for the raw TCP ingest listener.

mod support;

use axum::http::StatusCode;
use std::net::SocketAddr;
use std::time::Duration;
use support::{setup_test_server, test_server_for_state};
use tempaste_server::{serve_tcp, AppState, TcpSettings};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

struct TcpHarness {
    addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TcpHarness {
    async fn start(state: &AppState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (stop, stopped) = oneshot::channel::<()>();
        let settings = TcpSettings {
            base_url: "http://paste.test".to_string(),
            read_timeout: Duration::from_secs(5),
        };
        let task = tokio::spawn(serve_tcp(
            listener,
            state.ingest.clone(),
            settings,
            async move {
                let _ = stopped.await;
            },
        ));
        Self {
            addr,
            stop: Some(stop),
            task,
        }
    }

    async fn send(&self, payload: &[u8]) -> String {
        let mut stream = TcpStream::connect(self.addr).await.expect("connect");
        stream.write_all(payload).await.expect("write");
        stream.shutdown().await.expect("half close");
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.expect("reply");
        reply
    }

    async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.await.expect("join").expect("listener result");
    }
}

fn id_from_reply(reply: &str) -> String {
    let url = reply
        .trim_end()
        .strip_prefix("Paste available at: ")
        .expect("confirmation line");
    url.rsplit('/').next().expect("id").to_string()
}

#[tokio::test]
async fn tcp_upload_is_readable_over_http() {
    let (_, state) = setup_test_server();
    let harness = TcpHarness::start(&state).await;

    let reply = harness.send(b"echo from the terminal\n").await;
    assert!(reply.starts_with("Paste available at: http://paste.test/"));
    assert!(reply.ends_with('\n'));
    let id = id_from_reply(&reply);

    let server = test_server_for_state(state.clone());
    let page = server.get(&format!("/{}", id)).await;
    assert_eq!(page.status_code(), StatusCode::OK);
    assert!(page.text().contains("echo from the terminal"));

    harness.stop().await;
}

#[tokio::test]
async fn tcp_blank_upload_creates_nothing() {
    let (_, state) = setup_test_server();
    let harness = TcpHarness::start(&state).await;

    let reply = harness.send(b"   \n\n\t").await;
    assert!(reply.is_empty());
    assert!(state.store().is_empty());

    harness.stop().await;
}

async fn wait_for_live_pastes(state: &AppState, expected: usize) {
    for _ in 0..100 {
        if state.store().len() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} live pastes, found {}",
        expected,
        state.store().len()
    );
}

#[tokio::test]
async fn tcp_client_that_closes_without_reading_still_creates_paste() {
    let (_, state) = setup_test_server();
    let harness = TcpHarness::start(&state).await;

    {
        let mut stream = TcpStream::connect(harness.addr).await.expect("connect");
        stream.write_all(b"half a paste").await.expect("write");
    }

    let reply = harness.send(b"still serving").await;
    let id = id_from_reply(&reply);
    assert_eq!(
        state.store().peek(&id).expect("record").content,
        "still serving"
    );

    // Closing the socket ends the payload, so the first upload is stored too.
    wait_for_live_pastes(&state, 2).await;

    harness.stop().await;
}

#[tokio::test]
#[allow(deprecated)]
async fn tcp_connection_reset_mid_upload_creates_nothing() {
    let (_, state) = setup_test_server();
    let harness = TcpHarness::start(&state).await;

    {
        let mut stream = TcpStream::connect(harness.addr).await.expect("connect");
        stream.write_all(b"cut short").await.expect("write");
        // Zero linger turns the close into a reset instead of an orderly FIN.
        stream.set_linger(Some(Duration::ZERO)).expect("linger");
    }

    let reply = harness.send(b"after the reset").await;
    let id = id_from_reply(&reply);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.store().len(), 1);
    assert_eq!(
        state.store().peek(&id).expect("record").content,
        "after the reset"
    );

    harness.stop().await;
}

#[tokio::test]
async fn tcp_uploads_from_many_clients_land_in_one_store() {
    let (_, state) = setup_test_server();
    let harness = TcpHarness::start(&state).await;

    let replies = futures_join(&harness).await;
    let mut ids: Vec<String> = replies.iter().map(|reply| id_from_reply(reply)).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    assert_eq!(state.store().len(), 4);

    harness.stop().await;
}

async fn futures_join(harness: &TcpHarness) -> Vec<String> {
    let (a, b, c, d) = tokio::join!(
        harness.send(b"one"),
        harness.send(b"two"),
        harness.send(b"three"),
        harness.send(b"four"),
    );
    vec![a, b, c, d]
}
