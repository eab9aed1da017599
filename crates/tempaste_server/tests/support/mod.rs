//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use std::time::Duration;
use tempaste_server::{create_app, AppState, Config, PasteStore, PASTE_TTL};

pub(crate) fn test_config(max_paste_size: usize) -> Config {
    Config {
        port: 0,
        max_paste_size,
        tcp_enabled: false,
        ..Config::default()
    }
}

pub(crate) fn test_server_for_state(state: AppState) -> TestServer {
    TestServer::new(create_app(state)).expect("server")
}

pub(crate) fn setup_test_server() -> (TestServer, AppState) {
    setup_test_server_with(test_config(2 * 1024 * 1024), PASTE_TTL)
}

pub(crate) fn setup_test_server_with(config: Config, ttl: Duration) -> (TestServer, AppState) {
    let store = PasteStore::with_limits(ttl, config.max_paste_size);
    let state = AppState::with_store(config, store);
    (test_server_for_state(state.clone()), state)
}
