//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_MAX_PASTE_SIZE, DEFAULT_PORT, DEFAULT_TCP_PORT, DEFAULT_TCP_READ_TIMEOUT, PASTE_TTL,
};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration for tempaste.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub tcp_port: u16,
    pub max_paste_size: usize,
    /// Base address used when building retrieval URLs, e.g. `https://paste.example.com`.
    pub public_url: Option<String>,
    pub tcp_read_timeout: Duration,
    pub tcp_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tcp_port: DEFAULT_TCP_PORT,
            max_paste_size: DEFAULT_MAX_PASTE_SIZE,
            public_url: None,
            tcp_read_timeout: DEFAULT_TCP_READ_TIMEOUT,
            tcp_enabled: true,
        }
    }
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}='{}'", key, raw);
            None
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            tcp_port: parsed(&lookup, "TCP_PORT").unwrap_or(defaults.tcp_port),
            max_paste_size: parsed(&lookup, "MAX_PASTE_SIZE").unwrap_or(defaults.max_paste_size),
            public_url: lookup("PUBLIC_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            tcp_read_timeout: parsed(&lookup, "TCP_READ_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.tcp_read_timeout),
            tcp_enabled: !lookup("DISABLE_TCP")
                .and_then(|value| parse_env_flag(&value))
                .unwrap_or(false),
        }
    }

    /// Paste lifetime. Fixed today; kept here so callers never hardcode it.
    pub fn ttl(&self) -> Duration {
        PASTE_TTL
    }

    /// Base URL advertised on the streaming adapter.
    ///
    /// Raw TCP clients send no `Host` header, so fall back to the HTTP listener address.
    pub fn tcp_base_url(&self, http_addr: SocketAddr) -> String {
        match &self.public_url {
            Some(url) => url.clone(),
            None => format!("http://{}", http_addr),
        }
    }
}
