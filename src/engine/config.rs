// Parley Chat Engine — Client Configuration
// Where the API lives and where the realtime channel lives. The channel URL
// is derived from the API base (http→ws, https→wss, plus CHANNEL_PATH)
// unless explicitly overridden.

use log::warn;
use serde::Deserialize;

use crate::atoms::constants::{CHANNEL_PATH, CONNECT_TIMEOUT_SECS, DEFAULT_API_BASE, REQUEST_TIMEOUT_SECS};
use crate::atoms::error::{ClientError, ClientResult};

// ── Config ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the REST API, e.g. "http://127.0.0.1:5000".
    pub api_base: String,
    /// Realtime channel URL override, e.g. "ws://127.0.0.1:5000/ws".
    pub channel_url: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_base: DEFAULT_API_BASE.into(),
            channel_url: None,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment, falling back to defaults.
    /// Recognized variables: `PARLEY_API_BASE`, `PARLEY_CHANNEL_URL`.
    pub fn from_env() -> Self {
        let mut config = ClientConfig::default();
        if let Ok(base) = std::env::var("PARLEY_API_BASE") {
            if !base.trim().is_empty() {
                config.api_base = base;
            }
        }
        if let Ok(url) = std::env::var("PARLEY_CHANNEL_URL") {
            if !url.trim().is_empty() {
                config.channel_url = Some(url);
            }
        }
        config
    }

    /// Validated, trailing-slash-free API base.
    pub fn normalized_api_base(&self) -> ClientResult<String> {
        normalize_base_url(&self.api_base)
    }

    /// The channel URL: the explicit override, or the API base with its
    /// scheme mapped to ws/wss and `CHANNEL_PATH` appended.
    pub fn normalized_channel_url(&self) -> ClientResult<String> {
        if let Some(url) = &self.channel_url {
            let url = url.trim().trim_end_matches('/');
            if url.starts_with("ws://") || url.starts_with("wss://") {
                return Ok(url.to_string());
            }
            return Err(ClientError::Config(format!(
                "Channel URL must use ws:// or wss://, got '{}'",
                url
            )));
        }
        let base = self.normalized_api_base()?;
        let ws_base = if base.starts_with("https://") {
            base.replacen("https", "wss", 1)
        } else {
            base.replacen("http", "ws", 1)
        };
        Ok(format!("{}{}", ws_base, CHANNEL_PATH))
    }
}

// ── URL normalization ──────────────────────────────────────────────────────

/// Normalize an API base URL:
/// - strips whitespace and trailing slashes
/// - rejects non-http(s) schemes
/// - assumes http:// for bare host:port (the reference server is local dev)
fn normalize_base_url(raw: &str) -> ClientResult<String> {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(ClientError::Config("API base URL is required".into()));
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(url.to_string());
    }

    if let Some(colon_pos) = url.find("://") {
        let scheme = &url[..colon_pos];
        return Err(ClientError::Config(format!(
            "Unsupported URL scheme '{}://' for the API base",
            scheme
        )));
    }

    warn!("[config] No URL scheme provided, assuming http://{}", url);
    Ok(format!("http://{}", url))
}

// ── Tests ──────────────────────────────────────────────────────────────────
