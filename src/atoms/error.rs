// ── Parley Atoms: Error Types ──────────────────────────────────────────────
// Single canonical error enum for the engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (network, API, auth, channel…).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • `AuthExpired` is terminal: the single refresh-and-retry cycle has
//     already run by the time a caller sees it.
//   • No variant carries secret material (tokens, passwords) in its message.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The API answered with a non-success, non-auth status. The message is
    /// whatever the server put in its `msg`/`message` field.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The access token was rejected even after the one permitted
    /// refresh-and-retry cycle.
    #[error("Authorization expired")]
    AuthExpired,

    /// The refresh call itself failed, or no session is live. The stored
    /// session is left untouched for the caller to inspect or clear.
    #[error("Auth error: {0}")]
    AuthInvalid(String),

    /// Realtime channel failure (connect, send, or codec).
    #[error("Channel error: {0}")]
    Channel(String),

    /// Client configuration is invalid (bad base URL, unsupported scheme…).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Other(String),
}

// ── Convenience constructors ───────────────────────────────────────────────

impl ClientError {
    /// Create an API error from a status code and server message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api { status, message: message.into() }
    }

    /// Create a channel error with a message.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel(message.into())
    }
}

impl From<String> for ClientError {
    fn from(s: String) -> Self {
        ClientError::Other(s)
    }
}

impl From<&str> for ClientError {
    fn from(s: &str) -> Self {
        ClientError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All engine operations should return this type.
pub type ClientResult<T> = Result<T, ClientError>;
