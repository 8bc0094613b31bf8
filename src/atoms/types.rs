// ── Parley Atoms: Pure Data Types ──────────────────────────────────────────
// All plain struct/enum definitions with no logic beyond tiny constructors.
// Atoms layer rule: no I/O, no side effects, no imports from engine/.
//
// Every REST body and channel frame the server speaks has an explicit type
// here, validated with serde at the boundary instead of being poked out of
// loose `Value`s at each call site.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::atoms::constants::ROOM_KEY_SEPARATOR;

// ── Session identity ───────────────────────────────────────────────────────

/// The client's authenticated identity plus its access/refresh token pair.
/// At most one of these is live per client process; it is created on
/// sign-in, has its access token replaced in place on refresh, and is
/// cleared wholesale on sign-out.
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub access: String,
    pub refresh: String,
}

// Tokens never reach log output.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

// ── Chat messages ──────────────────────────────────────────────────────────

/// A single chat message as the server broadcasts it. `date_time` is an
/// opaque server-formatted string; the client never parses or compares it —
/// log order is arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    pub text: String,
    #[serde(rename = "dateTime")]
    pub date_time: String,
}

// ── Room keys ──────────────────────────────────────────────────────────────

/// Compose a room key of the form `owner#discriminator`.
pub fn compose_room_key(owner: &str, discriminator: u32) -> String {
    format!("{}{}{}", owner, ROOM_KEY_SEPARATOR, discriminator)
}

// ── REST request bodies ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRoomRequest {
    pub username: String,
    /// Room visibility; the reference server only knows "public".
    #[serde(rename = "type")]
    pub kind: String,
    pub room: String,
}

/// Shared body for `add_user_to_chat` / `remove_user_from_chat`.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipRequest {
    pub username: String,
    pub room: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveMessageRequest {
    pub username: String,
    pub room: String,
    pub text: String,
}

// ── REST response bodies ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigninResponse {
    #[serde(default)]
    pub message: String,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomsResponse {
    #[serde(default)]
    pub rooms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindChatsResponse {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub rooms: Vec<String>,
}

/// `save_message` echoes back the stored text and the authoritative
/// server-side timestamp; `msg` is a human-readable status line.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveMessageResponse {
    pub message: String,
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

// ── Channel frames ─────────────────────────────────────────────────────────
// The realtime channel speaks adjacently tagged JSON frames:
//   {"event": "join", "data": {"username": "alice", "room": "alice#42"}}
// Outbound and inbound vocabularies are disjoint, so they are separate enums.

/// Control frames the client emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Scope this connection's subscription to `room`.
    Join { username: String, room: String },
    /// Stop forwarding to this connection. No payload, never acknowledged.
    Leave {},
    /// Sent after server-side membership removal has completed.
    Exit {},
    /// Broadcast an already-persisted message to the other subscribers.
    Message {
        message: String,
        #[serde(rename = "dateTime")]
        date_time: String,
    },
    /// Broadcast an already-persisted system announcement (arrival or
    /// departure) into a room this connection may not be subscribed to.
    ConnectRoom {
        message: String,
        #[serde(rename = "dateTime")]
        date_time: String,
        username: String,
        room: String,
    },
}

impl ClientEvent {
    /// Wire name of the frame, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Join { .. } => "join",
            ClientEvent::Leave {} => "leave",
            ClientEvent::Exit {} => "exit",
            ClientEvent::Message { .. } => "message",
            ClientEvent::ConnectRoom { .. } => "connect_room",
        }
    }
}

/// Frames the server pushes to the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message for the room this connection is currently scoped to.
    Message(ChatMessage),
}

// ── Generic API request/response ───────────────────────────────────────────
// The transport-level shape every REST call reduces to. Kept here (pure data)
// so both the reqwest transport and the test fakes share it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Bearer credential; filled in by the `ApiClient` choke point, never by
    /// individual components.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest { method: HttpMethod::Get, path: path.into(), query: vec![], body: None, bearer: None }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest { method: HttpMethod::Post, path: path.into(), query: vec![], body: Some(body), bearer: None }
    }

    pub fn patch(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest { method: HttpMethod::Patch, path: path.into(), query: vec![], body: Some(body), bearer: None }
    }

    pub fn delete(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest { method: HttpMethod::Delete, path: path.into(), query: vec![], body: Some(body), bearer: None }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    /// 2xx check.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort extraction of the server's human-readable error line.
    pub fn message(&self) -> String {
        self.body
            .get("msg")
            .or_else(|| self.body.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
