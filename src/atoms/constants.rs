// ── Parley Atoms: Constants ────────────────────────────────────────────────
// All named constants for the crate live here.
// Rationale: collecting constants in one place eliminates magic strings,
// makes auditing easier, and keeps every layer's code self-documenting.

// ── API defaults ───────────────────────────────────────────────────────────
// The reference server is a local JSON API; both URLs can be overridden
// through `ClientConfig` / environment (see engine/config.rs).
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

/// Path the realtime channel is served on, relative to the API base.
pub const CHANNEL_PATH: &str = "/ws";

// ── HTTP client timeouts ───────────────────────────────────────────────────
pub(crate) const CONNECT_TIMEOUT_SECS: u64 = 10;
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;

// ── Message limits ─────────────────────────────────────────────────────────
// The server truncates nothing; the 192-char bound is enforced client-side
// before a message is ever persisted.
pub const MESSAGE_MAX_CHARS: usize = 192;

// ── Room keys ──────────────────────────────────────────────────────────────
// Room keys have the shape `owner#discriminator`. The discriminator is drawn
// uniformly from `0..ROOM_DISCRIMINATOR_BOUND` at creation time; collisions
// are possible and not checked anywhere.
pub const ROOM_KEY_SEPARATOR: char = '#';
pub const ROOM_DISCRIMINATOR_BOUND: u32 = 1000;

// ── Scroll follow heuristic ────────────────────────────────────────────────
// A viewer within this many pixels of the bottom at last render is "pinned"
// and follows new messages; anyone further up is reading history and must
// not be interrupted.
pub const SCROLL_FOLLOW_THRESHOLD_PX: f64 = 48.0;

// ── Channel keepalive ──────────────────────────────────────────────────────
// Idle interval after which the read pump sends a WebSocket ping.
pub(crate) const CHANNEL_KEEPALIVE_SECS: u64 = 60;
