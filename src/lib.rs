// Parley — realtime chat client engine.
//
// The crate is split into two layers:
//   atoms/  — pure data: constants, wire types, error types, the two
//             transport traits. No I/O anywhere.
//   engine/ — the working parts: authenticated HTTP choke point, session
//             identity, room directory, room session state machine, the
//             realtime channel, and the scroll-follow heuristic.
//
// `ChatClient::connect` is the front door; everything it is built from is
// public for embedders that want to wire the parts themselves.

pub mod atoms;
pub mod engine;

pub use atoms::constants::{MESSAGE_MAX_CHARS, SCROLL_FOLLOW_THRESHOLD_PX};
pub use atoms::error::{ClientError, ClientResult};
pub use atoms::traits::{ApiTransport, ChannelTransport};
pub use atoms::types::{ChatMessage, ClientEvent, ServerEvent, Session};
pub use engine::auth::{AuthService, TokenStore};
pub use engine::channel::{ChannelHandle, RoomSubscription, WsChannel};
pub use engine::client::ChatClient;
pub use engine::config::ClientConfig;
pub use engine::directory::RoomDirectory;
pub use engine::http::{ApiClient, HttpApi};
pub use engine::room::{JoinTicket, RoomSession, RoomState};
pub use engine::scroll::ScrollAnchor;
