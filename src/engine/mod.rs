// Parley Chat Engine — client-side session and room-synchronization coordinator
// Layers a realtime WebSocket channel over a stateless JSON/REST API:
// token-refreshing auth, leave-before-join room switching, history/live
// stream reconciliation, and the scroll-follow heuristic.

pub mod auth;
pub mod channel;
pub mod client;
pub mod config;
pub mod directory;
pub mod http;
pub mod room;
pub mod scroll;

#[cfg(test)]
pub(crate) mod testutil;
