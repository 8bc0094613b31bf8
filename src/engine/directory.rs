// Parley Chat Engine — Room Directory
//
// The caller's room list versus search results. The two views are mutually
// exclusive: a non-empty query flips the directory into search mode (room
// clicks mean "ask to join"); clearing it discards every residual result
// and re-fetches the caller's own rooms. Local state mutates only after the
// server has confirmed — nothing here needs a rollback path.

use std::sync::Arc;

use log::{debug, info};
use rand::Rng;

use crate::atoms::constants::ROOM_DISCRIMINATOR_BOUND;
use crate::atoms::error::{ClientError, ClientResult};
use crate::atoms::types::{compose_room_key, CreateRoomRequest};
use crate::engine::auth::TokenStore;
use crate::engine::http::ApiClient;

pub struct RoomDirectory {
    api: Arc<ApiClient>,
    store: Arc<TokenStore>,
    rooms: Vec<String>,
    users: Vec<String>,
    searching: bool,
}

impl RoomDirectory {
    pub fn new(api: Arc<ApiClient>, store: Arc<TokenStore>) -> Self {
        RoomDirectory { api, store, rooms: Vec::new(), users: Vec::new(), searching: false }
    }

    // ── Views ──────────────────────────────────────────────────────────────

    /// Own rooms, or matching rooms while in search mode.
    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// Matching users; empty outside search mode.
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// In search mode, room clicks mean "request to join" instead of
    /// "select".
    pub fn is_searching(&self) -> bool {
        self.searching
    }

    // ── Operations ─────────────────────────────────────────────────────────

    /// Fetch the caller's own room list and replace the current one
    /// wholesale.
    pub async fn refresh(&mut self) -> ClientResult<()> {
        let username = self.require_user()?;
        let rooms = self.api.rooms_for(&username).await?;
        debug!("[directory] Fetched {} rooms for {}", rooms.len(), username);
        self.rooms = rooms;
        Ok(())
    }

    /// Run a user/room search, or — for an empty query — leave search mode
    /// and restore the caller's own room list.
    pub async fn search(&mut self, query: &str) -> ClientResult<()> {
        if query.is_empty() {
            self.users.clear();
            self.searching = false;
            return self.refresh().await;
        }

        let username = self.require_user()?;
        let results = self.api.find_chats(query, &username).await?;
        debug!(
            "[directory] Search '{}' matched {} users, {} rooms",
            query,
            results.users.len(),
            results.rooms.len()
        );
        self.users = results.users;
        self.rooms = results.rooms;
        self.searching = true;
        Ok(())
    }

    /// Create a room keyed `owner#discriminator` with a freshly drawn random
    /// discriminator, and append it locally on success — no follow-up fetch.
    /// Discriminator collisions are possible and not checked.
    pub async fn create_room(&mut self) -> ClientResult<String> {
        let username = self.require_user()?;
        let discriminator = rand::rng().random_range(0..ROOM_DISCRIMINATOR_BOUND);
        let room = compose_room_key(&username, discriminator);

        let request =
            CreateRoomRequest { username, kind: "public".into(), room: room.clone() };
        self.api.create_room(&request).await?;

        info!("[directory] Created room {}", room);
        self.rooms.push(room.clone());
        Ok(room)
    }

    /// Drop a room from the visible search results after a confirmed join.
    pub fn remove_search_result(&mut self, room: &str) {
        self.rooms.retain(|r| r != room);
    }

    /// Forget everything local (sign-out).
    pub fn clear_local(&mut self) {
        self.rooms.clear();
        self.users.clear();
        self.searching = false;
    }

    fn require_user(&self) -> ClientResult<String> {
        self.store
            .username()
            .ok_or_else(|| ClientError::AuthInvalid("no active session".into()))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{api_client, signed_in_store, status_response, ScriptedApi};
    use serde_json::json;

    fn directory(transport: Arc<ScriptedApi>) -> RoomDirectory {
        let client = api_client(transport);
        let store = client.store().clone();
        RoomDirectory::new(Arc::new(client), store)
    }

    fn chat_transport() -> Arc<ScriptedApi> {
        ScriptedApi::new(|req| match req.path.as_str() {
            "/chat/get_rooms" => status_response(200, json!({"rooms": ["alice#1", "alice#2"]})),
            "/chat/find_chats" => {
                status_response(200, json!({"users": ["bob"], "rooms": ["bob#9"]}))
            }
            "/chat/create_room" => status_response(201, json!({"msg": "Room created!"})),
            other => panic!("unexpected path {}", other),
        })
    }

    #[tokio::test]
    async fn test_refresh_replaces_room_list_wholesale() {
        let mut dir = directory(chat_transport());
        dir.rooms = vec!["stale#0".into()];

        dir.refresh().await.unwrap();

        assert_eq!(dir.rooms(), ["alice#1", "alice#2"]);
        assert!(!dir.is_searching());
    }

    #[tokio::test]
    async fn test_search_enters_search_mode_and_replaces_both_lists() {
        let mut dir = directory(chat_transport());
        dir.refresh().await.unwrap();

        dir.search("bo").await.unwrap();

        assert!(dir.is_searching());
        assert_eq!(dir.users(), ["bob"]);
        assert_eq!(dir.rooms(), ["bob#9"]);
    }

    #[tokio::test]
    async fn test_clearing_query_restores_exactly_the_own_room_list() {
        let mut dir = directory(chat_transport());
        dir.search("bo").await.unwrap();

        dir.search("").await.unwrap();

        assert!(!dir.is_searching());
        assert!(dir.users().is_empty());
        assert_eq!(dir.rooms(), ["alice#1", "alice#2"]);
    }

    #[tokio::test]
    async fn test_create_room_appends_locally_without_refetch() {
        let transport = chat_transport();
        let mut dir = directory(transport.clone());

        let room = dir.create_room().await.unwrap();

        let (owner, discriminator) = room.split_once('#').unwrap();
        assert_eq!(owner, "alice");
        assert!(discriminator.parse::<u32>().unwrap() < ROOM_DISCRIMINATOR_BOUND);
        assert_eq!(dir.rooms(), [room.as_str()]);
        assert_eq!(transport.count("/chat/get_rooms"), 0);
    }

    #[tokio::test]
    async fn test_failed_search_leaves_previous_view_untouched() {
        let transport = ScriptedApi::new(|req| match req.path.as_str() {
            "/chat/get_rooms" => status_response(200, json!({"rooms": ["alice#1"]})),
            "/chat/find_chats" => status_response(500, json!({"msg": "boom"})),
            other => panic!("unexpected path {}", other),
        });
        let mut dir = directory(transport);
        dir.refresh().await.unwrap();

        assert!(dir.search("bo").await.is_err());

        assert!(!dir.is_searching());
        assert_eq!(dir.rooms(), ["alice#1"]);
    }

    #[tokio::test]
    async fn test_requires_an_active_session() {
        let transport = chat_transport();
        let store = Arc::new(TokenStore::new());
        let api = Arc::new(ApiClient::new(transport, store.clone()));
        let mut dir = RoomDirectory::new(api, store);

        assert!(matches!(dir.refresh().await, Err(ClientError::AuthInvalid(_))));
    }

    #[test]
    fn test_remove_search_result_is_local_only() {
        let store = signed_in_store();
        let transport = chat_transport();
        let api = Arc::new(ApiClient::new(transport.clone(), store.clone()));
        let mut dir = RoomDirectory::new(api, store);
        dir.rooms = vec!["bob#9".into(), "carol#3".into()];

        dir.remove_search_result("bob#9");

        assert_eq!(dir.rooms(), ["carol#3"]);
        assert!(transport.calls().is_empty());
    }
}
