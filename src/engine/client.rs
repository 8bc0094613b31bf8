// Parley Chat Engine — Client Facade
//
// Wires the auth flows, the authenticated HTTP choke point, the room
// directory, the room session, and the scroll anchor into the handful of
// UI intents a chat page actually expresses. Cross-component operations —
// exit-then-refresh, join-then-prune-search-results — have their one owner
// here; no protocol logic of its own.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::atoms::error::ClientResult;
use crate::atoms::types::ServerEvent;
use crate::engine::auth::{AuthService, TokenStore};
use crate::engine::channel::{ChannelHandle, WsChannel};
use crate::engine::config::ClientConfig;
use crate::engine::directory::RoomDirectory;
use crate::engine::http::{ApiClient, HttpApi};
use crate::engine::room::{RoomSession, RoomState};
use crate::engine::scroll::ScrollAnchor;

pub struct ChatClient {
    auth: AuthService,
    directory: RoomDirectory,
    session: RoomSession,
    scroll: ScrollAnchor,
}

impl ChatClient {
    /// Connect to the configured server: build the HTTP stack and establish
    /// the process-wide channel connection. Returns the client plus the
    /// inbound event queue the driver must drain into `handle_event`.
    pub async fn connect(
        config: &ClientConfig,
    ) -> ClientResult<(Self, mpsc::UnboundedReceiver<ServerEvent>)> {
        let store = Arc::new(TokenStore::new());
        let transport = Arc::new(HttpApi::new(config)?);
        let api = Arc::new(ApiClient::new(transport, store.clone()));

        let (ws, events) = WsChannel::connect(&config.normalized_channel_url()?).await?;
        let channel = ChannelHandle::new(ws);

        Ok((ChatClient::from_parts(api, store, channel), events))
    }

    /// Assemble a client from already-built parts. This is the seam the
    /// tests use; `connect` is the production path.
    pub fn from_parts(api: Arc<ApiClient>, store: Arc<TokenStore>, channel: ChannelHandle) -> Self {
        ChatClient {
            auth: AuthService::new(api.clone(), store.clone()),
            directory: RoomDirectory::new(api.clone(), store.clone()),
            session: RoomSession::new(api, store, channel),
            scroll: ScrollAnchor::new(),
        }
    }

    // ── Views ──────────────────────────────────────────────────────────────

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    pub fn session(&self) -> &RoomSession {
        &self.session
    }

    pub fn scroll(&mut self) -> &mut ScrollAnchor {
        &mut self.scroll
    }

    // ── Auth intents ───────────────────────────────────────────────────────

    pub async fn sign_up(&self, username: &str, email: &str, password: &str) -> ClientResult<()> {
        self.auth.sign_up(username, email, password).await
    }

    /// Sign in and load the caller's room list.
    pub async fn sign_in(&mut self, username: &str, password: &str) -> ClientResult<()> {
        self.auth.sign_in(username, password).await?;
        self.directory.refresh().await
    }

    /// Leave any open room, invalidate the session, forget local state.
    pub async fn sign_out(&mut self) -> ClientResult<()> {
        self.session.reset().await;
        self.auth.sign_out().await?;
        self.directory.clear_local();
        Ok(())
    }

    // ── Room intents ───────────────────────────────────────────────────────

    pub async fn select_room(&mut self, room: &str) -> ClientResult<()> {
        self.session.select_room(room).await
    }

    /// Explicit membership exit, then re-fetch the own-room list.
    pub async fn exit_room(&mut self) -> ClientResult<()> {
        self.session.exit_room().await?;
        self.directory.refresh().await
    }

    /// Join a room discovered via search, then prune it from the visible
    /// results — the membership add has been confirmed by then.
    pub async fn join_discovered_room(&mut self, room: &str) -> ClientResult<()> {
        self.session.join_membership(room).await?;
        self.directory.remove_search_result(room);
        Ok(())
    }

    pub async fn search(&mut self, query: &str) -> ClientResult<()> {
        self.directory.search(query).await
    }

    pub async fn create_room(&mut self) -> ClientResult<String> {
        self.directory.create_room().await
    }

    pub async fn send_message(&mut self, text: &str) -> ClientResult<()> {
        self.session.send_message(text).await
    }

    // ── Inbound events ─────────────────────────────────────────────────────

    /// Feed one inbound channel event through the session. Returns whether
    /// the view should be force-scrolled to the new bottom.
    pub fn handle_event(&mut self, event: ServerEvent) -> bool {
        let before = self.session.messages().len();
        self.session.handle_event(event);
        let grew = self.session.messages().len() > before;
        grew && self.scroll.should_follow()
    }

    pub fn is_idle(&self) -> bool {
        self.session.state() == RoomState::Idle
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
