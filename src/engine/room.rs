// Parley Chat Engine — Room Session State Machine
//
// Owns "which room is open": Idle → Joining → Active → Leaving → Idle.
// Sequencing rules this type exists to enforce:
//   • leave-before-join — the leave frame's local send completes before the
//     next join frame goes out, never relying on a server ack
//   • the message log clears immediately on every switch; history load
//     replaces it wholesale; live events append in arrival order, and the
//     log is never re-sorted or truncated otherwise
//   • a message is persisted before it is ever broadcast
//   • in-flight history responses carry a switch generation; responses from
//     a superseded switch are discarded instead of clobbering the log
//
// Selection is exposed in two phases (`begin_select` / `finish_select`) so a
// driver that pipelines switches still gets the generation guard;
// `select_room` is the inline composition of the two.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::atoms::constants::MESSAGE_MAX_CHARS;
use crate::atoms::error::{ClientError, ClientResult};
use crate::atoms::types::{ChatMessage, MembershipRequest, SaveMessageRequest, ServerEvent};
use crate::engine::auth::TokenStore;
use crate::engine::channel::{ChannelHandle, RoomSubscription};
use crate::engine::http::ApiClient;

// ── States ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// No room selected.
    Idle,
    /// Join frame sent, history fetch in flight.
    Joining,
    /// Subscribed and history loaded.
    Active,
    /// Membership teardown in flight.
    Leaving,
}

/// Proof that a join sequence was started; pairs a pending history fetch
/// with the switch generation it belongs to.
#[derive(Debug)]
pub struct JoinTicket {
    room: String,
    generation: u64,
}

impl JoinTicket {
    pub fn room(&self) -> &str {
        &self.room
    }
}

// ── Session ────────────────────────────────────────────────────────────────

pub struct RoomSession {
    api: Arc<ApiClient>,
    store: Arc<TokenStore>,
    channel: ChannelHandle,
    state: RoomState,
    subscription: Option<RoomSubscription>,
    log: Vec<ChatMessage>,
    generation: u64,
}

impl RoomSession {
    pub fn new(api: Arc<ApiClient>, store: Arc<TokenStore>, channel: ChannelHandle) -> Self {
        RoomSession {
            api,
            store,
            channel,
            state: RoomState::Idle,
            subscription: None,
            log: Vec::new(),
            generation: 0,
        }
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    /// The room this connection is currently scoped to, if any.
    pub fn active_room(&self) -> Option<&str> {
        self.subscription.as_ref().map(RoomSubscription::room)
    }

    /// The append-only message log for the active room.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.log
    }

    // ── Selection ──────────────────────────────────────────────────────────

    /// Start switching to `room`. Returns `None` when `room` is already the
    /// subscribed room (a no-op). Otherwise: leave the old room first, clear
    /// the log immediately, emit the join frame, and hand back the ticket
    /// the history fetch must be completed with.
    pub async fn begin_select(&mut self, room: &str) -> ClientResult<Option<JoinTicket>> {
        if self.active_room() == Some(room) {
            return Ok(None);
        }
        let username = self.require_user()?;

        if let Some(current) = self.subscription.take() {
            self.state = RoomState::Leaving;
            let left = current.room().to_owned();
            // Fire-and-forget, but the local send must complete before the
            // join below goes out — that ordering is the whole contract.
            if let Err(e) = current.release().await {
                warn!("[room] Leave frame for {} failed: {}", left, e);
            }
        }

        // Switching always yields an empty view until history lands.
        self.log.clear();
        self.generation += 1;
        self.state = RoomState::Joining;

        match self.channel.subscribe(&username, room).await {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                Ok(Some(JoinTicket { room: room.to_owned(), generation: self.generation }))
            }
            Err(e) => {
                self.state = RoomState::Idle;
                Err(e)
            }
        }
    }

    /// Complete a join with the history fetch's outcome. A ticket from a
    /// superseded switch is discarded without touching the log. A failed
    /// fetch releases the subscription and reverts to Idle — the session
    /// never dangles half-joined.
    pub async fn finish_select(
        &mut self,
        ticket: JoinTicket,
        history: ClientResult<Vec<ChatMessage>>,
    ) -> ClientResult<()> {
        if ticket.generation != self.generation {
            debug!("[room] Discarding stale history for {}", ticket.room);
            return Ok(());
        }

        match history {
            Ok(messages) => {
                info!("[room] Active in {} ({} messages)", ticket.room, messages.len());
                self.log = messages;
                self.state = RoomState::Active;
                Ok(())
            }
            Err(e) => {
                warn!("[room] History load for {} failed: {}", ticket.room, e);
                if let Some(subscription) = self.subscription.take() {
                    if let Err(leave_err) = subscription.release().await {
                        warn!("[room] Leave frame after failed join: {}", leave_err);
                    }
                }
                self.state = RoomState::Idle;
                Err(e)
            }
        }
    }

    /// Switch to `room` inline: leave, join, load history, become Active.
    pub async fn select_room(&mut self, room: &str) -> ClientResult<()> {
        let Some(ticket) = self.begin_select(room).await? else {
            return Ok(());
        };
        let history = self.api.room_history(ticket.room()).await;
        self.finish_select(ticket, history).await
    }

    /// Re-fetch the active room's history and replace the log wholesale.
    /// Replaying an unchanged server-side log yields an identical log.
    pub async fn refresh_history(&mut self) -> ClientResult<()> {
        let room = self
            .active_room()
            .ok_or_else(|| ClientError::from("no active room"))?
            .to_owned();
        let generation = self.generation;
        let messages = self.api.room_history(&room).await?;
        if generation == self.generation {
            self.log = messages;
        }
        Ok(())
    }

    // ── Explicit exit ──────────────────────────────────────────────────────

    /// Leave the room's membership for good (distinct from switching away):
    /// server-side removal, then a persisted + broadcast departure
    /// announcement, then the exit frame, then Idle. The subscription is
    /// restored untouched if the removal fails.
    pub async fn exit_room(&mut self) -> ClientResult<()> {
        let username = self.require_user()?;
        let Some(subscription) = self.subscription.take() else {
            return Err(ClientError::from("no active room"));
        };
        let room = subscription.room().to_owned();
        self.state = RoomState::Leaving;

        let request = MembershipRequest { username: username.clone(), room: room.clone() };
        if let Err(e) = self.api.remove_member(&request).await {
            self.subscription = Some(subscription);
            self.state = RoomState::Active;
            return Err(e);
        }

        self.announce_system(&username, &room, format!("{} left the room", username)).await;

        if let Err(e) = subscription.exit().await {
            warn!("[room] Exit frame for {} failed: {}", room, e);
        }
        self.log.clear();
        self.state = RoomState::Idle;
        info!("[room] Exited {}", room);
        Ok(())
    }

    /// Membership-add for a room discovered via search, announced the same
    /// way. Idempotence against already-being-a-member is the server's
    /// concern. The caller prunes its search results afterwards.
    pub async fn join_membership(&self, room: &str) -> ClientResult<()> {
        let username = self.require_user()?;
        let request = MembershipRequest { username: username.clone(), room: room.to_owned() };
        self.api.add_member(&request).await?;
        info!("[room] {} joined membership of {}", username, room);

        self.announce_system(&username, room, format!("{} joined the room", username)).await;
        Ok(())
    }

    /// Persist a system announcement, then broadcast it. Best-effort: the
    /// membership change it narrates has already taken hold, so a failure
    /// here is logged and swallowed.
    async fn announce_system(&self, username: &str, room: &str, text: String) {
        let request =
            SaveMessageRequest { username: username.to_owned(), room: room.to_owned(), text };
        match self.api.save_message(&request).await {
            Ok(saved) => {
                if let Err(e) =
                    self.channel.announce(username, room, &saved.message, &saved.date_time).await
                {
                    warn!("[room] Announcement broadcast for {} failed: {}", room, e);
                }
            }
            Err(e) => warn!("[room] Announcement persist for {} failed: {}", room, e),
        }
    }

    // ── Send path ──────────────────────────────────────────────────────────

    /// Persist a message, then broadcast it to the other subscribers. The
    /// broadcast carries the server-echoed text and timestamp, and never
    /// happens unless persistence succeeded. The sender's own copy is not
    /// appended locally — the server echoes it back on the channel.
    pub async fn send_message(&mut self, text: &str) -> ClientResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        if text.chars().count() > MESSAGE_MAX_CHARS {
            return Err(ClientError::from(format!(
                "message exceeds {} characters",
                MESSAGE_MAX_CHARS
            )));
        }
        let username = self.require_user()?;
        let Some(subscription) = &self.subscription else {
            return Err(ClientError::from("no active room"));
        };

        let request = SaveMessageRequest {
            username,
            room: subscription.room().to_owned(),
            text: text.to_owned(),
        };
        let saved = self.api.save_message(&request).await?;
        subscription.broadcast(&saved.message, &saved.date_time).await?;
        debug!("[room] Sent message to {}", subscription.room());
        Ok(())
    }

    // ── Inbound events ─────────────────────────────────────────────────────

    /// Append an inbound message in arrival order. No dedup, no room check:
    /// the subscription capability already scopes what the server delivers.
    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Message(message) => self.log.push(message),
        }
    }

    /// Drop everything local (sign-out): release any subscription, clear
    /// the log, return to Idle.
    pub async fn reset(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            let room = subscription.room().to_owned();
            if let Err(e) = subscription.release().await {
                warn!("[room] Leave frame for {} during reset failed: {}", room, e);
            }
        }
        self.log.clear();
        self.generation += 1;
        self.state = RoomState::Idle;
    }

    fn require_user(&self) -> ClientResult<String> {
        self.store
            .username()
            .ok_or_else(|| ClientError::AuthInvalid("no active session".into()))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
