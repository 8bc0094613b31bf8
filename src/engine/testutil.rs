// Parley Chat Engine — Shared Test Fakes
//
// In-process stand-ins for the two transport seams, shared by the module
// tests. A `ScriptedApi` answers REST calls from a closure and records every
// request; a `RecordingChannel` records every emitted frame. Both can feed a
// common ledger so a test can assert cross-transport ordering (for example
// persist-before-broadcast).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::atoms::error::ClientResult;
use crate::atoms::traits::{ApiTransport, ChannelTransport};
use crate::atoms::types::{ApiRequest, ApiResponse, ChatMessage, ClientEvent, Session};
use crate::engine::auth::TokenStore;
use crate::engine::http::ApiClient;

// ── Ordering ledger ────────────────────────────────────────────────────────

pub(crate) type Ledger = Arc<Mutex<Vec<String>>>;

pub(crate) fn new_ledger() -> Ledger {
    Arc::new(Mutex::new(Vec::new()))
}

// ── Scripted API transport ─────────────────────────────────────────────────

pub(crate) struct ScriptedApi {
    handler: Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>,
    calls: Mutex<Vec<ApiRequest>>,
    ledger: Option<Ledger>,
}

impl ScriptedApi {
    pub(crate) fn new(
        handler: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(ScriptedApi { handler: Box::new(handler), calls: Mutex::new(Vec::new()), ledger: None })
    }

    pub(crate) fn with_ledger(
        handler: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
        ledger: Ledger,
    ) -> Arc<Self> {
        Arc::new(ScriptedApi {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            ledger: Some(ledger),
        })
    }

    /// Every request seen so far, in order.
    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// How many requests hit `path`.
    pub(crate) fn count(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|r| r.path == path).count()
    }
}

#[async_trait]
impl ApiTransport for ScriptedApi {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        if let Some(ledger) = &self.ledger {
            ledger
                .lock()
                .unwrap()
                .push(format!("api {} {}", request.method.as_str(), request.path));
        }
        let response = (self.handler)(&request);
        self.calls.lock().unwrap().push(request);
        Ok(response)
    }
}

// ── Recording channel transport ────────────────────────────────────────────

pub(crate) struct RecordingChannel {
    events: Mutex<Vec<ClientEvent>>,
    ledger: Option<Ledger>,
}

impl RecordingChannel {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(RecordingChannel { events: Mutex::new(Vec::new()), ledger: None })
    }

    pub(crate) fn with_ledger(ledger: Ledger) -> Arc<Self> {
        Arc::new(RecordingChannel { events: Mutex::new(Vec::new()), ledger: Some(ledger) })
    }

    /// Every frame emitted so far, in order.
    pub(crate) fn events(&self) -> Vec<ClientEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelTransport for RecordingChannel {
    async fn emit(&self, event: ClientEvent) -> ClientResult<()> {
        if let Some(ledger) = &self.ledger {
            ledger.lock().unwrap().push(format!("channel {}", event.name()));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

// ── Fixtures ───────────────────────────────────────────────────────────────

/// A token store pre-initialized with alice's session.
pub(crate) fn signed_in_store() -> Arc<TokenStore> {
    let store = Arc::new(TokenStore::new());
    store.init(Session {
        username: "alice".into(),
        access: "access-0".into(),
        refresh: "refresh-0".into(),
    });
    store
}

/// An `ApiClient` over the given transport with alice signed in.
pub(crate) fn api_client(transport: Arc<ScriptedApi>) -> ApiClient {
    ApiClient::new(transport, signed_in_store())
}

pub(crate) fn status_response(status: u16, body: serde_json::Value) -> ApiResponse {
    ApiResponse { status, body }
}

pub(crate) fn chat_message(username: &str, text: &str, date_time: &str) -> ChatMessage {
    ChatMessage { username: username.into(), text: text.into(), date_time: date_time.into() }
}
