// Parley Chat Engine — Authenticated HTTP Choke Point
//
// `HttpApi` is the reqwest implementation of the `ApiTransport` seam;
// `ApiClient` is the policy layer every component's calls pass through:
//   • attaches the current access token as a bearer credential
//   • on HTTP 401, performs exactly ONE refresh-and-retry cycle
//   • surfaces every other failure verbatim, with no retry
//
// A successful refresh mutates the shared `TokenStore`, so every other
// component observes the new access token on its next call.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::json;

use crate::atoms::error::{ClientError, ClientResult};
use crate::atoms::traits::ApiTransport;
use crate::atoms::types::{
    ApiRequest, ApiResponse, ChatMessage, CreateRoomRequest, FindChatsResponse, HttpMethod,
    MembershipRequest, MessagesResponse, RefreshResponse, RoomsResponse, SaveMessageRequest,
    SaveMessageResponse,
};
use crate::engine::auth::TokenStore;
use crate::engine::config::ClientConfig;

// ── reqwest transport ──────────────────────────────────────────────────────

pub struct HttpApi {
    client: reqwest::Client,
    base: String,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let base = config.normalized_api_base()?;
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Ok(HttpApi { client, base })
    }

    fn url_for(&self, request: &ApiRequest) -> String {
        let mut url = format!("{}{}", self.base, request.path);
        if !request.query.is_empty() {
            // Room keys contain `#`, which must not terminate the URL.
            let pairs: Vec<String> = request
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url = format!("{}?{}", url, pairs.join("&"));
        }
        url
    }
}

#[async_trait]
impl ApiTransport for HttpApi {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let url = self.url_for(&request);
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        // Error pages are not always JSON; keep whatever parses.
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);
        debug!("[http] {} {} -> {}", request.method.as_str(), request.path, status);
        Ok(ApiResponse { status, body })
    }
}

// ── Authenticated client ───────────────────────────────────────────────────

pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
    store: Arc<TokenStore>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn ApiTransport>, store: Arc<TokenStore>) -> Self {
        ApiClient { transport, store }
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Execute a request that carries no credentials and gets no retry
    /// (signup / signin / logout). Success returns the response body.
    pub async fn call_anonymous(&self, request: ApiRequest) -> ClientResult<serde_json::Value> {
        let response = self.transport.execute(request).await?;
        if response.ok() {
            Ok(response.body)
        } else {
            Err(ClientError::api(response.status, response.message()))
        }
    }

    /// Execute an authenticated request. On 401, refresh once and re-issue
    /// the original request once with the new token; the caller receives the
    /// retried request's outcome. Retry budget is 1 — a second 401 surfaces
    /// as `AuthExpired` with no further refresh attempt.
    pub async fn call(&self, mut request: ApiRequest) -> ClientResult<serde_json::Value> {
        request.bearer = self.store.access_token();

        let first = self.transport.execute(request.clone()).await?;
        if first.ok() {
            return Ok(first.body);
        }
        if first.status != 401 {
            return Err(ClientError::api(first.status, first.message()));
        }

        info!("[http] Access token rejected on {} — refreshing", request.path);
        let access = self.refresh().await?;

        request.bearer = Some(access);
        let second = self.transport.execute(request).await?;
        if second.ok() {
            Ok(second.body)
        } else if second.status == 401 {
            Err(ClientError::AuthExpired)
        } else {
            Err(ClientError::api(second.status, second.message()))
        }
    }

    /// One refresh cycle: POST /jwt_refresh with the refresh token as bearer.
    /// On success the stored access token is replaced in place; on failure
    /// the session is left stale for the caller to inspect or clear.
    async fn refresh(&self) -> ClientResult<String> {
        let refresh = self
            .store
            .refresh_token()
            .ok_or_else(|| ClientError::AuthInvalid("no active session".into()))?;

        let request = ApiRequest::post("/jwt_refresh", json!({})).with_bearer(refresh);
        let response = self.transport.execute(request).await?;
        if !response.ok() {
            warn!("[http] Token refresh failed ({})", response.status);
            return Err(ClientError::AuthInvalid(response.message()));
        }

        let parsed: RefreshResponse = serde_json::from_value(response.body)?;
        self.store.replace_access(parsed.access.clone());
        info!("[http] Token refresh successful");
        Ok(parsed.access)
    }

    // ── Typed chat endpoints ───────────────────────────────────────────────
    // Components call these instead of assembling paths themselves, so URL
    // escaping and body schemas live in exactly one place.

    pub async fn rooms_for(&self, user: &str) -> ClientResult<Vec<String>> {
        let body = self.call(ApiRequest::get("/chat/get_rooms").with_query("user", user)).await?;
        let parsed: RoomsResponse = serde_json::from_value(body)?;
        Ok(parsed.rooms)
    }

    pub async fn create_room(&self, request: &CreateRoomRequest) -> ClientResult<()> {
        self.call(ApiRequest::post("/chat/create_room", serde_json::to_value(request)?)).await?;
        Ok(())
    }

    pub async fn find_chats(&self, item: &str, user: &str) -> ClientResult<FindChatsResponse> {
        let body = self
            .call(
                ApiRequest::get("/chat/find_chats")
                    .with_query("item", item)
                    .with_query("user", user),
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn add_member(&self, request: &MembershipRequest) -> ClientResult<()> {
        self.call(ApiRequest::post("/chat/add_user_to_chat", serde_json::to_value(request)?))
            .await?;
        Ok(())
    }

    pub async fn remove_member(&self, request: &MembershipRequest) -> ClientResult<()> {
        self.call(ApiRequest::delete("/chat/remove_user_from_chat", serde_json::to_value(request)?))
            .await?;
        Ok(())
    }

    pub async fn save_message(&self, request: &SaveMessageRequest) -> ClientResult<SaveMessageResponse> {
        let body = self
            .call(ApiRequest::post("/chat/save_message", serde_json::to_value(request)?))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn room_history(&self, room: &str) -> ClientResult<Vec<ChatMessage>> {
        let body = self.call(ApiRequest::get("/chat/get_messages").with_query("room", room)).await?;
        let parsed: MessagesResponse = serde_json::from_value(body)?;
        Ok(parsed.messages)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
