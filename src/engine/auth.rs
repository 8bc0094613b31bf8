// Parley Chat Engine — Session Identity & Auth Flows
//
// `TokenStore` is the one place session identity lives. It has an explicit
// lifecycle — `init` on sign-in, `clear` on sign-out — and exactly one other
// mutation path: `replace_access`, used by the refresh cycle in http.rs.
// No component reads or writes tokens ad hoc.

use std::sync::Arc;

use parking_lot::Mutex;

use log::{info, warn};

use crate::atoms::error::ClientResult;
use crate::atoms::types::{ApiRequest, LogoutRequest, Session, SigninRequest, SigninResponse, SignupRequest};
use crate::engine::http::ApiClient;

// ── Token store ────────────────────────────────────────────────────────────

/// Process-wide session state. At most one session is live at a time;
/// initializing while one is live replaces it wholesale.
#[derive(Default)]
pub struct TokenStore {
    inner: Mutex<Option<Session>>,
}

impl TokenStore {
    pub fn new() -> Self {
        TokenStore::default()
    }

    /// Install a freshly signed-in session, replacing any previous one.
    pub fn init(&self, session: Session) {
        info!("[auth] Session initialized for {}", session.username);
        *self.inner.lock() = Some(session);
    }

    /// Tear the session down (sign-out).
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.take() {
            info!("[auth] Session cleared for {}", session.username);
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.lock().is_some()
    }

    pub fn username(&self) -> Option<String> {
        self.inner.lock().as_ref().map(|s| s.username.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.lock().as_ref().map(|s| s.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.lock().as_ref().map(|s| s.refresh.clone())
    }

    /// Replace the access token in place after a successful refresh.
    /// This is the only mutation besides `init`/`clear`.
    pub fn replace_access(&self, access: String) {
        if let Some(session) = self.inner.lock().as_mut() {
            session.access = access;
        }
    }
}

// ── Auth flows ─────────────────────────────────────────────────────────────

/// Sign-up / sign-in / sign-out against the REST API. None of these carry a
/// bearer token, so they bypass the refresh-retry policy entirely.
pub struct AuthService {
    api: Arc<ApiClient>,
    store: Arc<TokenStore>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>, store: Arc<TokenStore>) -> Self {
        AuthService { api, store }
    }

    pub async fn sign_up(&self, username: &str, email: &str, password: &str) -> ClientResult<()> {
        let body = SignupRequest {
            username: username.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        };
        self.api.call_anonymous(ApiRequest::post("/signup", serde_json::to_value(&body)?)).await?;
        info!("[auth] Account created for {}", username);
        Ok(())
    }

    /// Authenticate and initialize the token store with the returned pair.
    pub async fn sign_in(&self, username: &str, password: &str) -> ClientResult<()> {
        let body = SigninRequest { username: username.to_owned(), password: password.to_owned() };
        let response = self
            .api
            .call_anonymous(ApiRequest::patch("/signin", serde_json::to_value(&body)?))
            .await?;
        let parsed: SigninResponse = serde_json::from_value(response)?;
        self.store.init(Session {
            username: username.to_owned(),
            access: parsed.tokens.access,
            refresh: parsed.tokens.refresh,
        });
        Ok(())
    }

    /// Invalidate the session server-side, then clear it locally. The local
    /// clear happens even when the server call fails — an unreachable server
    /// must not pin a user to a stale identity.
    pub async fn sign_out(&self) -> ClientResult<()> {
        let Some(username) = self.store.username() else {
            return Ok(());
        };
        let body = LogoutRequest { username: username.clone() };
        let result = self
            .api
            .call_anonymous(ApiRequest::patch("/logout", serde_json::to_value(&body)?))
            .await;
        if let Err(e) = result {
            warn!("[auth] Server-side logout for {} failed: {}", username, e);
        }
        self.store.clear();
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{status_response, ScriptedApi};
    use serde_json::json;

    fn service(transport: Arc<ScriptedApi>) -> (AuthService, Arc<TokenStore>) {
        let store = Arc::new(TokenStore::new());
        let api = Arc::new(ApiClient::new(transport, store.clone()));
        (AuthService::new(api, store.clone()), store)
    }

    #[tokio::test]
    async fn test_sign_in_initializes_session() {
        let transport = ScriptedApi::new(|req| match req.path.as_str() {
            "/signin" => status_response(
                200,
                json!({"message": "Logged In!", "tokens": {"access": "a1", "refresh": "r1"}}),
            ),
            other => panic!("unexpected path {}", other),
        });
        let (auth, store) = service(transport);

        auth.sign_in("alice", "hunter2").await.unwrap();

        assert!(store.is_signed_in());
        assert_eq!(store.username().as_deref(), Some("alice"));
        assert_eq!(store.access_token().as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_sign_in_failure_leaves_store_empty() {
        let transport = ScriptedApi::new(|req| match req.path.as_str() {
            "/signin" => status_response(400, json!({"message": "Invalide username or password"})),
            other => panic!("unexpected path {}", other),
        });
        let (auth, store) = service(transport);

        assert!(auth.sign_in("alice", "wrong").await.is_err());
        assert!(!store.is_signed_in());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_even_when_server_fails() {
        let transport = ScriptedApi::new(|req| match req.path.as_str() {
            "/logout" => status_response(500, json!({"message": "boom"})),
            other => panic!("unexpected path {}", other),
        });
        let (auth, store) = service(transport);
        store.init(Session { username: "alice".into(), access: "a".into(), refresh: "r".into() });

        auth.sign_out().await.unwrap();

        assert!(!store.is_signed_in());
    }

    #[test]
    fn test_replace_access_keeps_rest_of_session() {
        let store = TokenStore::new();
        store.init(Session { username: "alice".into(), access: "old".into(), refresh: "r".into() });

        store.replace_access("new".into());

        assert_eq!(store.access_token().as_deref(), Some("new"));
        assert_eq!(store.refresh_token().as_deref(), Some("r"));
        assert_eq!(store.username().as_deref(), Some("alice"));
    }

    #[test]
    fn test_second_init_replaces_first_session() {
        let store = TokenStore::new();
        store.init(Session { username: "alice".into(), access: "a".into(), refresh: "r".into() });
        store.init(Session { username: "bob".into(), access: "b".into(), refresh: "s".into() });

        assert_eq!(store.username().as_deref(), Some("bob"));
    }
}
