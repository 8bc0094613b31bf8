// ── Parley Atoms: Golden Traits ────────────────────────────────────────────
// The two seams everything network-shaped passes through. Production wires
// reqwest / tokio-tungstenite behind these; tests wire scripted fakes.
// Nothing here may import from engine/.

use async_trait::async_trait;

use crate::atoms::error::ClientResult;
use crate::atoms::types::{ApiRequest, ApiResponse, ClientEvent};

/// Executes one REST request. Implementations do no auth handling and no
/// retries — that policy lives in `engine::http::ApiClient`, the single
/// choke point through which every component's calls pass.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse>;
}

/// Emits one control frame on the realtime channel. Emission is local-send
/// completion only; the server never acknowledges frames.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn emit(&self, event: ClientEvent) -> ClientResult<()>;
}
