#![forbid(unsafe_code)]
#![doc = r#"
Chat Relay

Relay a browser chat widget's conversation to an OpenAI-compatible Chat Completions provider
through a server-side endpoint, and drive that endpoint from a session-local client.

Crate highlights
- Library: stateless relay core via `ChatRelay::relay(RelayRequest)`.
- HTTP server (in `server`): `POST /api/chat` and `GET /status`.
- Client (in `client`): `ConversationClient` owns one session's turns and serializes calls.

Modules
- `models`: Turns, relay bodies and the provider's completion wire format.
- `config`: `RelayConfig` (file + environment), passed explicitly to the relay.
- `error`: `RelayError` taxonomy and its JSON rendering; client-side `TransportError`.
- `relay`: Conversation framing, the single provider call and response normalization.
- `server`: Axum router/handlers (the binary uses this).
- `client`: Conversation client and its HTTP transport.
- `util`: Shared helpers (tracing, env, HTTP client, CORS).
"#]

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod relay;
pub mod server;
pub mod util;

pub use crate::client::{ConversationClient, HttpRelayTransport, RelayTransport, SendOutcome};
pub use crate::config::RelayConfig;
pub use crate::error::{RelayError, TransportError};
pub use crate::models::{RelayReply, RelayRequest, Role, Turn};
pub use crate::relay::ChatRelay;
