//! Session-local conversation client.
//!
//! `ConversationClient` owns the turn history of one chat session and drives the relay
//! endpoint through a `RelayTransport`. Each user submission becomes an `Exchange` whose
//! reply moves through an explicit `Pending -> Resolved | Failed` state machine. A single
//! busy flag serializes calls: submissions made while one is in flight are dropped, not
//! queued.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::error::TransportError;
use crate::models::{ErrorBody, RelayReply, RelayRequest, Turn};
use crate::relay::NO_RESPONSE_FALLBACK;

/// Prefix of the assistant turn recorded when a call fails.
pub const APOLOGY_PREFIX: &str = "Sorry, I encountered an error: ";

/// Sends one relay request and yields the assistant's reply text.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send(&self, request: &RelayRequest) -> Result<String, TransportError>;
}

/// `RelayTransport` over HTTP against a running relay endpoint.
pub struct HttpRelayTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpRelayTransport {
    /// `endpoint` is the full URL of the relay route, e.g. `http://localhost:8088/api/chat`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
    async fn send(&self, request: &RelayRequest) -> Result<String, TransportError> {
        let resp = self.http.post(&self.endpoint).json(request).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .map(|b| b.error)
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| format!("Server error: {}", status.as_u16()));
            return Err(TransportError::Server(detail));
        }

        let reply: RelayReply = serde_json::from_slice(&bytes)?;
        if reply.message.is_empty() {
            Ok(NO_RESPONSE_FALLBACK.to_string())
        } else {
            Ok(reply.message)
        }
    }
}

/// Reply slot of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyState {
    Pending,
    Resolved(Turn),
    /// Holds the apology turn shown in place of a reply.
    Failed(Turn),
}

impl ReplyState {
    pub fn turn(&self) -> Option<&Turn> {
        match self {
            ReplyState::Pending => None,
            ReplyState::Resolved(t) | ReplyState::Failed(t) => Some(t),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ReplyState::Pending)
    }
}

/// A user turn and the reply it produced (or is waiting for).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub id: Uuid,
    pub user: Turn,
    pub reply: ReplyState,
}

/// Result of `ConversationClient::send_message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or another call was still in flight. Nothing changed.
    Ignored,
    Resolved,
    Failed,
}

pub struct ConversationClient<T> {
    transport: T,
    busy: AtomicBool,
    exchanges: Mutex<Vec<Exchange>>,
}

impl<T: RelayTransport> ConversationClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            busy: AtomicBool::new(false),
            exchanges: Mutex::new(Vec::new()),
        }
    }

    /// Send `text` as the next user turn and record the reply.
    ///
    /// The user turn is recorded before the call is made. Exactly one reply turn (the
    /// assistant's answer or an apology) is recorded when it completes.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("conversation busy; ignoring submission");
            return SendOutcome::Ignored;
        }

        let id = Uuid::new_v4();
        let history = {
            let mut exchanges = self.lock();
            // Apology turns go out as "assistant", like real replies.
            let history = flatten(&exchanges);
            exchanges.push(Exchange {
                id,
                user: Turn::user(text),
                reply: ReplyState::Pending,
            });
            history
        };
        // Settles the exchange and clears `busy` even if this future is dropped mid-call.
        let in_flight = InFlight {
            busy: &self.busy,
            exchanges: &self.exchanges,
            id,
        };

        let request = RelayRequest::new(text, history);
        let (reply, outcome) = match self.transport.send(&request).await {
            Ok(message) => (
                ReplyState::Resolved(Turn::assistant(message)),
                SendOutcome::Resolved,
            ),
            Err(e) => {
                tracing::warn!(error = %e, "chat relay call failed");
                (
                    ReplyState::Failed(Turn::assistant(format!("{APOLOGY_PREFIX}{e}"))),
                    SendOutcome::Failed,
                )
            }
        };

        in_flight.settle(reply);
        outcome
    }

    /// Whether a call is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Flattened history: each user turn followed by its reply once settled.
    pub fn turns(&self) -> Vec<Turn> {
        flatten(&self.lock())
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.lock().clone()
    }

    /// Number of turns in the flattened history.
    pub fn len(&self) -> usize {
        self.lock()
            .iter()
            .map(|x| if x.reply.is_pending() { 1 } else { 2 })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Exchange>> {
        self.exchanges.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Detail of the apology recorded when a send is abandoned before its reply arrives.
pub const CANCELLED_DETAIL: &str = "request was cancelled";

/// Guard for one in-flight send.
struct InFlight<'a> {
    busy: &'a AtomicBool,
    exchanges: &'a Mutex<Vec<Exchange>>,
    id: Uuid,
}

impl InFlight<'_> {
    fn settle(&self, reply: ReplyState) {
        let mut exchanges = self.exchanges.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(exchange) = exchanges.iter_mut().find(|x| x.id == self.id) {
            exchange.reply = reply;
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        {
            let mut exchanges = self.exchanges.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(exchange) = exchanges
                .iter_mut()
                .find(|x| x.id == self.id && x.reply.is_pending())
            {
                tracing::debug!("chat relay call abandoned before completion");
                exchange.reply = ReplyState::Failed(Turn::assistant(format!(
                    "{APOLOGY_PREFIX}{CANCELLED_DETAIL}"
                )));
            }
        }
        self.busy.store(false, Ordering::Release);
    }
}

fn flatten(exchanges: &[Exchange]) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(exchanges.len() * 2);
    for x in exchanges {
        turns.push(x.user.clone());
        if let Some(reply) = x.reply.turn() {
            turns.push(reply.clone());
        }
    }
    turns
}
