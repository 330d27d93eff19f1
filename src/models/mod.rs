//! Data models for the relay endpoint and the completion provider.
//!
//! This module groups two submodules:
//! - `turn`: conversation turns plus the request/response bodies exchanged between the
//!   chat widget and the relay endpoint.
//! - `completion`: the subset of the OpenAI-compatible Chat Completions wire format the
//!   relay sends to and reads from the provider.
//!
//! The logic that frames a conversation into a provider call lives in `crate::relay`.

pub mod completion;
pub mod turn;

// Convenience re-exports so downstream users can `use chat_relay::models::*`.
pub use completion::{
    CompletionChoice, CompletionMessage, CompletionRequest, CompletionResponse, CompletionUsage,
};
pub use turn::{ErrorBody, RelayReply, RelayRequest, Role, Turn};
