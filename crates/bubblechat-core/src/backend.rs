//! Seams between the state machines and the network.
//!
//! The HTTP clients in `ai` implement these; tests swap in in-memory ones.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{ChatError, VoiceError};

/// Shown in place of a reply that came back with no text.
pub const EMPTY_REPLY: &str = "(empty reply)";

/// Body of one chat POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one message and return the raw (unsanitized) reply text.
    async fn send(&self, request: &ChatRequest) -> Result<String, ChatError>;
}

#[async_trait]
pub trait VoiceBackend: Send + Sync {
    /// Ask the transcription service to listen once and return the text.
    async fn listen(&self) -> Result<String, VoiceError>;
}
