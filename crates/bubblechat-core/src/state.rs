//! UI-agnostic message types
//!
//! These are the records the transcript is made of. They don't depend on any
//! UI framework so the terminal front end (or anything else) can render them.

use chrono::{DateTime, Local};

/// Position of a message within its transcript. Ids only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "AI",
        }
    }
}

/// A chat message in the conversation.
///
/// Messages are immutable once built: the transcript hands out shared
/// references only, and there are no setters.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    id: MessageId,
    role: ChatRole,
    content: String,
    timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(id: MessageId, role: ChatRole, content: impl Into<String>) -> Self {
        Self::with_timestamp(id, role, content, Local::now())
    }

    pub fn with_timestamp(
        id: MessageId,
        role: ChatRole,
        content: impl Into<String>,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}
