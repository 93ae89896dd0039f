pub mod ai;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod sanitizer;
pub mod session;
pub mod state;
pub mod transcript;
pub mod voice;

// Re-export main types for convenience
pub use ai::{ChatClient, VoiceClient};
pub use backend::{ChatBackend, ChatRequest, VoiceBackend, EMPTY_REPLY};
pub use config::Config;
pub use error::{ChatError, ConfigError, SubmitError, VoiceError};
pub use models::ChatModel;
pub use sanitizer::sanitize;
pub use session::{Alert, ChatSession, SubmitState, GREETING};
pub use state::{ChatMessage, ChatRole, MessageId};
pub use transcript::{format_time, RenderedMessage, Transcript};
pub use voice::{ListenTicket, VoiceInput, VoiceState};
