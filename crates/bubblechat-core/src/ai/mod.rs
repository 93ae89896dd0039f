pub mod chat;
pub mod voice;

pub use chat::ChatClient;
pub use voice::VoiceClient;
