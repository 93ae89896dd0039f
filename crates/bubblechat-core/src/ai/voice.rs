use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::backend::VoiceBackend;
use crate::error::VoiceError;

#[derive(Debug, Deserialize)]
struct ListenResponse {
    success: bool,
    text: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct VoiceClient {
    client: Client,
    listen_url: String,
}

impl VoiceClient {
    pub fn new(listen_url: &str) -> Self {
        Self {
            client: Client::new(),
            listen_url: listen_url.to_string(),
        }
    }

    /// The service records from its own microphone, so the request body is empty.
    pub async fn transcribe(&self) -> Result<String, VoiceError> {
        tracing::debug!(url = %self.listen_url, "requesting transcription");

        let response = self
            .client
            .post(&self.listen_url)
            .send()
            .await
            .map_err(|e| VoiceError::Network(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| VoiceError::Network(e.to_string()))?;

        interpret_listen_response(&body)
    }
}

#[async_trait]
impl VoiceBackend for VoiceClient {
    async fn listen(&self) -> Result<String, VoiceError> {
        self.transcribe().await
    }
}

pub fn interpret_listen_response(body: &str) -> Result<String, VoiceError> {
    let response: ListenResponse = serde_json::from_str(body)
        .map_err(|e| VoiceError::Recognition(format!("unreadable response from voice service: {}", e)))?;

    if !response.success {
        return Err(VoiceError::Recognition(
            response
                .error
                .unwrap_or_else(|| "Voice recognition failed.".to_string()),
        ));
    }

    match response.text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(VoiceError::Recognition("No speech detected.".to_string())),
    }
}
