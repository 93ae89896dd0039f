use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::backend::{ChatBackend, ChatRequest, EMPTY_REPLY};
use crate::error::ChatError;

/// Every field is optional: the same shape covers success and error bodies.
#[derive(Deserialize)]
struct ChatResponse {
    reply: Option<String>,
    error: Option<String>,
    details: Option<String>,
}

/// Stands in for an error body that names no error.
const UNKNOWN_ERROR: &str = "unknown";

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    chat_url: String,
    health_url: String,
}

impl ChatClient {
    pub fn new(chat_url: &str, health_url: &str) -> Self {
        Self {
            client: Client::new(),
            chat_url: chat_url.to_string(),
            health_url: health_url.to_string(),
        }
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    pub async fn query(&self, request: &ChatRequest) -> Result<String, ChatError> {
        tracing::debug!(url = %self.chat_url, model = ?request.model, "sending chat request");

        let response = self
            .client
            .post(&self.chat_url)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        tracing::debug!(%status, bytes = body.len(), "chat response received");
        interpret_chat_response(status, &body)
    }

    /// Ping the backend's health endpoint.
    pub async fn health(&self) -> Result<(), ChatError> {
        let response = self
            .client
            .get(&self.health_url)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChatError::Server(format!(
                "health check failed with status: {}",
                response.status()
            )));
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Server(e.to_string()))?;
        if health.status != "ok" {
            return Err(ChatError::Server(format!("backend reports status {}", health.status)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<String, ChatError> {
        self.query(request).await
    }
}

/// Map a status and raw body onto a reply or a server error.
///
/// A 2xx body that isn't JSON is still shown to the user as the reply. A JSON
/// body with no usable `reply` becomes [`EMPTY_REPLY`] rather than leaking the
/// raw object into the transcript.
pub fn interpret_chat_response(status: StatusCode, body: &str) -> Result<String, ChatError> {
    let parsed: Option<ChatResponse> = serde_json::from_str(body).ok();

    if status.is_success() {
        let Some(response) = parsed else {
            return Ok(body.to_string());
        };
        return match response {
            ChatResponse { reply: Some(reply), .. } if !reply.is_empty() => Ok(reply),
            ChatResponse { error: Some(error), details, .. } if !error.is_empty() => {
                Err(ChatError::Server(error_text(error, details)))
            }
            _ => Ok(EMPTY_REPLY.to_string()),
        };
    }

    let message = match parsed {
        Some(ChatResponse { error: Some(error), details, .. }) => error_text(error, details),
        Some(ChatResponse { details: Some(details), .. }) if !details.is_empty() => details,
        Some(_) => UNKNOWN_ERROR.to_string(),
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => format!("request failed with status: {}", status),
    };
    Err(ChatError::Server(message))
}

fn error_text(error: String, details: Option<String>) -> String {
    let error = if error.is_empty() { UNKNOWN_ERROR.to_string() } else { error };
    match details {
        Some(details) if !details.is_empty() => format!("{} ({})", error, details),
        _ => error,
    }
}
