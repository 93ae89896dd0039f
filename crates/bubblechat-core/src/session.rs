//! Explicitly owned session state: transcript, input field, model choice,
//! and the submission and voice state machines that mutate them.

use uuid::Uuid;

use crate::backend::{ChatBackend, ChatRequest, EMPTY_REPLY};
use crate::error::{ChatError, SubmitError, VoiceError};
use crate::models::ChatModel;
use crate::sanitizer::sanitize;
use crate::state::MessageId;
use crate::transcript::Transcript;
use crate::voice::{ListenTicket, VoiceInput, VoiceState};

/// Prefix for messages standing in for a server-reported failure.
pub const SERVER_ERROR_PREFIX: &str = "Error: ";
/// Prefix for messages standing in for a transport failure.
pub const NETWORK_ERROR_PREFIX: &str = "Network error: ";

/// Assistant message a fresh conversation opens with.
pub const GREETING: &str = "Hi!\nI'm your terminal AI assistant.\nAsk me anything 💬";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Sending,
}

/// A blocking notice the front end shows until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

pub struct ChatSession {
    session_id: String,
    transcript: Transcript,
    input: String,
    selected_model: ChatModel,
    state: SubmitState,
    voice: VoiceInput,
    alert: Option<Alert>,
}

impl ChatSession {
    pub fn new(model: ChatModel) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            transcript: Transcript::new(),
            input: String::new(),
            selected_model: model,
            state: SubmitState::Idle,
            voice: VoiceInput::new(),
            alert: None,
        }
    }

    /// A session whose transcript opens with the assistant's [`GREETING`].
    pub fn with_greeting(model: ChatModel) -> Self {
        let mut session = Self::new(model);
        session.transcript.push_assistant(GREETING);
        session
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Mutable access for the editor. Ignored edits while sending are the
    /// caller's concern; the field is cleared on submit either way.
    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn selected_model(&self) -> ChatModel {
        self.selected_model
    }

    pub fn select_model(&mut self, model: ChatModel) {
        tracing::info!(model = model.display_name(), "model selected");
        self.selected_model = model;
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == SubmitState::Sending
    }

    pub fn voice_state(&self) -> VoiceState {
        self.voice.state()
    }

    pub fn raise_alert(&mut self, alert: Alert) {
        self.alert = Some(alert);
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    /// Start a submission from the current input.
    ///
    /// While a request is in flight this does nothing and returns `Ok(None)`;
    /// the input is left as is rather than queued. Otherwise the user message
    /// is appended before the request is handed back for dispatch.
    pub fn begin_submit(&mut self) -> Result<Option<ChatRequest>, SubmitError> {
        if self.is_sending() {
            tracing::debug!("submit ignored while a request is pending");
            return Ok(None);
        }

        let message = self.input.trim().to_string();
        if message.is_empty() {
            return Err(SubmitError::EmptyInput);
        }

        self.transcript.push_user(message.clone());
        self.input.clear();
        self.state = SubmitState::Sending;

        Ok(Some(ChatRequest {
            session_id: self.session_id.clone(),
            message,
            model: Some(self.selected_model.display_name().to_string()),
        }))
    }

    /// Settle the pending request and return to `Idle`.
    pub fn finish_submit(&mut self, result: Result<String, ChatError>) -> Option<MessageId> {
        if !self.is_sending() {
            tracing::warn!("reply arrived with no request pending");
            return None;
        }
        self.state = SubmitState::Idle;

        let id = match result {
            Ok(reply) => {
                tracing::info!(bytes = reply.len(), "reply received");
                let text = sanitize(&reply);
                if text.is_empty() {
                    self.transcript.push_assistant(EMPTY_REPLY)
                } else {
                    self.transcript.push_assistant(text)
                }
            }
            Err(ChatError::Server(text)) => {
                tracing::warn!(error = %text, "server reported an error");
                self.raise_alert(Alert::new("Server error", text.clone()));
                self.transcript
                    .push_assistant(format!("{}{}", SERVER_ERROR_PREFIX, text))
            }
            Err(ChatError::Network(text)) => {
                tracing::error!(error = %text, "chat request failed");
                self.raise_alert(Alert::new(
                    "Network error",
                    format!("Could not reach the chat server: {}", text),
                ));
                self.transcript
                    .push_assistant(format!("{}{}", NETWORK_ERROR_PREFIX, text))
            }
        };
        Some(id)
    }

    /// One full round trip against `backend`.
    pub async fn exchange(
        &mut self,
        backend: &dyn ChatBackend,
    ) -> Result<Option<MessageId>, SubmitError> {
        let Some(request) = self.begin_submit()? else {
            return Ok(None);
        };
        let result = backend.send(&request).await;
        Ok(self.finish_submit(result))
    }

    pub fn start_listening(&mut self) -> Option<ListenTicket> {
        self.voice.start()
    }

    /// Apply a transcription result: text replaces the input field, a failure
    /// raises an alert. Results for a cancelled listen are ignored.
    pub fn finish_listening(&mut self, ticket: ListenTicket, result: Result<String, VoiceError>) {
        match self.voice.finish(ticket, result) {
            Some(Ok(text)) => {
                tracing::info!(chars = text.chars().count(), "voice input transcribed");
                self.input = text;
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "voice input failed");
                let title = match e {
                    VoiceError::Recognition(_) => "Voice input",
                    VoiceError::Network(_) => "Network error",
                };
                self.raise_alert(Alert::new(title, e.to_string()));
            }
            None => {}
        }
    }

    pub fn cancel_listening(&mut self) {
        self.voice.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockChat {
        calls: AtomicUsize,
        seen: Mutex<Vec<ChatRequest>>,
        result: Result<String, ChatError>,
    }

    impl MockChat {
        fn new(result: Result<String, ChatError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                result,
            }
        }
    }

    #[async_trait]
    impl ChatBackend for MockChat {
        async fn send(&self, request: &ChatRequest) -> Result<String, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());
            self.result.clone()
        }
    }

    fn contents(session: &ChatSession) -> Vec<(ChatRole, String)> {
        session
            .transcript()
            .messages()
            .iter()
            .map(|m| (m.role(), m.content().to_string()))
            .collect()
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut session = ChatSession::new(ChatModel::default());
        session.set_input("   \n ");
        assert_eq!(session.begin_submit(), Err(SubmitError::EmptyInput));
        assert!(session.transcript().is_empty());
        assert_eq!(session.state(), SubmitState::Idle);
    }

    #[test]
    fn test_begin_submit_echoes_and_clears_input() {
        let mut session = ChatSession::new(ChatModel::GptMini);
        session.set_input("  hello  ");
        let request = session.begin_submit().unwrap().unwrap();

        assert_eq!(request.message, "hello");
        assert_eq!(request.session_id, session.session_id());
        assert_eq!(request.model.as_deref(), Some("GPT-4o Mini"));
        assert_eq!(session.input(), "");
        assert!(session.is_sending());
        assert_eq!(contents(&session), vec![(ChatRole::User, "hello".to_string())]);
    }

    #[test]
    fn test_second_submit_while_sending_is_ignored() {
        let mut session = ChatSession::new(ChatModel::default());
        session.set_input("first");
        assert!(session.begin_submit().unwrap().is_some());

        session.set_input("second");
        assert_eq!(session.begin_submit(), Ok(None));
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.input(), "second");
    }

    #[test]
    fn test_server_error_appends_prefixed_message_and_alert() {
        let mut session = ChatSession::new(ChatModel::default());
        session.set_input("hi");
        session.begin_submit().unwrap();
        session.finish_submit(Err(ChatError::Server("quota exceeded".to_string())));

        assert_eq!(session.state(), SubmitState::Idle);
        let last = session.transcript().messages().last().unwrap();
        assert_eq!(last.content(), "Error: quota exceeded");
        assert_eq!(last.role(), ChatRole::Assistant);
        assert_eq!(session.take_alert().unwrap().title, "Server error");
        assert!(session.take_alert().is_none());
    }

    #[test]
    fn test_network_error_is_distinguishable() {
        let mut session = ChatSession::new(ChatModel::default());
        session.set_input("hi");
        session.begin_submit().unwrap();
        session.finish_submit(Err(ChatError::Network("connection refused".to_string())));

        let last = session.transcript().messages().last().unwrap();
        assert!(last.content().starts_with(NETWORK_ERROR_PREFIX));
        assert!(!last.content().starts_with(SERVER_ERROR_PREFIX));
        assert_eq!(session.alert().unwrap().title, "Network error");
    }

    #[test]
    fn test_finish_without_pending_request() {
        let mut session = ChatSession::new(ChatModel::default());
        assert!(session.finish_submit(Ok("stray".to_string())).is_none());
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_empty_replies_become_placeholder() {
        let mut session = ChatSession::new(ChatModel::default());
        for reply in ["", "   ", "![chart](http://x/c.png)"] {
            session.set_input("hi");
            session.begin_submit().unwrap();
            session.finish_submit(Ok(reply.to_string()));
        }

        let replies: Vec<&str> = session
            .transcript()
            .messages()
            .iter()
            .filter(|m| m.role() == ChatRole::Assistant)
            .map(|m| m.content())
            .collect();
        assert_eq!(replies, vec![EMPTY_REPLY; 3]);
    }

    #[test]
    fn test_empty_response_bodies_in_transcript() {
        use crate::ai::chat::interpret_chat_response;
        use reqwest::StatusCode;

        let mut session = ChatSession::new(ChatModel::default());
        for (status, body) in [
            (StatusCode::OK, r#"{"reply":""}"#),
            (StatusCode::OK, r#"{}"#),
            (StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":""}"#),
        ] {
            session.set_input("hi");
            session.begin_submit().unwrap();
            session.finish_submit(interpret_chat_response(status, body));
        }

        assert_eq!(
            contents(&session)
                .into_iter()
                .map(|(_, text)| text)
                .collect::<Vec<_>>(),
            vec!["hi", "(empty reply)", "hi", "(empty reply)", "hi", "Error: unknown"]
        );
    }

    #[test]
    fn test_greeting_opens_the_transcript() {
        let mut session = ChatSession::with_greeting(ChatModel::default());
        assert_eq!(contents(&session), vec![(ChatRole::Assistant, GREETING.to_string())]);

        session.set_input("hello");
        session.begin_submit().unwrap();
        session.finish_submit(Ok("one".to_string()));

        let rendered = session.transcript().render();
        assert_eq!(rendered.len(), 3);
        // Roles alternate, so the greeting is its own run.
        assert!(!rendered[0].grouped_with_previous);
        assert!(!rendered[0].grouped_with_next);
        assert_eq!(rendered[2].message.content(), "one");
    }

    #[tokio::test]
    async fn test_exchange_sanitizes_reply() {
        let backend = MockChat::new(Ok("# Answer\n**yes**, [see](http://x)".to_string()));
        let mut session = ChatSession::new(ChatModel::default());
        session.set_input("question");

        let id = session.exchange(&backend).await.unwrap();
        assert!(id.is_some());
        assert_eq!(
            contents(&session),
            vec![
                (ChatRole::User, "question".to_string()),
                (ChatRole::Assistant, "Answer\nyes, see".to_string()),
            ]
        );
        assert_eq!(session.state(), SubmitState::Idle);
    }

    #[tokio::test]
    async fn test_double_submit_sends_one_request() {
        let backend = MockChat::new(Ok("ok".to_string()));
        let mut session = ChatSession::new(ChatModel::default());
        session.set_input("only once");

        let first = session.begin_submit().unwrap();
        session.set_input("only once");
        let second = session.begin_submit().unwrap();
        assert!(second.is_none());

        for request in first.iter().chain(second.iter()) {
            let result = backend.send(request).await;
            session.finish_submit(result);
        }

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        let users = session
            .transcript()
            .messages()
            .iter()
            .filter(|m| m.role() == ChatRole::User)
            .count();
        assert_eq!(users, 1);
        assert_eq!(backend.seen.lock().unwrap()[0].message, "only once");
    }

    #[test]
    fn test_voice_result_fills_input() {
        let mut session = ChatSession::new(ChatModel::default());
        session.set_input("old");
        let ticket = session.start_listening().unwrap();
        assert_eq!(session.voice_state(), VoiceState::Listening);

        session.finish_listening(ticket, Ok("spoken words".to_string()));
        assert_eq!(session.input(), "spoken words");
        assert_eq!(session.voice_state(), VoiceState::Idle);
        assert!(session.alert().is_none());
    }

    #[test]
    fn test_voice_failure_raises_alert() {
        let mut session = ChatSession::new(ChatModel::default());
        let ticket = session.start_listening().unwrap();
        session.finish_listening(
            ticket,
            Err(VoiceError::Recognition("No speech detected.".to_string())),
        );

        assert_eq!(session.input(), "");
        let alert = session.take_alert().unwrap();
        assert_eq!(alert.title, "Voice input");
        assert_eq!(alert.body, "No speech detected.");
    }

    #[test]
    fn test_voice_network_failure_raises_network_alert() {
        let mut session = ChatSession::new(ChatModel::default());
        let ticket = session.start_listening().unwrap();
        session.finish_listening(
            ticket,
            Err(VoiceError::Network("connection refused".to_string())),
        );

        assert_eq!(session.voice_state(), VoiceState::Idle);
        assert_eq!(session.input(), "");
        let alert = session.take_alert().unwrap();
        assert_eq!(alert.title, "Network error");
        assert!(alert.body.contains("connection refused"));
    }

    #[test]
    fn test_cancelled_voice_result_is_ignored() {
        let mut session = ChatSession::new(ChatModel::default());
        let ticket = session.start_listening().unwrap();
        session.cancel_listening();
        session.finish_listening(ticket, Ok("too late".to_string()));

        assert_eq!(session.input(), "");
        assert!(session.alert().is_none());
    }
}
