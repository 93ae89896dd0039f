use std::sync::Arc;

use bubblechat_core::{
    ChatBackend, ChatError, ChatModel, ChatSession, ListenTicket, VoiceBackend, VoiceError,
    VoiceState,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: ChatSession,

    // Input editing
    pub input_cursor: usize, // cursor position in session input, in chars

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16,       // Inner height of chat area for scroll calculations
    pub chat_width: u16,        // Inner width of chat area for bubble wrapping
    pub chat_total_lines: u16,  // Rendered line count, updated during render
    pub follow_bottom: bool,    // Keep the newest message in view
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Model picker state
    pub show_model_picker: bool,
    pub model_picker_state: ListState,

    // Backend status from the startup health probe (None while checking)
    pub backend_online: Option<bool>,

    // Network plumbing
    chat_backend: Arc<dyn ChatBackend>,
    voice_backend: Arc<dyn VoiceBackend>,
    events: UnboundedSender<AppEvent>,
    chat_task: Option<JoinHandle<()>>,
    voice_task: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(
        session: ChatSession,
        chat_backend: Arc<dyn ChatBackend>,
        voice_backend: Arc<dyn VoiceBackend>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            session,

            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_total_lines: 0,
            follow_bottom: true,
            chat_area: None,

            animation_frame: 0,

            show_model_picker: false,
            model_picker_state: ListState::default(),

            backend_online: None,

            chat_backend,
            voice_backend,
            events,
            chat_task: None,
            voice_task: None,
        }
    }

    /// Send the current input. Ignored while a reply is pending.
    pub fn submit(&mut self) {
        match self.session.begin_submit() {
            Ok(Some(request)) => {
                tracing::info!(session = %request.session_id, model = ?request.model, "sending message");
                self.input_cursor = 0;
                self.follow_bottom = true;

                let backend = Arc::clone(&self.chat_backend);
                let tx = self.events.clone();
                self.chat_task = Some(tokio::spawn(async move {
                    let result = backend.send(&request).await;
                    let _ = tx.send(AppEvent::ChatReply(result));
                }));
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "submit rejected"),
        }
    }

    pub fn on_chat_reply(&mut self, result: Result<String, ChatError>) {
        self.chat_task = None;
        self.session.finish_submit(result);
        self.follow_bottom = true;
    }

    /// Start a voice capture on the transcription service.
    pub fn start_voice(&mut self) {
        let Some(ticket) = self.session.start_listening() else {
            return;
        };
        tracing::info!("listening for voice input");

        let backend = Arc::clone(&self.voice_backend);
        let tx = self.events.clone();
        self.voice_task = Some(tokio::spawn(async move {
            let result = backend.listen().await;
            let _ = tx.send(AppEvent::VoiceReply(ticket, result));
        }));
    }

    /// Dismiss the listening popup and drop the in-flight request.
    pub fn cancel_voice(&mut self) {
        if let Some(task) = self.voice_task.take() {
            task.abort();
        }
        self.session.cancel_listening();
        tracing::info!("voice input cancelled");
    }

    pub fn on_voice_reply(&mut self, ticket: ListenTicket, result: Result<String, VoiceError>) {
        self.session.finish_listening(ticket, result);
        if self.session.voice_state() != VoiceState::Listening {
            self.voice_task = None;
        }
        self.input_cursor = self.session.input().chars().count();
    }

    pub fn dismiss_alert(&mut self) {
        self.session.take_alert();
    }

    /// Abort anything still in flight before the runtime goes away.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.chat_task.take() {
            task.abort();
        }
        if let Some(task) = self.voice_task.take() {
            task.abort();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    fn max_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_bottom = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_bottom = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
        self.follow_bottom = true;
    }

    /// Called from render once the content height is known.
    pub fn update_chat_metrics(&mut self, total_lines: u16, height: u16, width: u16) {
        self.chat_total_lines = total_lines;
        self.chat_height = height;
        self.chat_width = width;
        if self.follow_bottom {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }

    // Model picker methods
    pub fn open_model_picker(&mut self) {
        let current_idx = ChatModel::all()
            .iter()
            .position(|m| *m == self.session.selected_model())
            .unwrap_or(0);
        self.model_picker_state.select(Some(current_idx));
        self.show_model_picker = true;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = ChatModel::all().len();
        let i = self.model_picker_state.selected().map_or(0, |i| (i + 1) % len);
        self.model_picker_state.select(Some(i));
    }

    pub fn model_picker_nav_up(&mut self) {
        let len = ChatModel::all().len();
        let i = self.model_picker_state.selected().map_or(0, |i| (i + len - 1) % len);
        self.model_picker_state.select(Some(i));
    }

    pub fn select_model(&mut self) {
        if let Some(model) = self
            .model_picker_state
            .selected()
            .and_then(|i| ChatModel::all().get(i).copied())
        {
            self.session.select_model(model);
        }
        self.show_model_picker = false;
    }
}
