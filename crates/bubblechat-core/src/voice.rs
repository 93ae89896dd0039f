//! Voice-input state machine.
//!
//! One button press starts a listen; the result either fills the input field
//! or surfaces an error. Dismissing the listening popup cancels: any result
//! that arrives afterwards carries a stale ticket and is dropped.

use crate::error::VoiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Listening,
}

/// Identifies one listen attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenTicket(u64);

#[derive(Debug, Default)]
pub struct VoiceInput {
    state: VoiceState,
    generation: u64,
}

impl VoiceInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == VoiceState::Listening
    }

    /// Begin listening. Returns `None` if a listen is already running.
    pub fn start(&mut self) -> Option<ListenTicket> {
        if self.is_listening() {
            return None;
        }
        self.generation += 1;
        self.state = VoiceState::Listening;
        Some(ListenTicket(self.generation))
    }

    /// Accept a result for `ticket`. Stale or unexpected results yield `None`.
    pub fn finish(
        &mut self,
        ticket: ListenTicket,
        result: Result<String, VoiceError>,
    ) -> Option<Result<String, VoiceError>> {
        if !self.is_listening() || ticket.0 != self.generation {
            tracing::debug!(ticket = ticket.0, "dropping stale voice result");
            return None;
        }
        self.state = VoiceState::Idle;
        Some(result)
    }

    pub fn cancel(&mut self) {
        if self.is_listening() {
            // Bump the generation so a late reply for this attempt is ignored.
            self.generation += 1;
            self.state = VoiceState::Idle;
        }
    }
}
