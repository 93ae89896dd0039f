//! The ordered message list for one chat session.

use chrono::Timelike;

use crate::state::{ChatMessage, ChatRole, MessageId};

/// A message plus its adjacency flags, as handed to the renderer.
///
/// The flags only decide which bubble corners get softened; two same-role
/// messages merge visually no matter how far apart in time they were sent.
#[derive(Debug, Clone, Copy)]
pub struct RenderedMessage<'a> {
    pub message: &'a ChatMessage,
    pub grouped_with_previous: bool,
    pub grouped_with_next: bool,
}

/// Append-only, insertion-ordered list of messages.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next message id.
    pub fn next_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Add a message to the end. This is the only way the list changes.
    pub fn append(&mut self, message: ChatMessage) {
        // Keep ids ahead of anything built outside `next_id`.
        self.next_id = self.next_id.max(message.id().0.saturating_add(1));
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> MessageId {
        self.push(ChatRole::User, content)
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> MessageId {
        self.push(ChatRole::Assistant, content)
    }

    fn push(&mut self, role: ChatRole, content: impl Into<String>) -> MessageId {
        let id = self.next_id();
        self.append(ChatMessage::new(id, role, content));
        id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Pair every message with its grouping flags. Recomputed on each call.
    pub fn render(&self) -> Vec<RenderedMessage<'_>> {
        let same_role = |i: usize, j: Option<usize>| {
            j.and_then(|j| self.messages.get(j))
                .is_some_and(|other| other.role() == self.messages[i].role())
        };

        (0..self.messages.len())
            .map(|i| RenderedMessage {
                message: &self.messages[i],
                grouped_with_previous: same_role(i, i.checked_sub(1)),
                grouped_with_next: same_role(i, Some(i + 1)),
            })
            .collect()
    }
}

/// 12-hour `h:mm AM/PM`, e.g. `12:05 AM` or `1:00 PM`.
pub fn format_time<T: Timelike>(time: &T) -> String {
    let (is_pm, hour) = time.hour12();
    let meridiem = if is_pm { "PM" } else { "AM" };
    format!("{}:{:02} {}", hour, time.minute(), meridiem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn roles(transcript: &Transcript) -> Vec<(bool, bool)> {
        transcript
            .render()
            .iter()
            .map(|r| (r.grouped_with_previous, r.grouped_with_next))
            .collect()
    }

    #[test]
    fn test_grouping_user_user_assistant() {
        let mut transcript = Transcript::new();
        transcript.push_user("hi");
        transcript.push_user("are you there?");
        transcript.push_assistant("yes");

        assert_eq!(
            roles(&transcript),
            vec![(false, true), (true, false), (false, false)]
        );
    }

    #[test]
    fn test_grouping_alternating_and_single() {
        let mut transcript = Transcript::new();
        assert!(transcript.render().is_empty());

        transcript.push_assistant("welcome");
        assert_eq!(roles(&transcript), vec![(false, false)]);

        transcript.push_user("a");
        transcript.push_assistant("b");
        transcript.push_assistant("c");
        assert_eq!(
            roles(&transcript),
            vec![(false, false), (false, false), (false, true), (true, false)]
        );
    }

    #[test]
    fn test_append_preserves_insertion_order_and_ids() {
        let mut transcript = Transcript::new();
        let first = transcript.push_user("one");
        let second = transcript.push_assistant("two");
        assert!(first < second);

        let contents: Vec<&str> = transcript.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["one", "two"]);
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_append_external_message_advances_ids() {
        let mut transcript = Transcript::new();
        transcript.append(ChatMessage::new(MessageId(41), ChatRole::User, "x"));
        assert_eq!(transcript.next_id(), MessageId(42));
    }

    #[test]
    fn test_append_max_id_does_not_overflow() {
        let mut transcript = Transcript::new();
        transcript.append(ChatMessage::new(MessageId(u64::MAX), ChatRole::User, "x"));
        assert_eq!(transcript.next_id(), MessageId(u64::MAX));
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_format_time() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(format_time(&t(0, 5)), "12:05 AM");
        assert_eq!(format_time(&t(13, 0)), "1:00 PM");
        assert_eq!(format_time(&t(12, 30)), "12:30 PM");
        assert_eq!(format_time(&t(9, 7)), "9:07 AM");
        assert_eq!(format_time(&t(23, 59)), "11:59 PM");
    }
}
