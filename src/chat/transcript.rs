use super::message::{ChatMessage, Role};

/// Whether an assistant reply is currently being grown, and where it lives.
/// Tracked explicitly rather than by inspecting the last message's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ReplySlot {
    #[default]
    NoActiveReply,
    ActiveReply(usize),
}

/// Ordered role-tagged message history for one chat dialog. Append-only,
/// except for the in-flight assistant reply which is rewritten in place as
/// deltas arrive.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    reply: ReplySlot,
    assistant_content: String,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
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

    /// Appends a user turn. Any previous reply is finalized first.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.finalize_reply();
        self.messages.push(ChatMessage::user(content));
    }

    /// Folds one content delta into the active assistant reply, creating the
    /// reply message on the first delta.
    pub fn apply_delta(&mut self, delta: &str) {
        self.assistant_content.push_str(delta);
        match self.reply {
            ReplySlot::ActiveReply(index) => {
                self.messages[index].content = self.assistant_content.clone();
            }
            ReplySlot::NoActiveReply => {
                self.messages
                    .push(ChatMessage::assistant(self.assistant_content.clone()));
                self.reply = ReplySlot::ActiveReply(self.messages.len() - 1);
            }
        }
    }

    /// True once the in-flight reply has received any content.
    pub fn has_reply_content(&self) -> bool {
        !self.assistant_content.is_empty()
    }

    /// Seals the in-flight reply; no further mutation of it is possible.
    pub fn finalize_reply(&mut self) {
        self.reply = ReplySlot::NoActiveReply;
        self.assistant_content.clear();
    }

    /// Rolls the history back to `len_before` messages, dropping the
    /// optimistic user turn and any partial reply after it.
    pub fn rollback_to(&mut self, len_before: usize) {
        self.messages.truncate(len_before);
        self.finalize_reply();
    }

    /// Empties the dialog (closed/reopened lifecycle).
    pub fn clear(&mut self) {
        self.messages.clear();
        self.finalize_reply();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_grow_a_single_assistant_message() {
        let mut transcript = Transcript::new();
        transcript.push_user("hello?");
        transcript.apply_delta("Hel");
        transcript.apply_delta("lo");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[1].role, Role::Assistant);
        assert_eq!(transcript.messages()[1].content, "Hello");
    }

    #[test]
    fn finalized_reply_is_not_mutated_by_the_next_turn() {
        let mut transcript = Transcript::new();
        transcript.push_user("first");
        transcript.apply_delta("one");
        transcript.finalize_reply();
        transcript.push_user("second");
        transcript.apply_delta("two");
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.messages()[1].content, "one");
        assert_eq!(transcript.messages()[3].content, "two");
    }

    #[test]
    fn rollback_drops_the_user_turn_and_partial_reply() {
        let mut transcript = Transcript::new();
        transcript.push_user("kept");
        transcript.apply_delta("kept reply");
        transcript.finalize_reply();

        let len_before = transcript.len();
        transcript.push_user("doomed");
        transcript.apply_delta("partial");
        transcript.rollback_to(len_before);

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].content, "kept");
        assert!(!transcript.has_reply_content());
    }

    #[test]
    fn clear_empties_everything() {
        let mut transcript = Transcript::new();
        transcript.push_user("a");
        transcript.apply_delta("b");
        transcript.clear();
        assert!(transcript.is_empty());
        assert!(!transcript.has_reply_content());
    }
}
