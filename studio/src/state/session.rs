//! The design session: which project and version are open, and the chat.

use frames::{Message, Role};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Local id for log correlation; never sent to the collaborator.
    pub session_id: Uuid,
    pub project_id: String,
    /// The active version.
    pub frame_id: String,
    pub description: Option<String>,
    pub messages: Vec<Message>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl Session {
    #[must_use]
    pub fn new(project_id: impl Into<String>, frame_id: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            project_id: project_id.into(),
            frame_id: frame_id.into(),
            description: None,
            messages: Vec::new(),
        }
    }

    /// The latest user message, if the conversation ends with one.
    #[must_use]
    pub fn pending_prompt(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Overwrite the trailing assistant message, appending one if needed.
    pub fn set_assistant_tail(&mut self, content: impl Into<String>) {
        set_assistant_tail(&mut self.messages, content);
    }

    /// Remove the message with remote id `id`. Returns whether one was found.
    pub fn remove_message(&mut self, id: i64) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != Some(id));
        self.messages.len() != before
    }
}

/// Overwrite the trailing assistant message of `messages`, appending one if
/// the conversation does not end with one.
pub fn set_assistant_tail(messages: &mut Vec<Message>, content: impl Into<String>) {
    let content = content.into();
    match messages.last_mut() {
        Some(last) if last.role == Role::Assistant => last.content = content,
        _ => messages.push(Message::assistant(content)),
    }
}
