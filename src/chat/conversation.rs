// Conversation model - the ordered list of turns shown in the transcript
//
// Messages are replaced, never edited: the streaming assistant message gets a
// brand new Message (previous content + delta) on every fragment. Everything
// else is append-only, so the display order is exactly the submission order.
//
// The system preamble never lives here. It is merged into the outgoing copy
// by `outbound()` when the request is built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single turn. Serializes as `{"role": "...", "content": "..."}`, which is
/// the shape both backends accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sequencing faults: a delta or fallback aimed at a slot that is not the
/// live assistant message. These indicate a logic bug, never user error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("slot {slot} is out of range (conversation has {len} messages)")]
    OutOfRange { slot: usize, len: usize },

    #[error("slot {slot} is not the last message (conversation has {len} messages)")]
    NotLast { slot: usize, len: usize },

    #[error("slot {slot} holds a {role} message, expected assistant")]
    NotAssistant { slot: usize, role: &'static str },
}

/// Ordered, in-memory conversation for the active session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// Append the literal submitted text as a user turn
    pub fn append_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Append an empty assistant message and return its slot index
    pub fn begin_assistant_turn(&mut self) -> usize {
        self.messages.push(Message::assistant(String::new()));
        self.messages.len() - 1
    }

    /// Replace the assistant message at `slot` with `previous + delta`.
    ///
    /// On a sequencing fault the conversation is left untouched and the fault
    /// is logged; callers may ignore the returned error.
    pub fn apply_delta(&mut self, slot: usize, delta: &str) -> Result<(), ConversationError> {
        self.check_streaming_slot(slot).inspect_err(|err| {
            tracing::error!(slot, delta_len = delta.len(), "apply_delta skipped: {}", err);
        })?;

        let previous = &self.messages[slot];
        let mut content = String::with_capacity(previous.content.len() + delta.len());
        content.push_str(&previous.content);
        content.push_str(delta);
        self.messages[slot] = Message::assistant(content);
        Ok(())
    }

    /// Overwrite the assistant message at `slot` with the user-facing failure
    /// text, discarding whatever was streamed so far.
    pub fn finalize_or_fail(&mut self, slot: usize, fallback: &str) -> Result<(), ConversationError> {
        self.check_streaming_slot(slot).inspect_err(|err| {
            tracing::error!(slot, "finalize_or_fail skipped: {}", err);
        })?;

        self.messages[slot] = Message::assistant(fallback);
        Ok(())
    }

    /// Build the backend request: every turn as displayed, except the newest
    /// user turn which gets the preamble prefixed onto its content.
    pub fn outbound(&self, preamble: &str) -> Vec<Message> {
        let mut messages = self.messages.clone();
        if let Some(last_user) = messages.iter_mut().rev().find(|m| m.role == Role::User) {
            last_user.content = format!("{}{}", preamble, last_user.content);
        }
        messages
    }

    fn check_streaming_slot(&self, slot: usize) -> Result<(), ConversationError> {
        let len = self.messages.len();
        let Some(message) = self.messages.get(slot) else {
            return Err(ConversationError::OutOfRange { slot, len });
        };
        if slot + 1 != len {
            return Err(ConversationError::NotLast { slot, len });
        }
        if message.role != Role::Assistant {
            return Err(ConversationError::NotAssistant {
                slot,
                role: message.role.as_str(),
            });
        }
        Ok(())
    }
}
