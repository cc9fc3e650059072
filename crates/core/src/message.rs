//! Conversation turn types.
//!
//! The wire shape is exactly what OpenAI-compatible chat APIs expect:
//! `{"role": "user", "content": "..."}`. Clients carry the history
//! between calls; the service never stores it.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (persona, output format)
    System,
    /// The end user
    User,
    /// The model
    Assistant,
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello!");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn unknown_role_rejected() {
        let result: Result<Message, _> =
            serde_json::from_str(r#"{"role": "tool", "content": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_field_rejected() {
        let result: Result<Message, _> =
            serde_json::from_str(r#"{"role": "user", "content": "x", "name": "bob"}"#);
        assert!(result.is_err());
    }
}
