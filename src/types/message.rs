use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Who authored a transcript entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The customer typing into the chat.
    User,

    /// The banking agent, or a synthetic entry standing in for it.
    Agent,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Agent => write!(f, "agent"),
        }
    }
}

/// One entry of the chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// The author of the entry.
    pub role: Role,

    /// The text shown for the entry.
    pub content: String,

    /// When the entry was appended.
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

impl Message {
    /// Create a new `Message` stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: OffsetDateTime::now_utc(),
        }
    }

    /// Create a new user `Message`.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new agent `Message`.
    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(Role::Agent, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn message_serialization() {
        let message = Message {
            role: Role::Agent,
            content: "Your card is blocked.".to_string(),
            at: datetime!(2025-01-02 03:04:05 UTC),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "agent",
                "content": "Your card is blocked.",
                "at": "2025-01-02T03:04:05Z"
            })
        );
    }

    #[test]
    fn constructors_set_role() {
        assert_eq!(Message::user("hi").role, Role::User);
        assert_eq!(Message::agent("hello").role, Role::Agent);
        assert_eq!(Role::Agent.to_string(), "agent");
    }
}
