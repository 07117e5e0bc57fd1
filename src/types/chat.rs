use serde::{Deserialize, Serialize};

use crate::types::CustomerId;

/// Opaque identifier the backend uses to resume a server-side conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadRef(String);

impl ThreadRef {
    /// Wrap a backend-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// The user's text as typed.
    pub message: String,

    /// The customer the turn is on behalf of.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,

    /// The thread to resume; absent on the first turn and after a reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<ThreadRef>,
}

impl ChatRequest {
    /// Create a request for a first turn.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            customer_id: None,
            thread_id: None,
        }
    }

    /// Attach a customer identifier.
    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Attach (or clear) the thread to resume.
    pub fn with_thread(mut self, thread_id: Option<ThreadRef>) -> Self {
        self.thread_id = thread_id;
        self
    }
}

/// Body returned by `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    /// The agent's answer.
    pub response: String,

    /// The thread the backend filed the exchange under.
    pub thread_id: ThreadRef,
}

/// Which backend route serves chat turns.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ChatRoute {
    /// The hosted agent at `/chat`.
    #[default]
    Hosted,

    /// The local-model agent at `/chat/local`.
    Local,
}

impl ChatRoute {
    /// Path of the route relative to the backend base URL.
    pub fn path(&self) -> &'static str {
        match self {
            ChatRoute::Hosted => "chat",
            ChatRoute::Local => "chat/local",
        }
    }
}
