// Public modules
pub mod chat;
pub mod customer;
pub mod message;
pub mod voice;

// Re-exports
pub use chat::{ChatReply, ChatRequest, ChatRoute, ThreadRef};
pub use customer::{CustomerId, KNOWN_CUSTOMERS};
pub use message::{Message, Role};
pub use voice::{
    DEFAULT_PARTICIPANT, DEFAULT_ROOM, PLACEHOLDER_MEDIA_HOST, TokenParams, TokenResponse,
    VoiceCredential, is_placeholder_url,
};
