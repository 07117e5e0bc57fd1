//! Logging trait for backend operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! every exchange passing through the [`AgentClient`](crate::AgentClient).

use crate::error::Error;
use crate::types::{ChatReply, ChatRequest, VoiceCredential};

/// A trait for logging backend exchanges.
///
/// Implement this trait to record chat turns and credential requests, for
/// example to keep an audit trail of a demo session.
///
/// # Example
///
/// ```rust,ignore
/// use teller::{ChatReply, ChatRequest, ClientLogger, Error, VoiceCredential};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_chat(&self, request: &ChatRequest, reply: &ChatReply) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "{} -> {}", request.message, reply.response).unwrap();
///     }
///
///     fn log_credential(&self, credential: &VoiceCredential) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "credential for {}", credential.room_name()).unwrap();
///     }
///
///     fn log_failure(&self, operation: &str, error: &Error) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "{operation} failed: {error}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a completed chat exchange.
    ///
    /// Called once per successful `send_chat` call with the request as sent
    /// and the backend's reply.
    fn log_chat(&self, request: &ChatRequest, reply: &ChatReply);

    /// Log an issued voice credential.
    ///
    /// Called after the credential passed validation.  Implementations must
    /// not persist the access token.
    fn log_credential(&self, credential: &VoiceCredential);

    /// Log a failed backend operation.
    ///
    /// `operation` names the call (`"chat"`, `"voice_token"`, `"health"`).
    fn log_failure(&self, operation: &str, error: &Error);
}
