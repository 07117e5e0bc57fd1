//! Text chat with the banking agent.
//!
//! This module provides the chat session and the pieces of the `teller-chat`
//! REPL built on top of it:
//!
//! - One user entry per turn, appended before the request goes out
//! - Thread reference carried from each reply into the next turn
//! - A fixed fallback entry when the backend cannot answer
//! - Slash commands for session control
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Transcript, thread reference, and turn handling
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{
    CHAT_FALLBACK, ChatSession, InFlightTurn, PendingTurn, SessionStats, TurnOutcome,
};
