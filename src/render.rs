//! Output rendering for the chat and call front ends.
//!
//! This module provides the [`Renderer`] trait and a plain-text implementation
//! that writes to stdout with optional ANSI styling.

use std::io::{self, Stdout, Write};

use crate::types::{Message, Role};
use crate::utils::time::clock_label;
use crate::voice::{CallState, Speaker, Utterance};

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text (used for the pending indicator).
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the customer).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for call state).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for green text (used for the agent).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering session output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Print one transcript entry.
    fn print_message(&mut self, message: &Message);

    /// Show that `pending` chat turns are awaiting a reply.
    fn print_pending(&mut self, pending: usize) {
        _ = pending;
    }

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called whenever the voice call changes state.
    fn print_call_state(&mut self, state: &CallState) {
        _ = state;
    }

    /// Print one line of the voice transcript.
    fn print_utterance(&mut self, utterance: &Utterance) {
        _ = utterance;
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &Message) {
        let (style, label) = match message.role {
            Role::User => (ANSI_CYAN, "You"),
            Role::Agent => (ANSI_GREEN, "Agent"),
        };
        let stamp = self.styled(ANSI_DIM, &clock_label(message.at));
        let label = self.styled(style, label);
        let mut lines = message.content.lines();
        println!("{stamp} {label}: {}", lines.next().unwrap_or_default());
        for line in lines {
            println!("    {line}");
        }
        self.flush();
    }

    fn print_pending(&mut self, pending: usize) {
        if pending > 0 {
            let text = if pending == 1 {
                "Agent is typing...".to_string()
            } else {
                format!("Agent is typing... ({pending} replies pending)")
            };
            println!("{}", self.styled(&format!("{ANSI_DIM}{ANSI_ITALIC}"), &text));
            self.flush();
        }
    }

    fn print_error(&mut self, error: &str) {
        println!("{}", self.styled(ANSI_RED, &format!("Error: {error}")));
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        println!("{}", self.styled(ANSI_DIM, info));
        self.flush();
    }

    fn print_call_state(&mut self, state: &CallState) {
        println!("{}", self.styled(ANSI_YELLOW, &format!("[call] {state}")));
        self.flush();
    }

    fn print_utterance(&mut self, utterance: &Utterance) {
        let (style, label) = match utterance.speaker {
            Speaker::Customer => (ANSI_CYAN, "You"),
            Speaker::Agent => (ANSI_GREEN, "Agent"),
        };
        let stamp = self.styled(ANSI_DIM, &clock_label(utterance.at));
        println!("{stamp} {}: {}", self.styled(style, label), utterance.text);
        self.flush();
    }
}
