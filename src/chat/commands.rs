//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending a turn to the
//! backend.

use crate::types::ChatRoute;

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Reset the call: clear the transcript and forget the thread.
    Reset,

    /// Switch the simulated customer.
    /// `None` shows the current customer instead.
    Customer(Option<String>),

    /// List the simulated customers the backend knows.
    Customers,

    /// Show the current thread reference.
    Thread,

    /// Switch between the hosted and local agent routes.
    Route(ChatRoute),

    /// Probe the backend.
    Ping,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics.
    Stats,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular chat turn.
///
/// # Examples
///
/// ```
/// # use teller::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/customer user456").is_some());
/// assert!(parse_command("I lost my card").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "reset" | "clear" => ChatCommand::Reset,
        "customer" => ChatCommand::Customer(argument.map(|s| s.to_string())),
        "customers" => ChatCommand::Customers,
        "thread" => ChatCommand::Thread,
        "route" => match argument.map(|s| s.to_lowercase()).as_deref() {
            Some("hosted") => ChatCommand::Route(ChatRoute::Hosted),
            Some("local") => ChatCommand::Route(ChatRoute::Local),
            _ => ChatCommand::Invalid("/route expects 'hosted' or 'local'".to_string()),
        },
        "ping" | "health" => ChatCommand::Ping,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /reset                 Reset the call (clears transcript and thread)
  /customer [id]         Switch simulated customer (no argument shows it)
  /customers             List simulated customers
  /thread                Show the current thread reference
  /route hosted|local    Choose the hosted or local agent
  /ping                  Check that the backend is reachable
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat

Scenario hints:
  "I lost my card"           Triggers the block-card flow
  "Check my balance"         Requires verification
  "My last 3 transactions"   Data retrieval"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_reset() {
        assert_eq!(parse_command("/reset"), Some(ChatCommand::Reset));
        assert_eq!(parse_command("/RESET"), Some(ChatCommand::Reset));
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Reset));
    }

    #[test]
    fn parse_customer() {
        assert_eq!(
            parse_command("/customer user456"),
            Some(ChatCommand::Customer(Some("user456".to_string())))
        );
        assert_eq!(
            parse_command("/customer   guest  "),
            Some(ChatCommand::Customer(Some("guest".to_string())))
        );
        assert_eq!(parse_command("/customer"), Some(ChatCommand::Customer(None)));
        assert_eq!(parse_command("/customers"), Some(ChatCommand::Customers));
    }

    #[test]
    fn parse_route() {
        assert_eq!(
            parse_command("/route local"),
            Some(ChatCommand::Route(ChatRoute::Local))
        );
        assert_eq!(
            parse_command("/route Hosted"),
            Some(ChatCommand::Route(ChatRoute::Hosted))
        );
        assert!(matches!(
            parse_command("/route cloud"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
    }

    #[test]
    fn parse_misc() {
        assert_eq!(parse_command("/thread"), Some(ChatCommand::Thread));
        assert_eq!(parse_command("/ping"), Some(ChatCommand::Ping));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
        assert_eq!(
            parse_command("/balance"),
            Some(ChatCommand::Invalid("Unknown command: /balance".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("I lost my card"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/reset"));
        assert!(help.contains("/customer"));
        assert!(help.contains("/customers"));
        assert!(help.contains("/route hosted|local"));
        assert!(help.contains("I lost my card"));
    }
}
