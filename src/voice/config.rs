//! Configuration types for the call application.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::types::{DEFAULT_PARTICIPANT, DEFAULT_ROOM};
use crate::voice::platform::JoinOptions;

/// Command-line arguments for the teller-call tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct CallArgs {
    /// Backend base URL.
    #[arrrg(optional, "Backend URL (default: $TELLER_API_URL or http://localhost:8000)", "URL")]
    pub api_url: Option<String>,

    /// Room to join.
    #[arrrg(optional, "Room to join (default: bank-abc-call)", "ROOM")]
    pub room: Option<String>,

    /// Name shown to other participants.
    #[arrrg(optional, "Your name (default: Customer)", "NAME")]
    pub name: Option<String>,

    /// Media client program that joins the room.
    #[arrrg(optional, "Media client program; without one only the credential is checked", "PROGRAM")]
    pub media_command: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECONDS")]
    pub timeout: Option<u32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a voice session.
#[derive(Debug, Clone, PartialEq)]
pub struct CallConfig {
    /// Explicit backend URL; `None` defers to the environment.
    pub api_url: Option<String>,

    /// The room label sent with the token request.
    pub room: String,

    /// The participant name; empty means [`DEFAULT_PARTICIPANT`].
    pub participant: String,

    /// External media client used to join rooms.
    pub media_command: Option<PathBuf>,

    /// What the local participant publishes.
    pub join_options: JoinOptions,

    /// Optional request timeout.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl CallConfig {
    /// Creates a new CallConfig with default values.
    pub fn new() -> Self {
        Self {
            api_url: None,
            room: DEFAULT_ROOM.to_string(),
            participant: String::new(),
            media_command: None,
            join_options: JoinOptions::default(),
            timeout: None,
            use_color: true,
        }
    }

    /// Sets the backend URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Sets the room label.
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self
    }

    /// Sets the participant name.
    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = participant.into();
        self
    }

    /// Sets the media client program.
    pub fn with_media_command(mut self, program: impl Into<PathBuf>) -> Self {
        self.media_command = Some(program.into());
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The participant name actually sent.
    pub fn participant_or_default(&self) -> &str {
        if self.participant.trim().is_empty() {
            DEFAULT_PARTICIPANT
        } else {
            &self.participant
        }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<CallArgs> for CallConfig {
    fn from(args: CallArgs) -> Self {
        CallConfig {
            api_url: args.api_url,
            room: args.room.unwrap_or_else(|| DEFAULT_ROOM.to_string()),
            participant: args.name.unwrap_or_default(),
            media_command: args.media_command.map(PathBuf::from),
            timeout: args.timeout.map(|secs| Duration::from_secs(secs.into())),
            use_color: !args.no_color,
            ..CallConfig::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CallConfig::new();
        assert_eq!(config.room, "bank-abc-call");
        assert_eq!(config.participant_or_default(), "Customer");
        assert!(config.media_command.is_none());
        assert!(config.join_options.publish_audio);
        assert!(!config.join_options.publish_video);
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args() {
        let args = CallArgs {
            api_url: Some("http://agent.internal:9000".to_string()),
            room: Some("vip-line".to_string()),
            name: Some("Jane".to_string()),
            media_command: Some("/usr/local/bin/lk-join".to_string()),
            timeout: Some(10),
            no_color: true,
        };
        let config = CallConfig::from(args);
        assert_eq!(config.api_url.as_deref(), Some("http://agent.internal:9000"));
        assert_eq!(config.room, "vip-line");
        assert_eq!(config.participant_or_default(), "Jane");
        assert_eq!(
            config.media_command,
            Some(PathBuf::from("/usr/local/bin/lk-join"))
        );
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert!(!config.use_color);
    }

    #[test]
    fn config_builder_pattern() {
        let config = CallConfig::new()
            .with_api_url("http://localhost:8001")
            .with_room("branch-7")
            .with_participant("  ")
            .with_media_command("lk-join")
            .without_color();
        assert_eq!(config.room, "branch-7");
        assert_eq!(config.participant_or_default(), "Customer");
        assert_eq!(config.media_command, Some(PathBuf::from("lk-join")));
        assert!(!config.use_color);
    }
}
