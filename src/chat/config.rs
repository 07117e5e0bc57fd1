//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::types::{ChatRoute, CustomerId};

/// Command-line arguments for the teller-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend base URL.
    #[arrrg(optional, "Backend URL (default: $TELLER_API_URL or http://localhost:8000)", "URL")]
    pub api_url: Option<String>,

    /// Simulated customer identifier.
    #[arrrg(optional, "Simulated customer: user123, user456, guest (default: user123)", "ID")]
    pub customer: Option<String>,

    /// Use the local-model agent route.
    #[arrrg(flag, "Talk to the local-model agent at /chat/local")]
    pub local: bool,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECONDS")]
    pub timeout: Option<u32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Explicit backend URL; `None` defers to the environment.
    pub api_url: Option<String>,

    /// The customer every turn is sent on behalf of.
    pub customer: CustomerId,

    /// Which backend route serves turns.
    pub route: ChatRoute,

    /// Optional request timeout.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Customer: user123
    /// - Route: hosted
    /// - Timeout: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            api_url: None,
            customer: CustomerId::default(),
            route: ChatRoute::Hosted,
            timeout: None,
            use_color: true,
        }
    }

    /// Sets the backend URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Sets the customer.
    pub fn with_customer(mut self, customer: CustomerId) -> Self {
        self.customer = customer;
        self
    }

    /// Sets the route.
    pub fn with_route(mut self, route: ChatRoute) -> Self {
        self.route = route;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            api_url: args.api_url,
            customer: args.customer.map(CustomerId::from).unwrap_or_default(),
            route: if args.local {
                ChatRoute::Local
            } else {
                ChatRoute::Hosted
            },
            timeout: args.timeout.map(|secs| Duration::from_secs(secs.into())),
            use_color: !args.no_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert!(config.api_url.is_none());
        assert_eq!(config.customer.as_str(), "user123");
        assert_eq!(config.route, ChatRoute::Hosted);
        assert!(config.timeout.is_none());
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            api_url: Some("http://agent.internal:9000".to_string()),
            customer: Some("guest".to_string()),
            local: true,
            timeout: Some(15),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.api_url.as_deref(), Some("http://agent.internal:9000"));
        assert!(config.customer.is_guest());
        assert_eq!(config.route, ChatRoute::Local);
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert!(!config.use_color);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_api_url("http://localhost:8001")
            .with_customer(CustomerId::from("user456"))
            .with_route(ChatRoute::Local)
            .with_timeout(Some(Duration::from_secs(5)))
            .without_color();
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8001"));
        assert_eq!(config.customer.as_str(), "user456");
        assert_eq!(config.route, ChatRoute::Local);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(!config.use_color);
    }
}
