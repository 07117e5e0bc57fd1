//! The closed set of ways a call attempt can fail, and what the user sees.

use std::fmt;

use crate::error::Error;

/// Text shown when the platform reports an error without any text.
const DEFAULT_MEDIA_ERROR: &str = "Invalid API key or connection error";

/// Why a call did not start or did not survive.
///
/// Every variant maps to fixed display text; nothing is matched on error
/// strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    /// The backend handed out placeholder or missing media credentials.
    NotConfigured,
    /// The backend answered the token request with a server-fault status.
    BackendFault,
    /// The backend could not be reached or answered with any other failure.
    Unreachable,
    /// The media platform rejected or dropped the connection.
    Media(Option<String>),
}

impl CallFailure {
    /// Classify a failed credential request.
    pub fn from_credential_error(err: &Error) -> Self {
        if err.is_configuration() {
            CallFailure::NotConfigured
        } else if err.is_server_error() {
            CallFailure::BackendFault
        } else {
            CallFailure::Unreachable
        }
    }

    /// Classify a failure reported by the media platform.
    pub fn from_media_error(err: &Error) -> Self {
        match err {
            Error::Media { message } => Self::media(message.clone()),
            other => Self::media(Some(other.to_string())),
        }
    }

    /// A media failure; blank text counts as none.
    pub fn media(message: Option<String>) -> Self {
        CallFailure::Media(message.filter(|m| !m.trim().is_empty()))
    }

    /// Returns true if retrying without fixing the backend cannot help.
    pub fn is_configuration(&self) -> bool {
        matches!(self, CallFailure::NotConfigured | CallFailure::BackendFault)
    }
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallFailure::NotConfigured => write!(
                f,
                "Media credentials are not configured. Add valid LIVEKIT_URL, \
                 LIVEKIT_API_KEY, and LIVEKIT_API_SECRET to the backend environment."
            ),
            CallFailure::BackendFault => write!(
                f,
                "Backend error: media credentials may be missing or invalid. \
                 Check the backend configuration."
            ),
            CallFailure::Unreachable => write!(
                f,
                "Failed to connect to the voice server. Check that the backend is running."
            ),
            CallFailure::Media(message) => write!(
                f,
                "Connection failed: {}",
                message.as_deref().unwrap_or(DEFAULT_MEDIA_ERROR)
            ),
        }
    }
}
