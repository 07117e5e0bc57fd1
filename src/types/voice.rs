use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Error, Result};

/// Substring of the media-server URL an unconfigured backend hands out.
pub const PLACEHOLDER_MEDIA_HOST: &str = "your-project.livekit.cloud";

/// Room joined when the caller does not name one.
pub const DEFAULT_ROOM: &str = "bank-abc-call";

/// Participant name used when the caller leaves theirs empty.
pub const DEFAULT_PARTICIPANT: &str = "Customer";

/// Body returned by `POST /voice/token`.
///
/// `url` is null when the backend has no media server configured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    /// Signed access token for the room.
    pub token: String,

    /// Media-server URL to connect to.
    pub url: Option<String>,

    /// The room the token grants access to.
    pub room_name: String,
}

/// Query of `POST /voice/token`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenParams {
    /// The room to join.
    pub room_name: String,

    /// The name other participants see.
    pub participant_name: String,
}

impl TokenParams {
    /// Build the query, substituting defaults for empty inputs.
    pub fn new(room_name: &str, participant_name: &str) -> Self {
        let room_name = room_name.trim();
        let participant_name = participant_name.trim();
        Self {
            room_name: if room_name.is_empty() {
                DEFAULT_ROOM.to_string()
            } else {
                room_name.to_string()
            },
            participant_name: if participant_name.is_empty() {
                DEFAULT_PARTICIPANT.to_string()
            } else {
                participant_name.to_string()
            },
        }
    }
}

/// A short-lived credential for one call attempt.
///
/// The credential lives in memory only and is dropped when the call ends; it
/// does not implement `Serialize`.
#[derive(Clone, PartialEq, Eq)]
pub struct VoiceCredential {
    access_token: String,
    media_server_url: String,
    room_name: String,
}

impl VoiceCredential {
    /// Assemble a credential from its parts.
    pub fn new(
        access_token: impl Into<String>,
        media_server_url: impl Into<String>,
        room_name: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            media_server_url: media_server_url.into(),
            room_name: room_name.into(),
        }
    }

    /// Validate a token response from the backend.
    ///
    /// A missing, empty, or placeholder media-server URL means the backend was
    /// never configured, which is reported as [`Error::Configuration`].
    pub fn from_response(response: TokenResponse) -> Result<Self> {
        let url = response.url.unwrap_or_default();
        if url.trim().is_empty() {
            return Err(Error::configuration(
                "backend returned no media server URL",
            ));
        }
        if is_placeholder_url(&url) {
            return Err(Error::configuration(format!(
                "backend returned placeholder media server URL {url}"
            )));
        }
        Ok(Self::new(response.token, url, response.room_name))
    }

    /// The signed access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The media-server URL.
    pub fn media_server_url(&self) -> &str {
        &self.media_server_url
    }

    /// The room the credential grants access to.
    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    /// The expiry embedded in the access token, if the token is a JWT with an
    /// `exp` claim.
    pub fn expires_at(&self) -> Result<Option<OffsetDateTime>> {
        #[derive(Deserialize)]
        struct Claims {
            exp: Option<i64>,
        }

        let Some(payload) = self.access_token.split('.').nth(1) else {
            return Ok(None);
        };
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let claims: Claims = serde_json::from_slice(&bytes)?;
        claims
            .exp
            .map(|exp| {
                OffsetDateTime::from_unix_timestamp(exp).map_err(|err| {
                    Error::encoding(format!("token expiry out of range: {err}"), Some(Box::new(err)))
                })
            })
            .transpose()
    }
}

impl std::fmt::Debug for VoiceCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceCredential")
            .field("access_token", &"[REDACTED]")
            .field("media_server_url", &self.media_server_url)
            .field("room_name", &self.room_name)
            .finish()
    }
}

/// Returns true if `url` points at the placeholder media host.
pub fn is_placeholder_url(url: &str) -> bool {
    url.contains(PLACEHOLDER_MEDIA_HOST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn jwt(claims: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn params_fill_defaults() {
        let params = TokenParams::new("", "   ");
        assert_eq!(params.room_name, DEFAULT_ROOM);
        assert_eq!(params.participant_name, DEFAULT_PARTICIPANT);

        let params = TokenParams::new("vip-line", "Jane");
        assert_eq!(params.room_name, "vip-line");
        assert_eq!(params.participant_name, "Jane");
    }

    #[test]
    fn placeholder_url_is_configuration_error() {
        let response = TokenResponse {
            token: "tok".to_string(),
            url: Some("wss://your-project.livekit.cloud".to_string()),
            room_name: DEFAULT_ROOM.to_string(),
        };
        let err = VoiceCredential::from_response(response).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn missing_url_is_configuration_error() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"token": "tok", "url": null, "room_name": "r"}"#).unwrap();
        assert!(VoiceCredential::from_response(response).unwrap_err().is_configuration());
    }

    #[test]
    fn real_url_is_accepted() {
        let response = TokenResponse {
            token: "tok".to_string(),
            url: Some("wss://bank-abc.livekit.cloud".to_string()),
            room_name: "bank-abc-call".to_string(),
        };
        let credential = VoiceCredential::from_response(response).unwrap();
        assert_eq!(credential.access_token(), "tok");
        assert_eq!(credential.media_server_url(), "wss://bank-abc.livekit.cloud");
        assert_eq!(credential.room_name(), "bank-abc-call");
        assert!(!format!("{credential:?}").contains("tok\""));
    }

    #[test]
    fn expiry_from_jwt() {
        let credential = VoiceCredential::new(
            jwt(r#"{"sub":"Customer","exp":1735787045}"#),
            "wss://media.example",
            "r",
        );
        assert_eq!(
            credential.expires_at().unwrap(),
            Some(datetime!(2025-01-02 03:04:05 UTC))
        );
    }

    #[test]
    fn expiry_absent() {
        let credential = VoiceCredential::new(jwt(r#"{"sub":"Customer"}"#), "wss://m", "r");
        assert_eq!(credential.expires_at().unwrap(), None);
        let credential = VoiceCredential::new("opaque", "wss://m", "r");
        assert_eq!(credential.expires_at().unwrap(), None);
    }
}
