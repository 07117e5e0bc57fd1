//! The voice call state machine.

use std::fmt;
use std::time::Instant;

use crate::client::AgentClient;
use crate::observability::{
    VOICE_CALL_ATTEMPTS, VOICE_CALL_DURATION, VOICE_CREDENTIAL_FAILURES, VOICE_JOINS,
    VOICE_MEDIA_ERRORS, VOICE_PLACEHOLDER_REJECTIONS,
};
use crate::types::{TokenParams, VoiceCredential};
use crate::voice::config::CallConfig;
use crate::voice::failure::CallFailure;
use crate::voice::platform::{MediaPlatform, RoomConnection, RoomEvent};
use crate::voice::transcript::TranscriptPanel;

/// Where a call is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallState {
    /// No credential, not connected.
    Idle,
    /// A credential was requested or obtained; the room is not joined yet.
    Connecting,
    /// Joined; audio is flowing.
    Connected {
        /// The room joined.
        room_name: String,
    },
}

impl CallState {
    /// Returns true when no call is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self, CallState::Idle)
    }

    /// Returns true once the room is joined.
    pub fn is_connected(&self) -> bool {
        matches!(self, CallState::Connected { .. })
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Idle => write!(f, "idle"),
            CallState::Connecting => write!(f, "connecting..."),
            CallState::Connected { room_name } => write!(f, "connected to {room_name}"),
        }
    }
}

/// One caller's voice session.
///
/// The session owns the credential and the media connection for the call in
/// progress and drops both whenever the call returns to [`CallState::Idle`].
pub struct VoiceSession {
    client: AgentClient,
    config: CallConfig,
    state: CallState,
    credential: Option<VoiceCredential>,
    connection: Option<Box<dyn RoomConnection>>,
    last_failure: Option<CallFailure>,
    connected_at: Option<Instant>,
    transcript: TranscriptPanel,
}

impl VoiceSession {
    /// Creates an idle session.
    pub fn new(client: AgentClient, config: CallConfig) -> Self {
        Self {
            client,
            config,
            state: CallState::Idle,
            credential: None,
            connection: None,
            last_failure: None,
            connected_at: None,
            transcript: TranscriptPanel::new(),
        }
    }

    /// The current state.
    pub fn state(&self) -> &CallState {
        &self.state
    }

    /// The failure that last returned the call to idle, if any.
    ///
    /// Cleared when a new call attempt starts.
    pub fn last_failure(&self) -> Option<&CallFailure> {
        self.last_failure.as_ref()
    }

    /// The credential of the call in progress.
    pub fn credential(&self) -> Option<&VoiceCredential> {
        self.credential.as_ref()
    }

    /// The session configuration.
    pub fn config(&self) -> &CallConfig {
        &self.config
    }

    /// The transcript of the current call.
    pub fn transcript(&self) -> &TranscriptPanel {
        &self.transcript
    }

    /// The transcript of the current call, for attaching a feed.
    pub fn transcript_mut(&mut self) -> &mut TranscriptPanel {
        &mut self.transcript
    }

    /// Requests a fresh credential for the configured room and participant.
    ///
    /// Any call in progress is ended first.  On success the session is
    /// [`CallState::Connecting`]; on failure it is back to idle with
    /// [`last_failure`](Self::last_failure) set.
    pub async fn request_credential(&mut self) -> Result<VoiceCredential, CallFailure> {
        if !self.state.is_idle() {
            self.end_call().await;
        }
        VOICE_CALL_ATTEMPTS.click();
        self.last_failure = None;
        self.transcript.clear();
        self.state = CallState::Connecting;

        let params = TokenParams::new(&self.config.room, &self.config.participant);
        match self.client.request_voice_token(&params).await {
            Ok(credential) => {
                self.credential = Some(credential.clone());
                Ok(credential)
            }
            Err(err) => {
                let failure = CallFailure::from_credential_error(&err);
                if failure == CallFailure::NotConfigured {
                    VOICE_PLACEHOLDER_REJECTIONS.click();
                } else {
                    VOICE_CREDENTIAL_FAILURES.click();
                }
                tracing::warn!(error = %err, "voice credential request failed");
                self.fail(failure.clone());
                Err(failure)
            }
        }
    }

    /// Joins the credential's room on `platform`.
    pub async fn join_room(
        &mut self,
        platform: &dyn MediaPlatform,
        credential: VoiceCredential,
    ) -> Result<(), CallFailure> {
        self.state = CallState::Connecting;
        match platform.join(&credential, self.config.join_options).await {
            Ok(connection) => {
                VOICE_JOINS.click();
                tracing::debug!(room = credential.room_name(), "joined room");
                self.state = CallState::Connected {
                    room_name: credential.room_name().to_string(),
                };
                self.connection = Some(connection);
                self.credential = Some(credential);
                self.connected_at = Some(Instant::now());
                Ok(())
            }
            Err(err) => {
                VOICE_MEDIA_ERRORS.click();
                tracing::warn!(error = %err, "joining room failed");
                let failure = CallFailure::from_media_error(&err);
                self.fail(failure.clone());
                Err(failure)
            }
        }
    }

    /// Requests a credential and joins its room.
    pub async fn start_call(&mut self, platform: &dyn MediaPlatform) -> Result<(), CallFailure> {
        let credential = self.request_credential().await?;
        self.join_room(platform, credential).await
    }

    /// Waits for the platform to report on the live connection and applies it.
    ///
    /// Returns `None` immediately when no room is joined.
    pub async fn next_room_event(&mut self) -> Option<RoomEvent> {
        let connection = self.connection.as_mut()?;
        let event = connection.next_event().await;
        self.handle_room_event(event.clone());
        Some(event)
    }

    /// Applies a platform report: any disconnect or error ends the call.
    pub fn handle_room_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Disconnected => {
                tracing::debug!("room disconnected");
                self.teardown();
            }
            RoomEvent::Error(message) => {
                VOICE_MEDIA_ERRORS.click();
                tracing::warn!(error = message.as_deref(), "room connection failed");
                self.fail(CallFailure::media(message));
            }
        }
    }

    /// Ends the call from the local side.
    ///
    /// Works from Connecting too, including after a `request_credential` or
    /// `join_room` future was dropped before it finished.  The credential is
    /// discarded unconditionally.  The backend is not told.
    pub async fn end_call(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.leave().await;
        }
        self.teardown();
    }

    fn fail(&mut self, failure: CallFailure) {
        self.teardown();
        self.last_failure = Some(failure);
    }

    fn teardown(&mut self) {
        if let Some(connected_at) = self.connected_at.take() {
            VOICE_CALL_DURATION.add(connected_at.elapsed().as_secs_f64());
        }
        self.connection = None;
        self.credential = None;
        self.state = CallState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::voice::platform::JoinOptions;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StalledPlatform;

    #[async_trait::async_trait]
    impl MediaPlatform for StalledPlatform {
        async fn join(
            &self,
            _: &VoiceCredential,
            _: JoinOptions,
        ) -> Result<Box<dyn RoomConnection>> {
            std::future::pending().await
        }
    }

    struct ScriptedPlatform {
        join_error: Option<String>,
        event: RoomEvent,
        left: Arc<AtomicUsize>,
    }

    struct ScriptedConnection {
        event: RoomEvent,
        left: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl RoomConnection for ScriptedConnection {
        async fn next_event(&mut self) -> RoomEvent {
            self.event.clone()
        }

        async fn leave(&mut self) {
            self.left.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl MediaPlatform for ScriptedPlatform {
        async fn join(
            &self,
            _: &VoiceCredential,
            _: JoinOptions,
        ) -> Result<Box<dyn RoomConnection>> {
            match &self.join_error {
                Some(message) => Err(Error::media(Some(message.clone()))),
                None => Ok(Box::new(ScriptedConnection {
                    event: self.event.clone(),
                    left: Arc::clone(&self.left),
                })),
            }
        }
    }

    fn platform(event: RoomEvent) -> ScriptedPlatform {
        ScriptedPlatform {
            join_error: None,
            event,
            left: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn session() -> VoiceSession {
        let client = AgentClient::new(Some("http://127.0.0.1:9".to_string())).unwrap();
        VoiceSession::new(client, CallConfig::default())
    }

    fn credential() -> VoiceCredential {
        VoiceCredential::new("tok", "wss://media.example", "bank-abc-call")
    }

    #[tokio::test]
    async fn join_then_end() {
        let platform = platform(RoomEvent::Disconnected);
        let mut session = session();
        session.join_room(&platform, credential()).await.unwrap();
        assert_eq!(
            session.state(),
            &CallState::Connected {
                room_name: "bank-abc-call".to_string()
            }
        );
        assert!(session.credential().is_some());

        session.end_call().await;
        assert!(session.state().is_idle());
        assert!(session.credential().is_none());
        assert!(session.last_failure().is_none());
        assert_eq!(platform.left.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn join_failure_returns_to_idle() {
        let platform = ScriptedPlatform {
            join_error: Some("invalid api key".to_string()),
            ..platform(RoomEvent::Disconnected)
        };
        let mut session = session();
        let failure = session.join_room(&platform, credential()).await.unwrap_err();
        assert_eq!(failure, CallFailure::Media(Some("invalid api key".to_string())));
        assert!(session.state().is_idle());
        assert!(session.credential().is_none());
        assert_eq!(session.last_failure(), Some(&failure));
    }

    #[tokio::test]
    async fn platform_error_tears_down() {
        let platform = platform(RoomEvent::Error(Some("signal lost".to_string())));
        let mut session = session();
        session.join_room(&platform, credential()).await.unwrap();
        let event = session.next_room_event().await;
        assert_eq!(event, Some(RoomEvent::Error(Some("signal lost".to_string()))));
        assert!(session.state().is_idle());
        assert!(session.credential().is_none());
        assert_eq!(
            session.last_failure().map(|f| f.to_string()),
            Some("Connection failed: signal lost".to_string())
        );
        assert_eq!(session.next_room_event().await, None);
    }

    #[tokio::test]
    async fn disconnect_is_not_a_failure() {
        let platform = platform(RoomEvent::Disconnected);
        let mut session = session();
        session.join_room(&platform, credential()).await.unwrap();
        assert_eq!(
            session.next_room_event().await,
            Some(RoomEvent::Disconnected)
        );
        assert!(session.state().is_idle());
        assert!(session.last_failure().is_none());
    }

    #[tokio::test]
    async fn unreachable_backend_keeps_call_idle() {
        let mut session = session();
        let failure = session.request_credential().await.unwrap_err();
        assert_eq!(failure, CallFailure::Unreachable);
        assert!(session.state().is_idle());
        assert_eq!(session.last_failure(), Some(&CallFailure::Unreachable));
    }

    #[tokio::test]
    async fn end_call_while_connecting() {
        let mut session = session();
        let joined = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            session.join_room(&StalledPlatform, credential()),
        )
        .await;
        assert!(joined.is_err());
        assert_eq!(session.state(), &CallState::Connecting);

        session.end_call().await;
        assert!(session.state().is_idle());
        assert!(session.credential().is_none());
        assert!(session.last_failure().is_none());
    }

    #[test]
    fn state_display() {
        assert_eq!(CallState::Idle.to_string(), "idle");
        assert_eq!(
            CallState::Connected {
                room_name: "r".to_string()
            }
            .to_string(),
            "connected to r"
        );
    }
}
