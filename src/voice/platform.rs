//! The seam between the call state machine and the real-time-media platform.
//!
//! The platform owns signaling and audio transport.  This crate only hands it a
//! credential and listens for the connection to end.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use crate::error::{Error, Result};
use crate::types::VoiceCredential;

/// Environment variable carrying the media-server URL to a [`CommandPlatform`] client.
pub const MEDIA_URL_ENV: &str = "TELLER_MEDIA_URL";
/// Environment variable carrying the access token to a [`CommandPlatform`] client.
pub const MEDIA_TOKEN_ENV: &str = "TELLER_MEDIA_TOKEN";
/// Environment variable carrying the room name to a [`CommandPlatform`] client.
pub const MEDIA_ROOM_ENV: &str = "TELLER_ROOM_NAME";
/// Environment variable telling a [`CommandPlatform`] client whether to publish the microphone.
pub const MEDIA_PUBLISH_AUDIO_ENV: &str = "TELLER_PUBLISH_AUDIO";
/// Environment variable telling a [`CommandPlatform`] client whether to publish video.
pub const MEDIA_PUBLISH_VIDEO_ENV: &str = "TELLER_PUBLISH_VIDEO";

/// What the local participant sends and receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOptions {
    /// Publish the local microphone.
    pub publish_audio: bool,
    /// Publish the local camera.
    pub publish_video: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            publish_audio: true,
            publish_video: false,
        }
    }
}

/// Something the platform reports about a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// The connection closed normally.
    Disconnected,
    /// The connection failed, with the platform's text if it gave any.
    Error(Option<String>),
}

/// A joined room.  Dropping it must release the local media resources.
#[async_trait::async_trait]
pub trait RoomConnection: Send {
    /// Wait for the connection to end.
    async fn next_event(&mut self) -> RoomEvent;

    /// Leave the room from the local side.
    async fn leave(&mut self);
}

/// A real-time-media platform that can join rooms with a credential.
#[async_trait::async_trait]
pub trait MediaPlatform: Send + Sync {
    /// Join the credential's room.
    ///
    /// The platform refusing the credential is [`Error::Media`]; failing to
    /// reach the platform at all is whatever error the platform hit.
    async fn join(
        &self,
        credential: &VoiceCredential,
        options: JoinOptions,
    ) -> Result<Box<dyn RoomConnection>>;
}

/// Joins rooms by running an external media client program.
///
/// The program receives the credential through the `TELLER_MEDIA_*`
/// environment variables, keeps the call up while it runs, and is killed when
/// the call ends.  A clean exit reads as a disconnect; a failing exit reads as
/// an error carrying the last line the program wrote to stderr.
#[derive(Debug, Clone)]
pub struct CommandPlatform {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandPlatform {
    /// Creates a platform that runs `program`.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Adds arguments passed to the program on every join.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program run on join.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait::async_trait]
impl MediaPlatform for CommandPlatform {
    async fn join(
        &self,
        credential: &VoiceCredential,
        options: JoinOptions,
    ) -> Result<Box<dyn RoomConnection>> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .env(MEDIA_URL_ENV, credential.media_server_url())
            .env(MEDIA_TOKEN_ENV, credential.access_token())
            .env(MEDIA_ROOM_ENV, credential.room_name())
            .env(MEDIA_PUBLISH_AUDIO_ENV, flag(options.publish_audio))
            .env(MEDIA_PUBLISH_VIDEO_ENV, flag(options.publish_video))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::io(
                    format!("failed to start media client {}", self.program.display()),
                    e,
                )
            })?;
        tracing::debug!(
            program = %self.program.display(),
            pid = child.id(),
            room = credential.room_name(),
            "media client started"
        );
        Ok(Box::new(CommandConnection { child: Some(child) }))
    }
}

struct CommandConnection {
    child: Option<Child>,
}

#[async_trait::async_trait]
impl RoomConnection for CommandConnection {
    async fn next_event(&mut self) -> RoomEvent {
        let Some(child) = self.child.as_mut() else {
            return RoomEvent::Disconnected;
        };
        let stderr = child.stderr.take();
        let collect_stderr = async move {
            let mut text = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut text).await;
            }
            text
        };
        let (status, stderr) = tokio::join!(child.wait(), collect_stderr);
        self.child = None;
        match status {
            Ok(status) if status.success() => RoomEvent::Disconnected,
            Ok(status) => RoomEvent::Error(last_line(&stderr).or_else(|| {
                status
                    .code()
                    .map(|code| format!("media client exited with status {code}"))
            })),
            Err(e) => RoomEvent::Error(Some(format!("failed to wait on media client: {e}"))),
        }
    }

    async fn leave(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

fn last_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(str::to_string)
}
