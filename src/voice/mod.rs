//! Voice calls with the banking agent.
//!
//! A call asks the backend for a short-lived media credential, refuses to go
//! further if the backend is unconfigured, and hands the credential to a
//! [`MediaPlatform`] that carries the audio.
//!
//! - [`call`]: The Idle/Connecting/Connected state machine
//! - [`failure`]: Failure categories and their display text
//! - [`platform`]: The media platform seam and the external-program platform
//! - [`transcript`]: The speaker-attributed transcript seam
//! - [`config`]: CLI argument parsing and configuration

mod call;
mod config;
mod failure;
mod platform;
mod transcript;

pub use call::{CallState, VoiceSession};
pub use config::{CallArgs, CallConfig};
pub use failure::CallFailure;
pub use platform::{
    CommandPlatform, JoinOptions, MEDIA_PUBLISH_AUDIO_ENV, MEDIA_PUBLISH_VIDEO_ENV,
    MEDIA_ROOM_ENV, MEDIA_TOKEN_ENV, MEDIA_URL_ENV, MediaPlatform, RoomConnection, RoomEvent,
};
pub use transcript::{Speaker, TRANSCRIPT_PLACEHOLDER, TranscriptPanel, Utterance};
