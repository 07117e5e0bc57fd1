//! Voice call with the banking agent.
//!
//! Requests a media credential from the backend and hands it to an external
//! media client program that carries the audio.  The call ends when the
//! program exits or on Ctrl+C.
//!
//! # Usage
//!
//! ```bash
//! # Check that the backend hands out usable credentials
//! teller-call
//!
//! # Join the default room through a media client
//! teller-call --media-command ./join-room.sh
//!
//! # Join another room under another name
//! teller-call --room branch-42 --name Alice --media-command ./join-room.sh
//! ```

use std::sync::Arc;

use arrrg::CommandLine;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use teller::voice::{
    CallArgs, CallConfig, CallState, CommandPlatform, RoomEvent, TRANSCRIPT_PLACEHOLDER,
    VoiceSession,
};
use teller::{AgentClient, PlainTextRenderer, Renderer, VoiceCredential};

enum Wake {
    Room(Option<RoomEvent>),
    HangUp,
}

/// Main entry point for the teller-call application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = CallArgs::from_command_line_relaxed("teller-call [OPTIONS]");
    let config = CallConfig::from(args);
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    let client = AgentClient::with_options(config.api_url.clone(), config.timeout)?;
    let platform = config.media_command.as_ref().map(CommandPlatform::new);
    let mut session = VoiceSession::new(client, config);

    let hang_up = Arc::new(Notify::new());
    let hang_up_clone = hang_up.clone();
    ctrlc::set_handler(move || {
        hang_up_clone.notify_one();
    })?;

    println!(
        "Banking Agent Call (room: {}, name: {})",
        session.config().room,
        session.config().participant_or_default()
    );

    // Ctrl+C ends the call from Connecting as well as Connected.
    renderer.print_call_state(&CallState::Connecting);
    let requested = tokio::select! {
        requested = session.request_credential() => Some(requested),
        _ = hang_up.notified() => None,
    };
    let credential = match requested {
        Some(Ok(credential)) => credential,
        Some(Err(failure)) => {
            renderer.print_error(&failure.to_string());
            renderer.print_call_state(session.state());
            std::process::exit(1);
        }
        None => return hang_up_early(&mut session, &mut renderer).await,
    };
    print_credential(&mut renderer, &credential);

    let Some(platform) = platform else {
        renderer.print_info("No media client configured; credential check only.");
        session.end_call().await;
        renderer.print_call_state(session.state());
        return Ok(());
    };

    let joined = tokio::select! {
        joined = session.join_room(&platform, credential) => Some(joined),
        _ = hang_up.notified() => None,
    };
    match joined {
        Some(Ok(())) => {}
        Some(Err(failure)) => {
            renderer.print_error(&failure.to_string());
            renderer.print_call_state(session.state());
            std::process::exit(1);
        }
        None => return hang_up_early(&mut session, &mut renderer).await,
    }
    renderer.print_call_state(session.state());
    renderer.print_info(TRANSCRIPT_PLACEHOLDER);
    renderer.print_info("Press Ctrl+C to end the call.");

    loop {
        let wake = tokio::select! {
            event = session.next_room_event() => Wake::Room(event),
            _ = hang_up.notified() => Wake::HangUp,
        };
        match wake {
            Wake::Room(Some(RoomEvent::Disconnected)) | Wake::Room(None) => break,
            Wake::Room(Some(RoomEvent::Error(_))) => {
                if let Some(failure) = session.last_failure() {
                    renderer.print_error(&failure.to_string());
                }
                break;
            }
            Wake::HangUp => {
                session.end_call().await;
                break;
            }
        }
    }

    renderer.print_call_state(session.state());
    renderer.print_info("Call ended.");
    if session.last_failure().is_some() {
        std::process::exit(1);
    }
    Ok(())
}

async fn hang_up_early(
    session: &mut VoiceSession,
    renderer: &mut dyn Renderer,
) -> Result<(), Box<dyn std::error::Error>> {
    session.end_call().await;
    renderer.print_call_state(session.state());
    renderer.print_info("Call cancelled.");
    Ok(())
}

fn print_credential(renderer: &mut dyn Renderer, credential: &VoiceCredential) {
    renderer.print_info(&format!("Room: {}", credential.room_name()));
    renderer.print_info(&format!("Media server: {}", credential.media_server_url()));
    match credential.expires_at() {
        Ok(Some(at)) => renderer.print_info(&format!(
            "Credential expires: {}",
            teller::utils::time::rfc3339_label(at)
        )),
        Ok(None) => renderer.print_info("Credential expires: (not stated)"),
        Err(err) => renderer.print_error(&format!("Credential expiry unreadable: {err}")),
    }
}
