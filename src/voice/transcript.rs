//! Speaker-attributed transcript of a voice call.
//!
//! Nothing in this crate produces utterances yet.  [`TranscriptPanel::follow`]
//! is the attachment point for a feed once the media side offers one.

use futures::{Stream, StreamExt};
use time::OffsetDateTime;

use crate::render::Renderer;

/// Line shown while the transcript is empty.
pub const TRANSCRIPT_PLACEHOLDER: &str = "Transcript will appear here as you speak...";

/// Who spoke an utterance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Speaker {
    /// The caller.
    Customer,
    /// The banking agent.
    Agent,
}

/// One transcribed utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Who spoke.
    pub speaker: Speaker,
    /// What was said.
    pub text: String,
    /// When it was transcribed.
    pub at: OffsetDateTime,
}

impl Utterance {
    /// Creates an utterance stamped with the current time.
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            at: OffsetDateTime::now_utc(),
        }
    }
}

/// Append-only list of utterances for the current call.
#[derive(Debug, Clone, Default)]
pub struct TranscriptPanel {
    lines: Vec<Utterance>,
}

impl TranscriptPanel {
    /// Creates an empty panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one utterance.
    pub fn push(&mut self, utterance: Utterance) {
        self.lines.push(utterance);
    }

    /// The utterances so far, oldest first.
    pub fn lines(&self) -> &[Utterance] {
        &self.lines
    }

    /// Returns true if nothing has been transcribed.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drops every utterance.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Consumes `feed` until it ends, appending and rendering each utterance.
    ///
    /// Returns the number of utterances appended.
    pub async fn follow<S>(&mut self, mut feed: S, renderer: &mut dyn Renderer) -> usize
    where
        S: Stream<Item = Utterance> + Unpin,
    {
        let mut appended = 0;
        while let Some(utterance) = feed.next().await {
            renderer.print_utterance(&utterance);
            self.push(utterance);
            appended += 1;
        }
        appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use futures::stream;

    #[derive(Default)]
    struct Capture {
        utterances: Vec<String>,
    }

    impl Renderer for Capture {
        fn print_message(&mut self, _: &Message) {}
        fn print_error(&mut self, _: &str) {}
        fn print_info(&mut self, _: &str) {}
        fn print_utterance(&mut self, utterance: &Utterance) {
            self.utterances.push(utterance.text.clone());
        }
    }

    #[test]
    fn starts_empty() {
        let panel = TranscriptPanel::new();
        assert!(panel.is_empty());
        assert!(panel.lines().is_empty());
    }

    #[tokio::test]
    async fn follow_appends_in_order() {
        let mut panel = TranscriptPanel::new();
        let mut capture = Capture::default();
        let feed = stream::iter(vec![
            Utterance::new(Speaker::Customer, "I lost my card"),
            Utterance::new(Speaker::Agent, "I can help block your card."),
        ]);
        assert_eq!(panel.follow(feed, &mut capture).await, 2);
        assert_eq!(panel.lines().len(), 2);
        assert_eq!(panel.lines()[0].speaker, Speaker::Customer);
        assert_eq!(panel.lines()[1].speaker, Speaker::Agent);
        assert_eq!(
            capture.utterances,
            vec!["I lost my card", "I can help block your card."]
        );

        panel.clear();
        assert!(panel.is_empty());
    }
}
