//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the transcript and
//! thread reference of one conversation and drives turns against the backend.
//!
//! A turn has two halves.  [`ChatSession::begin_turn`] validates the input,
//! appends the user's entry, and snapshots the request; the caller then sends
//! the request and hands the result to [`ChatSession::complete_turn`].
//! [`ChatSession::send_turn`] does both for the common one-at-a-time case;
//! [`ChatSession::spawn_turn`] runs the request on its own task so a front end
//! can stop waiting and settle the reply later.
//! Splitting the halves lets a caller keep several turns in flight: every turn
//! carries a sequence number, each agent entry is placed right after the
//! entries of its own turn, and the thread reference only ever moves forward.

use std::time::Instant;

use tokio::sync::oneshot;

use crate::chat::config::ChatConfig;
use crate::client::AgentClient;
use crate::error::{Error, Result};
use crate::observability::{
    CHAT_EMPTY_INPUTS, CHAT_FALLBACKS, CHAT_RESETS, CHAT_STALE_REPLIES, CHAT_TURNS,
};
use crate::render::Renderer;
use crate::types::{ChatReply, ChatRequest, ChatRoute, CustomerId, Message, ThreadRef};

/// Agent entry substituted for a reply when a turn fails.
pub const CHAT_FALLBACK: &str =
    "Sorry, I encountered an error. Please check the backend connection.";

/// A turn recorded locally whose reply has not been applied yet.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    turn: u64,
    epoch: u64,
    request: ChatRequest,
}

impl PendingTurn {
    /// The request to send for this turn.
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// The turn's sequence number within the session.
    pub fn turn(&self) -> u64 {
        self.turn
    }
}

/// A turn whose request runs on its own task.
///
/// The caller may stop waiting for the reply at any point; the request keeps
/// going and the reply can be applied later with
/// [`ChatSession::settle_turns`] or [`ChatSession::complete_turn`].
#[derive(Debug)]
pub struct InFlightTurn {
    pending: PendingTurn,
    reply: oneshot::Receiver<Result<ChatReply>>,
}

impl InFlightTurn {
    /// The turn's sequence number within the session.
    pub fn turn(&self) -> u64 {
        self.pending.turn
    }

    /// Waits for the backend's answer.
    ///
    /// Cancel-safe: dropping the future leaves the reply in place.  Must not
    /// be awaited again once it has returned.
    pub async fn reply(&mut self) -> Result<ChatReply> {
        match (&mut self.reply).await {
            Ok(result) => result,
            Err(_) => Err(task_lost()),
        }
    }

    /// The turn to hand to [`ChatSession::complete_turn`].
    pub fn into_pending(self) -> PendingTurn {
        self.pending
    }

    fn try_reply(&mut self) -> Option<Result<ChatReply>> {
        match self.reply.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(task_lost())),
        }
    }
}

fn task_lost() -> Error {
    Error::connection("chat turn ended without a reply", None)
}

/// What applying a turn's result did to the transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The backend replied; the agent entry was appended.
    Replied(Message),
    /// The turn failed; the fallback entry was appended.
    Fallback(Message),
    /// The session was reset after the turn began; nothing changed.
    Discarded,
}

#[derive(Debug, Clone)]
struct Entry {
    turn: u64,
    message: Message,
}

/// A chat session that manages conversation state and backend interactions.
pub struct ChatSession {
    client: AgentClient,
    config: ChatConfig,
    entries: Vec<Entry>,
    thread: Option<ThreadRef>,
    thread_turn: u64,
    next_turn: u64,
    epoch: u64,
    pending: usize,
    turns_sent: u64,
    replies: u64,
    fallbacks: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The customer the session speaks for.
    pub customer: CustomerId,
    /// The route turns are sent to.
    pub route: ChatRoute,
    /// The current thread reference, if any.
    pub thread: Option<ThreadRef>,
    /// The number of entries in the transcript.
    pub message_count: usize,
    /// Turns awaiting a reply.
    pub pending: usize,
    /// Turns sent since the session was created.
    pub turns_sent: u64,
    /// Turns answered by the backend.
    pub replies: u64,
    /// Turns answered with the fallback entry.
    pub fallbacks: u64,
}

impl ChatSession {
    /// Creates a new chat session with the given client and configuration.
    pub fn new(client: AgentClient, config: ChatConfig) -> Self {
        Self {
            client,
            config,
            entries: Vec::new(),
            thread: None,
            thread_turn: 0,
            next_turn: 1,
            epoch: 0,
            pending: 0,
            turns_sent: 0,
            replies: 0,
            fallbacks: 0,
        }
    }

    /// The client turns are sent through.
    pub fn client(&self) -> &AgentClient {
        &self.client
    }

    /// Records a new turn and returns the request to send.
    ///
    /// Input that is empty after trimming is ignored: nothing is appended and
    /// `None` is returned.  Otherwise the user's entry is on the transcript
    /// before this returns.
    pub fn begin_turn(&mut self, text: &str) -> Option<PendingTurn> {
        if text.trim().is_empty() {
            CHAT_EMPTY_INPUTS.click();
            return None;
        }
        CHAT_TURNS.click();
        let turn = self.next_turn;
        self.next_turn += 1;
        self.entries.push(Entry {
            turn,
            message: Message::user(text),
        });
        self.pending += 1;
        self.turns_sent += 1;
        let request = ChatRequest::new(text)
            .with_customer(self.config.customer.clone())
            .with_thread(self.thread.clone());
        Some(PendingTurn {
            turn,
            epoch: self.epoch,
            request,
        })
    }

    /// Applies the backend's answer to a turn begun on this session.
    ///
    /// Failures are logged and replaced by the [`CHAT_FALLBACK`] entry; the
    /// thread reference is left alone.  Results for turns begun before the
    /// last [`reset`](Self::reset) are dropped.
    pub fn complete_turn(
        &mut self,
        pending: PendingTurn,
        result: Result<ChatReply>,
    ) -> TurnOutcome {
        if pending.epoch != self.epoch {
            CHAT_STALE_REPLIES.click();
            tracing::debug!(turn = pending.turn, "dropping reply for a reset session");
            return TurnOutcome::Discarded;
        }
        self.pending = self.pending.saturating_sub(1);

        match result {
            Ok(reply) => {
                self.replies += 1;
                if pending.turn >= self.thread_turn {
                    self.thread = Some(reply.thread_id);
                    self.thread_turn = pending.turn;
                }
                let message = Message::agent(reply.response);
                self.insert_for_turn(pending.turn, message.clone());
                TurnOutcome::Replied(message)
            }
            Err(err) => {
                CHAT_FALLBACKS.click();
                self.fallbacks += 1;
                tracing::warn!(turn = pending.turn, error = %err, "chat turn failed");
                let message = Message::agent(CHAT_FALLBACK);
                self.insert_for_turn(pending.turn, message.clone());
                TurnOutcome::Fallback(message)
            }
        }
    }

    /// Sends one turn and waits for its reply.
    ///
    /// Returns `None` when the input was empty.  Errors never escape: a failed
    /// turn ends with the fallback entry.
    pub async fn send_turn(
        &mut self,
        text: &str,
        renderer: &mut dyn Renderer,
    ) -> Option<TurnOutcome> {
        let pending = self.begin_turn(text)?;
        if let Some(entry) = self.entries.last() {
            renderer.print_message(&entry.message);
        }
        renderer.print_pending(self.pending);

        let start = Instant::now();
        let result = self
            .client
            .send_chat(self.config.route, pending.request())
            .await;
        tracing::debug!(
            turn = pending.turn,
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "chat turn settled"
        );

        let outcome = self.complete_turn(pending, result);
        match &outcome {
            TurnOutcome::Replied(message) | TurnOutcome::Fallback(message) => {
                renderer.print_message(message)
            }
            TurnOutcome::Discarded => {}
        }
        Some(outcome)
    }

    /// Records a new turn and sends it on a spawned task.
    ///
    /// Returns `None` when the input was empty.  Must be called from within a
    /// tokio runtime.
    pub fn spawn_turn(&mut self, text: &str) -> Option<InFlightTurn> {
        let pending = self.begin_turn(text)?;
        let client = self.client.clone();
        let route = self.config.route;
        let request = pending.request.clone();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = client.send_chat(route, &request).await;
            // The receiver is gone only if the caller gave up on the turn.
            let _ = tx.send(result);
        });
        Some(InFlightTurn { pending, reply: rx })
    }

    /// Applies every reply that has arrived for `turns`, oldest turn first.
    ///
    /// Turns still waiting stay in `turns`.
    pub fn settle_turns(&mut self, turns: &mut Vec<InFlightTurn>) -> Vec<TurnOutcome> {
        let mut outcomes = Vec::new();
        let mut waiting = Vec::new();
        turns.sort_by_key(InFlightTurn::turn);
        for mut turn in turns.drain(..) {
            match turn.try_reply() {
                Some(result) => outcomes.push(self.complete_turn(turn.into_pending(), result)),
                None => waiting.push(turn),
            }
        }
        *turns = waiting;
        outcomes
    }

    /// Resets the call: clears the transcript and forgets the thread.
    ///
    /// In-flight turns are not cancelled; their replies are discarded when
    /// they arrive.
    pub fn reset(&mut self) {
        CHAT_RESETS.click();
        self.entries.clear();
        self.thread = None;
        self.thread_turn = 0;
        self.pending = 0;
        self.epoch += 1;
    }

    /// The transcript, oldest entry first.
    pub fn transcript(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|entry| &entry.message)
    }

    /// Returns the number of entries in the transcript.
    pub fn message_count(&self) -> usize {
        self.entries.len()
    }

    /// The thread reference the next turn will carry.
    pub fn thread(&self) -> Option<&ThreadRef> {
        self.thread.as_ref()
    }

    /// Turns awaiting a reply.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Returns true while any turn awaits a reply.
    pub fn is_pending(&self) -> bool {
        self.pending > 0
    }

    /// The customer turns are sent on behalf of.
    pub fn customer(&self) -> &CustomerId {
        &self.config.customer
    }

    /// Switches the customer for subsequent turns.
    ///
    /// The transcript and thread are kept; the backend decides what a change
    /// of customer mid-thread means.
    pub fn set_customer(&mut self, customer: CustomerId) {
        self.config.customer = customer;
    }

    /// The route turns are sent to.
    pub fn route(&self) -> ChatRoute {
        self.config.route
    }

    /// Switches the route for subsequent turns.
    pub fn set_route(&mut self, route: ChatRoute) {
        self.config.route = route;
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            customer: self.config.customer.clone(),
            route: self.config.route,
            thread: self.thread.clone(),
            message_count: self.message_count(),
            pending: self.pending,
            turns_sent: self.turns_sent,
            replies: self.replies,
            fallbacks: self.fallbacks,
        }
    }

    fn insert_for_turn(&mut self, turn: u64, message: Message) {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.turn > turn)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, Entry { turn, message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::Role;

    fn session() -> ChatSession {
        let client = AgentClient::new(Some("http://127.0.0.1:9".to_string())).unwrap();
        ChatSession::new(client, ChatConfig::default())
    }

    fn reply(text: &str, thread: &str) -> Result<ChatReply> {
        Ok(ChatReply {
            response: text.to_string(),
            thread_id: ThreadRef::new(thread),
        })
    }

    fn contents(session: &ChatSession) -> Vec<(Role, String)> {
        session
            .transcript()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    #[test]
    fn new_session_empty() {
        let session = session();
        assert_eq!(session.message_count(), 0);
        assert!(session.thread().is_none());
        assert!(!session.is_pending());
    }

    #[test]
    fn empty_input_is_ignored() {
        let mut session = session();
        assert!(session.begin_turn("").is_none());
        assert!(session.begin_turn("   \t\n").is_none());
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.stats().turns_sent, 0);
    }

    #[test]
    fn user_entry_precedes_reply() {
        let mut session = session();
        let pending = session.begin_turn("I lost my card").unwrap();
        assert_eq!(
            contents(&session),
            vec![(Role::User, "I lost my card".to_string())]
        );
        assert!(session.is_pending());
        assert_eq!(pending.request().message, "I lost my card");
        assert_eq!(
            pending.request().customer_id.as_ref().map(|c| c.as_str()),
            Some("user123")
        );
        assert!(pending.request().thread_id.is_none());
    }

    #[test]
    fn reply_sets_thread_for_next_turn() {
        let mut session = session();
        let first = session.begin_turn("I lost my card").unwrap();
        let outcome = session.complete_turn(first, reply("I can help block your card...", "t1"));
        assert!(matches!(outcome, TurnOutcome::Replied(ref m) if m.role == Role::Agent));
        assert_eq!(session.thread(), Some(&ThreadRef::new("t1")));
        assert!(!session.is_pending());

        let second = session.begin_turn("yes").unwrap();
        assert_eq!(second.request().thread_id, Some(ThreadRef::new("t1")));
    }

    #[test]
    fn failure_appends_fallback_and_keeps_thread() {
        let mut session = session();
        let first = session.begin_turn("hello").unwrap();
        session.complete_turn(first, reply("hi", "t1"));

        let second = session.begin_turn("balance please").unwrap();
        let outcome = session.complete_turn(second, Err(Error::internal_server("boom")));
        assert_eq!(
            outcome,
            TurnOutcome::Fallback(session.transcript().last().unwrap().clone())
        );
        assert_eq!(
            contents(&session).last().unwrap(),
            &(Role::Agent, CHAT_FALLBACK.to_string())
        );
        assert_eq!(session.message_count(), 4);
        assert_eq!(session.thread(), Some(&ThreadRef::new("t1")));
        assert_eq!(session.stats().fallbacks, 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = session();
        let first = session.begin_turn("hello").unwrap();
        session.complete_turn(first, reply("hi", "t1"));
        session.reset();
        assert_eq!(session.message_count(), 0);
        assert!(session.thread().is_none());

        let next = session.begin_turn("hello again").unwrap();
        assert!(next.request().thread_id.is_none());
    }

    #[test]
    fn replies_after_reset_are_discarded() {
        let mut session = session();
        let stale = session.begin_turn("hello").unwrap();
        session.reset();
        assert_eq!(
            session.complete_turn(stale, reply("hi", "t-old")),
            TurnOutcome::Discarded
        );
        assert_eq!(session.message_count(), 0);
        assert!(session.thread().is_none());
    }

    #[test]
    fn out_of_order_replies_stay_with_their_turns() {
        let mut session = session();
        let first = session.begin_turn("one").unwrap();
        let second = session.begin_turn("two").unwrap();
        assert_eq!(session.pending(), 2);

        session.complete_turn(second, reply("reply two", "t2"));
        session.complete_turn(first, reply("reply one", "t1"));

        assert_eq!(
            contents(&session),
            vec![
                (Role::User, "one".to_string()),
                (Role::Agent, "reply one".to_string()),
                (Role::User, "two".to_string()),
                (Role::Agent, "reply two".to_string()),
            ]
        );
        // The older turn's thread never overwrites the newer one.
        assert_eq!(session.thread(), Some(&ThreadRef::new("t2")));
        assert_eq!(session.pending(), 0);
    }

    #[tokio::test]
    async fn spawned_turn_settles_later() {
        let mut session = session();
        assert!(session.spawn_turn("  ").is_none());

        let mut turns = vec![session.spawn_turn("hello").unwrap()];
        assert_eq!(session.message_count(), 1);
        assert!(session.is_pending());

        let mut outcomes = Vec::new();
        for _ in 0..500 {
            outcomes = session.settle_turns(&mut turns);
            if !outcomes.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(matches!(outcomes.as_slice(), [TurnOutcome::Fallback(_)]));
        assert!(turns.is_empty());
        assert!(!session.is_pending());
        assert_eq!(session.message_count(), 2);
    }

    #[test]
    fn customer_and_route_switches() {
        let mut session = session();
        session.set_customer(CustomerId::guest());
        session.set_route(ChatRoute::Local);
        let pending = session.begin_turn("hi").unwrap();
        assert_eq!(
            pending.request().customer_id,
            Some(CustomerId::guest())
        );
        assert_eq!(session.route(), ChatRoute::Local);
        assert_eq!(session.stats().route, ChatRoute::Local);
    }
}
