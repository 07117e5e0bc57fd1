use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("teller.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("teller.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("teller.client.request_duration_seconds");

pub(crate) static CHAT_TURNS: Counter = Counter::new("teller.chat.turns");
pub(crate) static CHAT_EMPTY_INPUTS: Counter = Counter::new("teller.chat.empty_inputs");
pub(crate) static CHAT_FALLBACKS: Counter = Counter::new("teller.chat.fallbacks");
pub(crate) static CHAT_STALE_REPLIES: Counter = Counter::new("teller.chat.stale_replies");
pub(crate) static CHAT_RESETS: Counter = Counter::new("teller.chat.resets");

pub(crate) static VOICE_CALL_ATTEMPTS: Counter = Counter::new("teller.voice.call_attempts");
pub(crate) static VOICE_CREDENTIAL_FAILURES: Counter =
    Counter::new("teller.voice.credential_failures");
pub(crate) static VOICE_PLACEHOLDER_REJECTIONS: Counter =
    Counter::new("teller.voice.placeholder_rejections");
pub(crate) static VOICE_JOINS: Counter = Counter::new("teller.voice.joins");
pub(crate) static VOICE_MEDIA_ERRORS: Counter = Counter::new("teller.voice.media_errors");
pub(crate) static VOICE_CALL_DURATION: Moments =
    Moments::new("teller.voice.call_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_EMPTY_INPUTS);
    collector.register_counter(&CHAT_FALLBACKS);
    collector.register_counter(&CHAT_STALE_REPLIES);
    collector.register_counter(&CHAT_RESETS);

    collector.register_counter(&VOICE_CALL_ATTEMPTS);
    collector.register_counter(&VOICE_CREDENTIAL_FAILURES);
    collector.register_counter(&VOICE_PLACEHOLDER_REJECTIONS);
    collector.register_counter(&VOICE_JOINS);
    collector.register_counter(&VOICE_MEDIA_ERRORS);
    collector.register_moments(&VOICE_CALL_DURATION);
}
