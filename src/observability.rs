use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("seekproxy.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("seekproxy.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("seekproxy.client.request_duration_seconds");

pub(crate) static BOOTSTRAP_ATTEMPTS: Counter = Counter::new("seekproxy.bootstrap.attempts");
pub(crate) static BOOTSTRAP_FAILURES: Counter = Counter::new("seekproxy.bootstrap.failures");

pub(crate) static CHAT_TURNS: Counter = Counter::new("seekproxy.chat.turns");
pub(crate) static CHAT_TURN_ERRORS: Counter = Counter::new("seekproxy.chat.turn_errors");
pub(crate) static CHAT_REPLIES_PARSED: Counter = Counter::new("seekproxy.chat.replies_parsed");
pub(crate) static CHAT_REPLY_MISSES: Counter = Counter::new("seekproxy.chat.reply_misses");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&BOOTSTRAP_ATTEMPTS);
    collector.register_counter(&BOOTSTRAP_FAILURES);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_TURN_ERRORS);
    collector.register_counter(&CHAT_REPLIES_PARSED);
    collector.register_counter(&CHAT_REPLY_MISSES);
}
