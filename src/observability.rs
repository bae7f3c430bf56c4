use biometrics::{Collector, Counter, Moments};

pub(crate) static CHAT_TURNS: Counter = Counter::new("relaychat.chat.turns");
pub(crate) static CHAT_BACKEND_ERRORS: Counter = Counter::new("relaychat.chat.backend_errors");
pub(crate) static CHAT_PROMPT_BYTES: Counter = Counter::new("relaychat.chat.prompt_bytes");

pub(crate) static GEMINI_REQUESTS: Counter = Counter::new("relaychat.gemini.requests");
pub(crate) static GEMINI_REQUEST_ERRORS: Counter =
    Counter::new("relaychat.gemini.request_errors");
pub(crate) static GEMINI_REQUEST_DURATION: Moments =
    Moments::new("relaychat.gemini.request_duration_seconds");

pub(crate) static SERVERS_LAUNCHED: Counter = Counter::new("relaychat.servers.launched");
pub(crate) static SERVER_LAUNCH_ERRORS: Counter = Counter::new("relaychat.servers.launch_errors");
pub(crate) static SERVERS_CLOSED: Counter = Counter::new("relaychat.servers.closed");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_BACKEND_ERRORS);
    collector.register_counter(&CHAT_PROMPT_BYTES);

    collector.register_counter(&GEMINI_REQUESTS);
    collector.register_counter(&GEMINI_REQUEST_ERRORS);
    collector.register_moments(&GEMINI_REQUEST_DURATION);

    collector.register_counter(&SERVERS_LAUNCHED);
    collector.register_counter(&SERVER_LAUNCH_ERRORS);
    collector.register_counter(&SERVERS_CLOSED);
}
