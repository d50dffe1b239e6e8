// Event Sink
// Pluggable channel for pushing state changes at the UI layer

use serde::Serialize;
use serde_json::Value;

/// Receives console events as they happen. The registry and refresh loop
/// emit `stream://` events through this; a UI embeds its own sink, headless
/// runs use [`LogEventSink`] or [`NoopEventSink`].
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// Discards every event
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &str, _payload: Value) {}
}

/// Writes events to the log at debug level
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: &str, payload: Value) {
        log::debug!("Event {}: {}", event, payload);
    }
}

/// Serialize a payload and hand it to the sink. Payloads that fail to
/// serialize are dropped; events are advisory and never abort an operation.
pub fn emit_event<T: Serialize>(sink: &dyn EventSink, event: &str, payload: &T) {
    if let Ok(value) = serde_json::to_value(payload) {
        sink.emit(event, value);
    }
}
