//! Event sink registry and fan-out.
//!
//! Sinks are registered during startup, before traffic is accepted; the
//! registry is read-only afterwards, so emission takes no locks.

use crate::event::{Event, Severity};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Sink delivery failure. Always contained at the bus boundary.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("sink is closed")]
    Closed,
}

/// A registered destination for observability events.
pub trait EventSink: Send + Sync {
    /// Short name used when reporting a delivery failure.
    fn name(&self) -> &str;

    /// Deliver one event. Must not block on network I/O; remote backends
    /// enqueue internally and return.
    fn deliver(&self, event: &Event) -> Result<(), SinkError>;
}

/// Ordered fan-out of events to the sinks registered per severity.
///
/// Any number of sinks may listen on the same severity; they are invoked in
/// registration order, and one sink's failure never hides the event from
/// the rest.
pub struct EventBus {
    sinks: [Vec<Arc<dyn EventSink>>; 4],
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            sinks: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
        }
    }

    fn lane(severity: Severity) -> usize {
        match severity {
            Severity::Debug => 0,
            Severity::Info => 1,
            Severity::Warn => 2,
            Severity::Error => 3,
        }
    }

    /// Register a sink for one severity level.
    pub fn register(&mut self, severity: Severity, sink: Arc<dyn EventSink>) {
        self.sinks[Self::lane(severity)].push(sink);
    }

    /// Register a sink for every severity level.
    pub fn register_all(&mut self, sink: Arc<dyn EventSink>) {
        for severity in Severity::ALL {
            self.register(severity, sink.clone());
        }
    }

    /// Number of sinks listening on a severity.
    pub fn sink_count(&self, severity: Severity) -> usize {
        self.sinks[Self::lane(severity)].len()
    }

    /// Deliver an event to every sink registered for its severity.
    ///
    /// Fire-and-forget: a failing sink is reported on the local log and
    /// skipped, and nothing propagates back to the caller.
    pub fn emit(&self, event: &Event) {
        for sink in &self.sinks[Self::lane(event.severity())] {
            if let Err(e) = sink.deliver(event) {
                warn!("sink '{}' failed to deliver event: {}", sink.name(), e);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSink {
        label: String,
        seen: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new(label: &str) -> Arc<Self> {
            Arc::new(Self {
                label: label.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn messages(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn name(&self) -> &str {
            &self.label
        }

        fn deliver(&self, event: &Event) -> Result<(), SinkError> {
            self.seen.lock().unwrap().push(event.message().to_string());
            Ok(())
        }
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn deliver(&self, _event: &Event) -> Result<(), SinkError> {
            Err(SinkError::Delivery("backend down".to_string()))
        }
    }

    #[test]
    fn test_fan_out_in_registration_order() {
        let first = RecordingSink::new("first");
        let second = RecordingSink::new("second");

        let mut bus = EventBus::new();
        bus.register(Severity::Info, first.clone());
        bus.register(Severity::Info, second.clone());

        bus.emit(&Event::info("hello"));

        assert_eq!(first.messages(), vec!["hello"]);
        assert_eq!(second.messages(), vec!["hello"]);
    }

    #[test]
    fn test_failing_sink_does_not_block_later_sinks() {
        let survivor = RecordingSink::new("survivor");

        let mut bus = EventBus::new();
        bus.register(Severity::Error, Arc::new(FailingSink));
        bus.register(Severity::Error, survivor.clone());

        bus.emit(&Event::error("boom"));

        assert_eq!(survivor.messages(), vec!["boom"]);
    }

    #[test]
    fn test_severity_routing() {
        let warn_sink = RecordingSink::new("warn-only");

        let mut bus = EventBus::new();
        bus.register(Severity::Warn, warn_sink.clone());

        bus.emit(&Event::info("quiet"));
        bus.emit(&Event::warn("loud"));

        assert_eq!(warn_sink.messages(), vec!["loud"]);
    }

    #[test]
    fn test_register_all_listens_on_every_level() {
        let sink = RecordingSink::new("everything");

        let mut bus = EventBus::new();
        bus.register_all(sink.clone());

        for severity in Severity::ALL {
            assert_eq!(bus.sink_count(severity), 1);
            bus.emit(&Event::new(severity, severity.as_str()));
        }

        assert_eq!(sink.messages(), vec!["debug", "info", "warn", "error"]);
    }
}
