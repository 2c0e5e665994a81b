//! Skygate Observability
//!
//! Best-effort fan-out of structured events to log, crash-reporting and
//! analytics backends. Everything here is fire-and-forget: a slow or broken
//! backend may lose its own signal but never delays or fails the request
//! that produced it.
//!
//! Flow:
//! 1. Request handling creates an `Event` (or a `pageview` AnalyticsEvent)
//! 2. `EventBus` fans it out synchronously to the registered sinks
//! 3. Sinks that talk to remote backends enqueue into bounded channels
//! 4. Background dispatchers deliver under bounded timeouts, no retries

mod analytics;
mod bus;
mod console;
mod crash;
mod event;

pub use analytics::{
    AnalyticsEvent, AnalyticsHandle, AnalyticsTransport, DEFAULT_PROPERTY_LIMIT,
    DEFAULT_QUEUE_DEPTH, DeliveryError, DeliveryFuture, PropertyMap, spawn_dispatcher,
};
pub use bus::{EventBus, EventSink, SinkError};
pub use console::ConsoleSink;
pub use crash::{CrashReport, CrashSink, CrashTransport, DEFAULT_BREADCRUMB_CAPACITY};
pub use event::{AttrValue, Event, MESSAGE_KEY, Severity};
