//! Crash-reporting sink.
//!
//! Sub-error events become breadcrumbs in a bounded ring; error events
//! become a first-class report carrying the message, the event attributes
//! mapped to the backend's tag model, and the recent breadcrumb trail.

use crate::bus::{EventSink, SinkError};
use crate::event::{Event, Severity};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// How many breadcrumbs to retain between error reports.
pub const DEFAULT_BREADCRUMB_CAPACITY: usize = 20;

/// A report handed to the crash backend.
#[derive(Debug, Clone, Serialize)]
pub struct CrashReport {
    /// The error message, first-class. Never repeated in `tags`.
    pub message: String,
    pub level: String,
    /// Event attributes in the backend's tag model.
    pub tags: Vec<(String, String)>,
    /// Recent sub-error events, oldest first.
    pub breadcrumbs: Vec<String>,
    /// Unix timestamp (seconds).
    pub reported_at: u64,
}

/// Transport handing reports to the crash backend.
///
/// `submit` must not block; implementations enqueue and drop on overflow.
pub trait CrashTransport: Send + Sync {
    fn submit(&self, report: CrashReport);
}

/// Sink feeding the crash-reporting backend.
///
/// Register it across all severities: everything below error builds the
/// breadcrumb trail, error events produce a report.
pub struct CrashSink {
    transport: Box<dyn CrashTransport>,
    breadcrumbs: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl CrashSink {
    pub fn new(transport: Box<dyn CrashTransport>) -> Self {
        Self::with_capacity(transport, DEFAULT_BREADCRUMB_CAPACITY)
    }

    pub fn with_capacity(transport: Box<dyn CrashTransport>, capacity: usize) -> Self {
        Self {
            transport,
            breadcrumbs: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn push_breadcrumb(&self, event: &Event) {
        let mut crumbs = self
            .breadcrumbs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if crumbs.len() == self.capacity {
            crumbs.pop_front();
        }
        crumbs.push_back(format!("[{}] {}", event.severity(), event.message()));
    }

    fn build_report(&self, event: &Event) -> CrashReport {
        let breadcrumbs = {
            let crumbs = self
                .breadcrumbs
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            crumbs.iter().cloned().collect()
        };

        CrashReport {
            message: event.message().to_string(),
            level: event.severity().to_string(),
            tags: event
                .attributes()
                .iter()
                .map(|(key, value)| (key.clone(), value.to_string()))
                .collect(),
            breadcrumbs,
            reported_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}

impl EventSink for CrashSink {
    fn name(&self) -> &str {
        "crash-reporter"
    }

    fn deliver(&self, event: &Event) -> Result<(), SinkError> {
        match event.severity() {
            Severity::Error => self.transport.submit(self.build_report(event)),
            _ => self.push_breadcrumb(event),
        }
        Ok(())
    }
}
