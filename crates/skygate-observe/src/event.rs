//! Structured observability events.
//!
//! Events are created at the call site, fanned out synchronously to the
//! registered sinks, then dropped. They are never queued or retried at this
//! layer.

use std::fmt;

/// Reserved attribute key used for the event message itself.
///
/// Backends that merge message and attributes into one record would report
/// the message twice if an attribute reused this key, so the builder skips
/// it.
pub const MESSAGE_KEY: &str = "message";

/// Event severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    /// All severities in ascending order, for registering a sink across
    /// every level.
    pub const ALL: [Severity; 4] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A structured observability event.
///
/// The message is fixed at construction; attributes are appended through
/// the builder and exclude the reserved message key.
#[derive(Debug, Clone)]
pub struct Event {
    severity: Severity,
    message: String,
    attributes: Vec<(String, AttrValue)>,
}

impl Event {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            attributes: Vec::new(),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Append an attribute. The reserved message key is skipped.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        let key = key.into();
        if key != MESSAGE_KEY {
            self.attributes.push((key, value.into()));
        }
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn attributes(&self) -> &[(String, AttrValue)] {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let event = Event::info("site admitted")
            .attr("subdomain", "my-site")
            .attr("hits", 3u64);

        assert_eq!(event.severity(), Severity::Info);
        assert_eq!(event.message(), "site admitted");
        assert_eq!(event.attributes().len(), 2);
        assert_eq!(event.attributes()[0].1, AttrValue::Str("my-site".to_string()));
        assert_eq!(event.attributes()[1].1, AttrValue::Int(3));
    }

    #[test]
    fn test_reserved_message_key_skipped() {
        let event = Event::error("boom")
            .attr(MESSAGE_KEY, "shadowed")
            .attr("code", 7i64);

        assert_eq!(event.attributes().len(), 1);
        assert_eq!(event.attributes()[0].0, "code");
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warn.to_string(), "warn");
        assert_eq!(Severity::ALL.len(), 4);
    }
}
