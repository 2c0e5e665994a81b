//! Console sink writing through `tracing`.

use crate::bus::{EventSink, SinkError};
use crate::event::{AttrValue, Event, Severity};
use tracing::{debug, error, info, warn};

/// Writes events to the process log at the matching level, rendering
/// attributes as `key=value` pairs.
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn deliver(&self, event: &Event) -> Result<(), SinkError> {
        let attrs = format_attrs(event.attributes());
        match event.severity() {
            Severity::Debug => debug!("{}{}", event.message(), attrs),
            Severity::Info => info!("{}{}", event.message(), attrs),
            Severity::Warn => warn!("{}{}", event.message(), attrs),
            Severity::Error => error!("{}{}", event.message(), attrs),
        }
        Ok(())
    }
}

fn format_attrs(attributes: &[(String, AttrValue)]) -> String {
    let mut out = String::new();
    for (key, value) in attributes {
        out.push(' ');
        out.push_str(key);
        out.push('=');
        out.push_str(&value.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_attrs() {
        let attrs = vec![
            ("subdomain".to_string(), AttrValue::Str("my-site".to_string())),
            ("admitted".to_string(), AttrValue::Bool(false)),
        ];
        assert_eq!(format_attrs(&attrs), " subdomain=my-site admitted=false");
        assert_eq!(format_attrs(&[]), "");
    }

    #[test]
    fn test_deliver_is_infallible() {
        let sink = ConsoleSink;
        let event = Event::warn("site denied").attr("subdomain", "blocked-site");
        assert!(sink.deliver(&event).is_ok());
    }
}
