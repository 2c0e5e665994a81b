//! Analytics client.
//!
//! Pageview events are enqueued without blocking and delivered by a
//! background dispatcher under a bounded timeout. Delivery is best-effort:
//! no retry, no backpressure onto request handling.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Property cap imposed by the external analytics backend.
pub const DEFAULT_PROPERTY_LIMIT: usize = 2;

/// Bound on events waiting for the dispatcher.
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

/// Property mapping with the backend's cardinality cap enforced on insert.
#[derive(Debug, Clone)]
pub struct PropertyMap {
    limit: usize,
    entries: Vec<(String, String)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_PROPERTY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            entries: Vec::with_capacity(limit),
        }
    }

    /// Insert a property.
    ///
    /// An existing key is overwritten in place. Once the backend's cap is
    /// reached, new keys are dropped with a warning rather than failing the
    /// request; returns whether the entry was kept.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();

        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
            return true;
        }
        if self.entries.len() >= self.limit {
            warn!("analytics property '{}' dropped, cap of {} reached", key, self.limit);
            return false;
        }
        self.entries.push((key, value));
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.entries.iter()
    }
}

impl Default for PropertyMap {
    fn default() -> Self {
        Self::new()
    }
}

/// An event for the analytics backend.
#[derive(Debug, Clone)]
pub struct AnalyticsEvent {
    pub name: &'static str,
    pub properties: PropertyMap,
}

impl AnalyticsEvent {
    pub const PAGEVIEW: &'static str = "pageview";

    pub fn pageview(properties: PropertyMap) -> Self {
        Self {
            name: Self::PAGEVIEW,
            properties,
        }
    }

    /// Wire payload for HTTP transports.
    pub fn to_json(&self) -> Value {
        let mut props = serde_json::Map::new();
        for (key, value) in self.properties.iter() {
            props.insert(key.clone(), Value::String(value.clone()));
        }
        serde_json::json!({ "name": self.name, "properties": props })
    }
}

/// Delivery failure, logged and dropped by the dispatcher.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("backend rejected event: {0}")]
    Rejected(String),

    #[error("transport failed: {0}")]
    Transport(String),
}

/// Future returned by an analytics transport.
pub type DeliveryFuture = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send>>;

/// Capability delivering one event to the analytics backend.
pub trait AnalyticsTransport: Send + Sync {
    fn deliver(&self, event: &AnalyticsEvent) -> DeliveryFuture;
}

/// Cheap cloneable handle used by request handling to enqueue events.
#[derive(Clone)]
pub struct AnalyticsHandle {
    tx: Option<mpsc::Sender<AnalyticsEvent>>,
}

impl AnalyticsHandle {
    /// A handle that silently discards everything, for environments with
    /// no analytics wiring.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// A handle backed by a bounded channel, with the receiving end
    /// returned to the caller. Building block for [`spawn_dispatcher`] and
    /// for tests that assert on emitted events.
    pub fn channel(depth: usize) -> (Self, mpsc::Receiver<AnalyticsEvent>) {
        let (tx, rx) = mpsc::channel(depth);
        (Self { tx: Some(tx) }, rx)
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Enqueue an event without blocking. A full or closed queue drops the
    /// event with a warning; the request path never waits on analytics.
    pub fn send(&self, event: AnalyticsEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!("analytics queue full, dropping '{}' event", event.name);
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                warn!("analytics dispatcher gone, dropping '{}' event", event.name);
            }
        }
    }
}

/// Spawn the background dispatcher and return the handle feeding it.
///
/// Each event is delivered once under `timeout`; failures and timeouts are
/// logged and dropped.
pub fn spawn_dispatcher(
    transport: Arc<dyn AnalyticsTransport>,
    timeout: Duration,
) -> (AnalyticsHandle, JoinHandle<()>) {
    let (handle, mut rx) = AnalyticsHandle::channel(DEFAULT_QUEUE_DEPTH);

    let task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match tokio::time::timeout(timeout, transport.deliver(&event)).await {
                Ok(Ok(())) => debug!("delivered '{}' event", event.name),
                Ok(Err(e)) => warn!("analytics delivery failed: {}", e),
                Err(_) => warn!("analytics delivery timed out after {:?}", timeout),
            }
        }
        debug!("analytics dispatcher stopped");
    });

    (handle, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_property_cap_enforced() {
        let mut props = PropertyMap::with_limit(2);
        assert!(props.insert("subdomain", "my-site"));
        assert!(props.insert("url", "/index.html"));
        assert!(!props.insert("extra", "dropped"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_existing_key_overwritten_without_consuming_capacity() {
        let mut props = PropertyMap::with_limit(2);
        props.insert("url", "/a.html");
        assert!(props.insert("url", "/b.html"));
        assert_eq!(props.len(), 1);
        assert_eq!(props.iter().next().unwrap().1, "/b.html");
    }

    #[test]
    fn test_pageview_json_payload() {
        let mut props = PropertyMap::new();
        props.insert("subdomain", "my-site");
        let event = AnalyticsEvent::pageview(props);

        let payload = event.to_json();
        assert_eq!(payload["name"], "pageview");
        assert_eq!(payload["properties"]["subdomain"], "my-site");
    }

    #[test]
    fn test_disabled_handle_discards() {
        let handle = AnalyticsHandle::disabled();
        assert!(!handle.is_enabled());
        handle.send(AnalyticsEvent::pageview(PropertyMap::new()));
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let (handle, _rx) = AnalyticsHandle::channel(1);
        handle.send(AnalyticsEvent::pageview(PropertyMap::new()));
        // Queue is full now; this must return immediately.
        handle.send(AnalyticsEvent::pageview(PropertyMap::new()));
    }

    struct RecordingTransport {
        delivered: Arc<Mutex<Vec<&'static str>>>,
    }

    impl AnalyticsTransport for RecordingTransport {
        fn deliver(&self, event: &AnalyticsEvent) -> DeliveryFuture {
            let delivered = self.delivered.clone();
            let name = event.name;
            Box::pin(async move {
                delivered.lock().unwrap().push(name);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_enqueued_events() {
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let transport = Arc::new(RecordingTransport {
            delivered: delivered.clone(),
        });

        let (handle, task) = spawn_dispatcher(transport, Duration::from_secs(1));
        handle.send(AnalyticsEvent::pageview(PropertyMap::new()));
        drop(handle);

        task.await.unwrap();
        assert_eq!(*delivered.lock().unwrap(), vec!["pageview"]);
    }
}
