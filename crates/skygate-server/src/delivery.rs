//! Production delivery transports for analytics events and crash reports.
//!
//! Both are strictly best-effort: delivery failures are logged and the
//! payload is dropped. Neither transport is ever awaited by request
//! handling.

use crate::outbound::Outbound;
use skygate_observe::{
    AnalyticsEvent, AnalyticsTransport, CrashReport, CrashTransport, DeliveryError, DeliveryFuture,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Posts analytics events as JSON. Driven by the observe crate's
/// dispatcher, which applies the delivery timeout.
pub struct HttpAnalyticsTransport {
    outbound: Outbound,
    url: String,
}

impl HttpAnalyticsTransport {
    pub fn new(outbound: Outbound, url: impl Into<String>) -> Self {
        Self {
            outbound,
            url: url.into(),
        }
    }
}

impl AnalyticsTransport for HttpAnalyticsTransport {
    fn deliver(&self, event: &AnalyticsEvent) -> DeliveryFuture {
        let outbound = self.outbound.clone();
        let url = self.url.clone();
        let payload = event.to_json();

        Box::pin(async move {
            let (status, _, _) = outbound
                .post_json(&url, &payload)
                .await
                .map_err(|e| DeliveryError::Transport(e.to_string()))?;
            if status.is_success() {
                Ok(())
            } else {
                Err(DeliveryError::Rejected(format!("status {}", status)))
            }
        })
    }
}

/// Crash transport posting reports from a bounded queue.
///
/// `submit` never blocks; a full queue drops the report.
pub struct HttpCrashTransport {
    tx: mpsc::Sender<CrashReport>,
}

impl HttpCrashTransport {
    pub fn spawn(outbound: Outbound, url: String, depth: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<CrashReport>(depth);

        tokio::spawn(async move {
            while let Some(report) = rx.recv().await {
                match serde_json::to_value(&report) {
                    Ok(payload) => match outbound.post_json(&url, &payload).await {
                        Ok((status, _, _)) if status.is_success() => {
                            debug!("crash report delivered");
                        }
                        Ok((status, _, _)) => warn!("crash backend returned {}", status),
                        Err(e) => warn!("crash report delivery failed: {}", e),
                    },
                    Err(e) => warn!("crash report serialization failed: {}", e),
                }
            }
            debug!("crash transport stopped");
        });

        Self { tx }
    }
}

impl CrashTransport for HttpCrashTransport {
    fn submit(&self, report: CrashReport) {
        if self.tx.try_send(report).is_err() {
            warn!("crash report queue full, dropping report");
        }
    }
}
