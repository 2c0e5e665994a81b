//! Request classifier.
//!
//! Orchestrates the pipeline on every inbound request: parse the domain,
//! consult the blocklist gate, emit the observability signal. Each request
//! moves through parse → gate → emit exactly once; nothing is revisited.
//!
//! This is the HOT PATH - everything that can suspend is bounded by the
//! gate's lookup timeout, and nothing here errors past `classify`.

use crate::blocklist::{BlocklistGate, GateOutcome};
use crate::config::PortalConfig;
use crate::domain::SiteDomain;
use crate::resource::ResourceKind;
use skygate_observe::{AnalyticsEvent, AnalyticsHandle, Event, EventBus, PropertyMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Inbound request fields the classifier needs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id attached to every emitted event.
    pub request_id: Uuid,
    /// Raw Host header value.
    pub host: String,
    /// Request path, including any query string.
    pub path: String,
    /// Original URL from the attribution header, if present and valid.
    pub original_url: Option<String>,
}

impl RequestContext {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            host: host.into(),
            path: path.into(),
            original_url: None,
        }
    }

    pub fn with_original_url(mut self, url: impl Into<String>) -> Self {
        self.original_url = Some(url.into());
        self
    }
}

/// Result of classifying one request.
#[derive(Debug)]
pub struct Classification {
    /// Whether the downstream resolver may serve the request.
    pub admit: bool,
    pub domain: SiteDomain,
}

/// Counters across all classifications.
#[derive(Debug, Default)]
pub struct ClassifierStats {
    pub total: AtomicU64,
    pub admitted: AtomicU64,
    pub denied: AtomicU64,
    pub lookup_failures: AtomicU64,
    pub untracked: AtomicU64,
}

/// Classifies inbound requests against the portal configuration, the
/// blocklist gate and the observability fan-out.
///
/// Shared state is read-only after construction; classifications for
/// different requests are fully independent.
pub struct RequestClassifier {
    config: Arc<PortalConfig>,
    gate: BlocklistGate,
    events: Arc<EventBus>,
    analytics: AnalyticsHandle,
    stats: ClassifierStats,
}

impl RequestClassifier {
    pub fn new(
        config: Arc<PortalConfig>,
        gate: BlocklistGate,
        events: Arc<EventBus>,
        analytics: AnalyticsHandle,
    ) -> Self {
        Self {
            config,
            gate,
            events,
            analytics,
            stats: ClassifierStats::default(),
        }
    }

    /// Classify one request: parse, gate, emit.
    ///
    /// Never errors past this boundary. Gate failures fold into the
    /// configured failure policy; sink and analytics failures degrade to
    /// local log lines.
    pub async fn classify(&self, req: RequestContext) -> Classification {
        self.stats.total.fetch_add(1, Ordering::Relaxed);

        let domain = SiteDomain::parse(&req.host, &req.path, self.config.portal_domain_length);

        // Asset requests skip the gate and analytics entirely; tracking is
        // bounded to document views.
        if !ResourceKind::from_path(&domain.path).is_trackable() {
            self.stats.untracked.fetch_add(1, Ordering::Relaxed);
            self.stats.admitted.fetch_add(1, Ordering::Relaxed);
            let mut event = Event::debug("asset request admitted")
                .attr("request_id", req.request_id.to_string())
                .attr("path", domain.path.as_str());
            if let Some(subdomain) = &domain.subdomain {
                event = event.attr("subdomain", subdomain.as_str());
            }
            self.events.emit(&event);
            return Classification {
                admit: true,
                domain,
            };
        }

        // Apex requests target the portal itself; the gate is never
        // consulted for them.
        let Some(subdomain) = domain.subdomain.clone() else {
            self.stats.admitted.fetch_add(1, Ordering::Relaxed);
            self.events.emit(
                &Event::debug("portal request admitted")
                    .attr("request_id", req.request_id.to_string())
                    .attr("path", domain.path.as_str()),
            );
            return Classification {
                admit: true,
                domain,
            };
        };

        let outcome = self.gate.check(&subdomain).await;
        let admit = outcome.admitted();

        match &outcome {
            GateOutcome::Decided(decision) if decision.blocked => {
                self.stats.denied.fetch_add(1, Ordering::Relaxed);
                self.events.emit(
                    &Event::warn("site denied by blocklist")
                        .attr("request_id", req.request_id.to_string())
                        .attr("subdomain", decision.subject.as_str())
                        .attr("path", domain.path.as_str()),
                );
            }
            GateOutcome::LookupFailed {
                subject,
                assumed_blocked,
                error,
            } => {
                self.stats.lookup_failures.fetch_add(1, Ordering::Relaxed);
                if *assumed_blocked {
                    self.stats.denied.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.stats.admitted.fetch_add(1, Ordering::Relaxed);
                }
                self.events.emit(
                    &Event::error("blocklist lookup failed")
                        .attr("request_id", req.request_id.to_string())
                        .attr("subdomain", subject.as_str())
                        .attr("admitted", admit)
                        .attr("error", error.to_string()),
                );
            }
            _ => {
                self.stats.admitted.fetch_add(1, Ordering::Relaxed);
                self.events.emit(
                    &Event::info("site admitted")
                        .attr("request_id", req.request_id.to_string())
                        .attr("subdomain", subdomain.as_str())
                        .attr("path", domain.path.as_str()),
                );
            }
        }

        if admit {
            self.track_pageview(&req, &subdomain, &domain.path);
        }

        Classification { admit, domain }
    }

    /// Emit the single pageview event for an admitted document view.
    fn track_pageview(&self, req: &RequestContext, subdomain: &str, path: &str) {
        let mut properties = PropertyMap::with_limit(self.config.analytics_property_limit);
        properties.insert("subdomain", subdomain);
        properties.insert("url", req.original_url.as_deref().unwrap_or(path));
        self.analytics.send(AnalyticsEvent::pageview(properties));
    }

    pub fn stats(&self) -> &ClassifierStats {
        &self.stats
    }
}
