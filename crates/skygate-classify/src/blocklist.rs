//! Blocklist admission gate.
//!
//! Checks a subdomain against an externally maintained deny-list through an
//! injected membership-lookup capability. The gate performs at most one
//! lookup per request and holds no cache of its own; caching, if any, is
//! the lookup backend's concern.

use crate::config::{BlocklistPolicy, FailurePolicy, PortalConfig};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::debug;

/// Future returned by a membership lookup.
pub type LookupFuture = Pin<Box<dyn Future<Output = Result<bool, LookupError>> + Send>>;

/// Membership-check capability the gate is constructed with.
///
/// Production implementations query a remote key-value store; tests supply
/// fixed mappings.
pub trait MembershipLookup: Send + Sync {
    /// Whether `id` is present in the deny-list.
    fn contains(&self, id: &str) -> LookupFuture;
}

/// Lookup failure.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("blocklist backend error: {0}")]
    Backend(String),

    #[error("blocklist backend unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a single answered blocklist check.
#[derive(Debug)]
pub struct BlocklistDecision {
    /// Exact subdomain the gate was asked about, lower-cased.
    pub subject: String,
    pub blocked: bool,
    pub checked_at: SystemTime,
}

/// Result of consulting the gate.
#[derive(Debug)]
pub enum GateOutcome {
    /// The lookup answered.
    Decided(BlocklistDecision),
    /// The gate is disabled by policy; the lookup was not invoked.
    Skipped,
    /// The lookup failed; `assumed_blocked` reflects the configured
    /// failure policy.
    LookupFailed {
        subject: String,
        assumed_blocked: bool,
        error: LookupError,
    },
}

impl GateOutcome {
    /// Whether the request may be served.
    pub fn admitted(&self) -> bool {
        match self {
            Self::Decided(decision) => !decision.blocked,
            Self::Skipped => true,
            Self::LookupFailed { assumed_blocked, .. } => !assumed_blocked,
        }
    }
}

/// Admission-control gate over the injected lookup.
pub struct BlocklistGate {
    lookup: Arc<dyn MembershipLookup>,
    policy: BlocklistPolicy,
    on_failure: FailurePolicy,
    timeout: Duration,
}

impl BlocklistGate {
    pub fn new(
        lookup: Arc<dyn MembershipLookup>,
        policy: BlocklistPolicy,
        on_failure: FailurePolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            lookup,
            policy,
            on_failure,
            timeout,
        }
    }

    pub fn from_config(lookup: Arc<dyn MembershipLookup>, config: &PortalConfig) -> Self {
        Self::new(
            lookup,
            config.blocklist,
            config.on_lookup_failure,
            config.lookup_timeout,
        )
    }

    /// Check a subdomain against the deny-list.
    ///
    /// Invokes the lookup at most once, bounded by the configured timeout.
    /// Never errors: failures are folded into the outcome per the failure
    /// policy.
    pub async fn check(&self, subdomain: &str) -> GateOutcome {
        if self.policy == BlocklistPolicy::Disabled {
            debug!("blocklist disabled, skipping check for '{}'", subdomain);
            return GateOutcome::Skipped;
        }

        let subject = subdomain.to_ascii_lowercase();
        let checked_at = SystemTime::now();

        match tokio::time::timeout(self.timeout, self.lookup.contains(&subject)).await {
            Ok(Ok(blocked)) => GateOutcome::Decided(BlocklistDecision {
                subject,
                blocked,
                checked_at,
            }),
            Ok(Err(error)) => self.failed(subject, error),
            Err(_) => self.failed(subject, LookupError::Timeout(self.timeout)),
        }
    }

    fn failed(&self, subject: String, error: LookupError) -> GateOutcome {
        GateOutcome::LookupFailed {
            subject,
            assumed_blocked: self.on_failure.assume_blocked(),
            error,
        }
    }
}
