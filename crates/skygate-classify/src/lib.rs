//! Skygate Classification Pipeline
//!
//! The request-classification front door of the portal. For every inbound
//! request, before any content is fetched, this crate decides which logical
//! site the request targets, whether that site may be served, and what
//! observability signal the request emits.
//!
//! Flow:
//! 1. Host + path → `SiteDomain` (pure, total)
//! 2. Document views consult the `BlocklistGate` (at most one lookup)
//! 3. Outcome emitted through the observability fan-out
//! 4. `Classification` handed to the content resolver

mod blocklist;
mod classifier;
mod config;
mod domain;
mod resource;

pub use blocklist::{
    BlocklistDecision, BlocklistGate, GateOutcome, LookupError, LookupFuture, MembershipLookup,
};
pub use classifier::{Classification, ClassifierStats, RequestClassifier, RequestContext};
pub use config::{BlocklistPolicy, ConfigError, Environment, FailurePolicy, PortalConfig};
pub use domain::SiteDomain;
pub use resource::ResourceKind;
