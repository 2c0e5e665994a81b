//! Skygate: request-classification front door for portal-served sites.
//!
//! Classifies every inbound request (which site it targets, whether that
//! site may be served, and what observability signal it emits) before any
//! content is fetched from the decentralized store.

mod config;
mod delivery;
mod handlers;
mod lookup;
mod outbound;
mod resolver;

use crate::config::ServerConfig;
use crate::delivery::{HttpAnalyticsTransport, HttpCrashTransport};
use crate::handlers::{AppState, front_door};
use crate::lookup::{HttpMembershipLookup, NullLookup};
use crate::outbound::Outbound;
use crate::resolver::UpstreamResolver;
use anyhow::Result;
use axum::Router;
use skygate_classify::{BlocklistGate, MembershipLookup, RequestClassifier};
use skygate_observe::{AnalyticsHandle, ConsoleSink, CrashSink, EventBus, spawn_dispatcher};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Use mimalloc as the global allocator for reduced memory fragmentation
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skygate=debug,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!("Skygate starting ({})", config.portal.environment);

    let outbound = Outbound::new(config.request_timeout);

    // Sinks are registered before the listener binds; the registry is
    // read-only once traffic flows.
    let mut bus = EventBus::new();
    bus.register_all(Arc::new(ConsoleSink));
    if let Some(url) = &config.crash_url {
        let transport = HttpCrashTransport::spawn(outbound.clone(), url.clone(), 64);
        bus.register_all(Arc::new(CrashSink::new(Box::new(transport))));
        tracing::info!("Crash reporting enabled");
    }
    let events = Arc::new(bus);

    let analytics = match &config.analytics_url {
        Some(url) => {
            let transport = Arc::new(HttpAnalyticsTransport::new(outbound.clone(), url.clone()));
            let (handle, _dispatcher) = spawn_dispatcher(transport, config.request_timeout);
            tracing::info!("Analytics delivery enabled");
            handle
        }
        None => AnalyticsHandle::disabled(),
    };

    let lookup: Arc<dyn MembershipLookup> = match &config.blocklist_url {
        Some(url) => {
            tracing::info!("Blocklist enforcement: {:?}", config.portal.blocklist);
            Arc::new(HttpMembershipLookup::new(outbound.clone(), url.clone()))
        }
        None => {
            tracing::warn!("No blocklist store configured, gate disabled");
            Arc::new(NullLookup)
        }
    };

    let portal = Arc::new(config.portal.clone());
    let gate = BlocklistGate::from_config(lookup, &portal);
    let classifier = Arc::new(RequestClassifier::new(
        portal,
        gate,
        events,
        analytics,
    ));

    let resolver = Arc::new(UpstreamResolver::new(
        outbound,
        config.upstream_url.clone(),
    ));
    let state = Arc::new(AppState {
        classifier,
        resolver,
    });

    let app = Router::new()
        .fallback(front_door)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("Portal front door listening on http://{}", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
