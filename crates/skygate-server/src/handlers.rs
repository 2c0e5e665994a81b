//! Front-door request handling.
//!
//! A single fallback handler classifies every host/path pair, then either
//! answers for the portal apex, refuses a denied site, or hands the request
//! to the content resolver.

use crate::resolver::SiteResolver;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Json, Response};
use skygate_classify::{RequestClassifier, RequestContext, SiteDomain};
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// Header carrying the original URL for analytics attribution when the
/// portal sits behind a rewriting proxy.
pub const ORIGINAL_URL_HEADER: &str = "x-original-url";

/// Shared application state.
pub struct AppState {
    pub classifier: Arc<RequestClassifier>,
    pub resolver: Arc<dyn SiteResolver>,
}

/// Classify-and-serve handler for every host and path.
pub async fn front_door(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();

    let mut ctx = RequestContext::new(host, path);
    if let Some(original) = original_url(&headers) {
        ctx = ctx.with_original_url(original);
    }

    // Classification runs to completion even if the client goes away: it is
    // cheap and side-effect-only, and tearing it down mid-flight would
    // orphan partial log/analytics state.
    let classifier = state.classifier.clone();
    let classification = match tokio::spawn(async move { classifier.classify(ctx).await }).await {
        Ok(classification) => classification,
        Err(e) => {
            warn!("classification task failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if classification.domain.is_apex() {
        return portal_response();
    }
    if !classification.admit {
        return denied_response(&classification.domain);
    }

    match state.resolver.resolve(&classification.domain).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Validate and extract the attribution header.
fn original_url(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(ORIGINAL_URL_HEADER)?.to_str().ok()?;
    Url::parse(raw).ok().map(|url| url.to_string())
}

/// Response for requests targeting the portal apex itself.
fn portal_response() -> Response {
    Json(serde_json::json!({
        "service": "skygate",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

/// Refusal for a site denied by the blocklist gate.
fn denied_response(domain: &SiteDomain) -> Response {
    let site = domain.subdomain.as_deref().unwrap_or("this site");
    (
        StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS,
        Html(format!(
            "<html><body><h1>451</h1><p>{} cannot be served through this portal.</p></body></html>",
            site
        )),
    )
        .into_response()
}
