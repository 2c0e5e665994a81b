//! Content resolver seam.
//!
//! Admitted requests are handed off here. Actual on-chain object resolution
//! and blob fetch live in the upstream content service; this side only
//! forwards the site and path, then relays the answer.

use crate::outbound::Outbound;
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use skygate_classify::SiteDomain;
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

/// Future returned by a resolver.
pub type ResolveFuture = Pin<Box<dyn Future<Output = Result<Response<Body>, StatusCode>> + Send>>;

/// Produces the response for an admitted request.
pub trait SiteResolver: Send + Sync {
    fn resolve(&self, domain: &SiteDomain) -> ResolveFuture;
}

/// Forwards admitted requests to the upstream content service.
pub struct UpstreamResolver {
    outbound: Outbound,
    base_url: String,
}

impl UpstreamResolver {
    pub fn new(outbound: Outbound, base_url: impl Into<String>) -> Self {
        Self {
            outbound,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, domain: &SiteDomain) -> Option<String> {
        let subdomain = domain.subdomain.as_deref()?;
        Some(format!("{}/{}{}", self.base_url, subdomain, domain.path))
    }
}

impl SiteResolver for UpstreamResolver {
    fn resolve(&self, domain: &SiteDomain) -> ResolveFuture {
        let outbound = self.outbound.clone();
        let url = self.url_for(domain);

        Box::pin(async move {
            let url = url.ok_or(StatusCode::NOT_FOUND)?;

            let (status, headers, body) = outbound.get(&url).await.map_err(|e| {
                warn!("upstream fetch failed for {}: {}", url, e);
                StatusCode::BAD_GATEWAY
            })?;

            let mut builder = Response::builder().status(status);
            if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
                builder = builder.header(header::CONTENT_TYPE, content_type);
            }
            builder
                .body(Body::from(body))
                .map_err(|_| StatusCode::BAD_GATEWAY)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_url_joins_subdomain_and_path() {
        let resolver = UpstreamResolver::new(
            Outbound::new(Duration::from_secs(1)),
            "http://aggregator.internal/sites/",
        );
        let domain = SiteDomain::parse("my-site.wal.app", "/page.html", 2);
        assert_eq!(
            resolver.url_for(&domain).as_deref(),
            Some("http://aggregator.internal/sites/my-site/page.html")
        );
    }

    #[test]
    fn test_apex_domain_has_no_upstream_url() {
        let resolver =
            UpstreamResolver::new(Outbound::new(Duration::from_secs(1)), "http://aggregator");
        let domain = SiteDomain::parse("wal.app", "/", 2);
        assert_eq!(resolver.url_for(&domain), None);
    }
}
