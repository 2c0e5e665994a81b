//! Blocklist membership lookups.
//!
//! The production lookup is a key existence query against the deny-list
//! store: 200 means the subdomain is listed, 404 means it is not. Anything
//! else is a backend error and folds into the gate's failure policy.

use crate::outbound::{Outbound, OutboundError};
use hyper::StatusCode;
use skygate_classify::{LookupError, LookupFuture, MembershipLookup};
use tracing::debug;

/// Remote key-value deny-list lookup.
pub struct HttpMembershipLookup {
    outbound: Outbound,
    base_url: String,
}

impl HttpMembershipLookup {
    pub fn new(outbound: Outbound, base_url: impl Into<String>) -> Self {
        Self {
            outbound,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn key_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id.to_ascii_lowercase())
    }
}

impl MembershipLookup for HttpMembershipLookup {
    fn contains(&self, id: &str) -> LookupFuture {
        let outbound = self.outbound.clone();
        let url = self.key_url(id);

        Box::pin(async move {
            match outbound.get(&url).await {
                Ok((status, _, _)) => {
                    if status == StatusCode::OK {
                        debug!("deny-list hit: {}", url);
                        Ok(true)
                    } else if status == StatusCode::NOT_FOUND {
                        Ok(false)
                    } else {
                        Err(LookupError::Backend(format!("unexpected status {}", status)))
                    }
                }
                Err(OutboundError::Timeout(timeout)) => Err(LookupError::Timeout(timeout)),
                Err(e) => Err(LookupError::Unavailable(e.to_string())),
            }
        })
    }
}

/// Placeholder lookup wired when the gate is disabled; it never reports a
/// member and is never consulted by a disabled gate.
pub struct NullLookup;

impl MembershipLookup for NullLookup {
    fn contains(&self, _id: &str) -> LookupFuture {
        Box::pin(async { Ok(false) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_key_url_is_lower_cased_and_slash_safe() {
        let lookup = HttpMembershipLookup::new(
            Outbound::new(Duration::from_secs(1)),
            "http://blocklist.internal/v1/sites/",
        );
        assert_eq!(
            lookup.key_url("My-Site"),
            "http://blocklist.internal/v1/sites/my-site"
        );
    }

    #[tokio::test]
    async fn test_null_lookup_reports_no_members() {
        let result = NullLookup.contains("anything").await;
        assert!(matches!(result, Ok(false)));
    }
}
