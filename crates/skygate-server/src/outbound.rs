//! Outbound HTTP transport.
//!
//! One pooled client shared by the blocklist lookup, analytics delivery,
//! crash reporting and the upstream content fetch. Every request is bounded
//! by a single timeout and bodies are read fully; the payloads on these
//! paths are small.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Method, Request, StatusCode, header};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use thiserror::Error;

/// Outbound request errors.
#[derive(Debug, Error)]
pub enum OutboundError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("body read failed: {0}")]
    Body(String),
}

/// Pooled outbound HTTP client with a per-request timeout.
#[derive(Clone)]
pub struct Outbound {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl Outbound {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout,
        }
    }

    /// GET a URL, returning status, headers and body.
    pub async fn get(&self, url: &str) -> Result<(StatusCode, HeaderMap, Bytes), OutboundError> {
        self.request(Method::GET, url, None).await
    }

    /// POST a JSON payload.
    pub async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<(StatusCode, HeaderMap, Bytes), OutboundError> {
        self.request(Method::POST, url, Some(payload.to_string()))
            .await
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        json_body: Option<String>,
    ) -> Result<(StatusCode, HeaderMap, Bytes), OutboundError> {
        let uri: hyper::Uri = url
            .parse()
            .map_err(|_| OutboundError::InvalidUrl(url.to_string()))?;

        let builder = Request::builder().method(method).uri(uri);
        let request = match json_body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(json))),
            None => builder.body(Full::new(Bytes::new())),
        }
        .map_err(|e| OutboundError::InvalidUrl(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| OutboundError::Timeout(self.timeout))?
            .map_err(|e| OutboundError::Connection(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| OutboundError::Body(e.to_string()))?
            .to_bytes();

        Ok((status, headers, body))
    }
}
