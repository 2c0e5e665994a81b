//! Server configuration from the environment.
//!
//! Pipeline semantics live in `PortalConfig`; this layer only decides what
//! the process binds, which backends are wired, and fails fast on invalid
//! values before the listener starts.

use anyhow::{Context, Result, bail};
use skygate_classify::{BlocklistPolicy, Environment, FailurePolicy, PortalConfig};
use std::time::Duration;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_PORTAL_DOMAIN_LENGTH: usize = 2;
const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:9000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Full server configuration: the validated portal config plus wiring.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub portal: PortalConfig,
    /// Deny-list store base URL. Absent disables the gate.
    pub blocklist_url: Option<String>,
    /// Analytics backend URL. Absent disables analytics delivery.
    pub analytics_url: Option<String>,
    /// Crash backend URL. Absent disables crash reporting.
    pub crash_url: Option<String>,
    /// Upstream content service the resolver forwards to.
    pub upstream_url: String,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// Load from `SKYGATE_*` environment variables, falling back to
    /// development defaults.
    pub fn from_env() -> Result<Self> {
        let environment = match std::env::var("SKYGATE_ENV") {
            Ok(value) => Environment::parse(&value)
                .with_context(|| format!("unknown SKYGATE_ENV value '{}'", value))?,
            Err(_) => Environment::Development,
        };

        let portal_domain_length = parse_var(
            "SKYGATE_PORTAL_DOMAIN_LENGTH",
            DEFAULT_PORTAL_DOMAIN_LENGTH,
        )?;

        let blocklist_url = optional_var("SKYGATE_BLOCKLIST_URL");
        let analytics_url = optional_var("SKYGATE_ANALYTICS_URL");
        let crash_url = optional_var("SKYGATE_CRASH_URL");

        let mut portal = PortalConfig::new(portal_domain_length, environment);
        if let Some(value) = optional_var("SKYGATE_BLOCKLIST") {
            portal.blocklist = parse_blocklist_policy(&value)?;
        }
        if blocklist_url.is_none() {
            // Without a store to ask there is nothing to enforce.
            portal.blocklist = BlocklistPolicy::Disabled;
        }
        if let Some(value) = optional_var("SKYGATE_ON_LOOKUP_FAILURE") {
            portal.on_lookup_failure = parse_failure_policy(&value)?;
        }
        if let Some(value) = optional_var("SKYGATE_LOOKUP_TIMEOUT_MS") {
            let millis: u64 = value
                .parse()
                .with_context(|| format!("invalid SKYGATE_LOOKUP_TIMEOUT_MS '{}'", value))?;
            portal.lookup_timeout = Duration::from_millis(millis);
        }
        portal.validate().context("invalid portal configuration")?;

        Ok(Self {
            bind: optional_var("SKYGATE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            portal,
            blocklist_url,
            analytics_url,
            crash_url,
            upstream_url: optional_var("SKYGATE_UPSTREAM_URL")
                .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            request_timeout: Duration::from_secs(parse_var(
                "SKYGATE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match optional_var(name) {
        Some(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid {} value '{}'", name, value)),
        None => Ok(default),
    }
}

fn parse_blocklist_policy(value: &str) -> Result<BlocklistPolicy> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "enforce" => Ok(BlocklistPolicy::Enforce),
        "off" | "disabled" => Ok(BlocklistPolicy::Disabled),
        other => bail!("unknown SKYGATE_BLOCKLIST value '{}'", other),
    }
}

fn parse_failure_policy(value: &str) -> Result<FailurePolicy> {
    match value.to_ascii_lowercase().as_str() {
        "fail-open" | "open" => Ok(FailurePolicy::FailOpen),
        "fail-closed" | "closed" => Ok(FailurePolicy::FailClosed),
        other => bail!("unknown SKYGATE_ON_LOOKUP_FAILURE value '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocklist_policy_parsing() {
        assert_eq!(
            parse_blocklist_policy("enforce").unwrap(),
            BlocklistPolicy::Enforce
        );
        assert_eq!(parse_blocklist_policy("OFF").unwrap(), BlocklistPolicy::Disabled);
        assert!(parse_blocklist_policy("maybe").is_err());
    }

    #[test]
    fn test_failure_policy_parsing() {
        assert_eq!(
            parse_failure_policy("fail-open").unwrap(),
            FailurePolicy::FailOpen
        );
        assert_eq!(
            parse_failure_policy("closed").unwrap(),
            FailurePolicy::FailClosed
        );
        assert!(parse_failure_policy("shrug").is_err());
    }
}
