//! Portal configuration.
//!
//! Built once at startup, validated, then shared read-only with every
//! classification. Nothing in the pipeline consults ambient globals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Runtime environment the portal is deployed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
    Development,
}

impl Environment {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the blocklist gate is consulted at all.
///
/// An explicit switch: tests exercise both modes deterministically instead
/// of branching on a runtime-mode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlocklistPolicy {
    Enforce,
    Disabled,
}

/// What a failed or timed-out blocklist lookup means for admission.
///
/// Silently admitting a blocked site is security-relevant, so this is an
/// explicit configuration switch, never inferred at check time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    FailOpen,
    FailClosed,
}

impl FailurePolicy {
    /// Default stance per environment: production fails closed, everything
    /// else fails open.
    pub fn default_for(environment: Environment) -> Self {
        if environment.is_production() {
            Self::FailClosed
        } else {
            Self::FailOpen
        }
    }

    /// Whether a failed lookup is treated as a block.
    pub fn assume_blocked(&self) -> bool {
        matches!(self, Self::FailClosed)
    }
}

/// Read-only portal configuration shared by every classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Count of trailing host labels reserved for the portal's own domain.
    pub portal_domain_length: usize,
    pub environment: Environment,
    pub blocklist: BlocklistPolicy,
    pub on_lookup_failure: FailurePolicy,
    /// Upper bound on a single blocklist lookup.
    pub lookup_timeout: Duration,
    /// Property cap imposed by the analytics backend.
    pub analytics_property_limit: usize,
}

impl PortalConfig {
    pub fn new(portal_domain_length: usize, environment: Environment) -> Self {
        Self {
            portal_domain_length,
            environment,
            blocklist: BlocklistPolicy::Enforce,
            on_lookup_failure: FailurePolicy::default_for(environment),
            lookup_timeout: Duration::from_secs(2),
            analytics_property_limit: skygate_observe::DEFAULT_PROPERTY_LIMIT,
        }
    }

    /// Validate configuration before traffic is accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.portal_domain_length == 0 {
            return Err(ConfigError::ZeroDomainLength);
        }
        if self.lookup_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.analytics_property_limit == 0 {
            return Err(ConfigError::ZeroPropertyLimit);
        }
        Ok(())
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new(2, Environment::Development)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("portal domain length must be at least 1")]
    ZeroDomainLength,

    #[error("blocklist lookup timeout must be non-zero")]
    ZeroTimeout,

    #[error("analytics property limit must be at least 1")]
    ZeroPropertyLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("production"), Some(Environment::Production));
        assert_eq!(Environment::parse("PROD"), Some(Environment::Production));
        assert_eq!(Environment::parse("dev"), Some(Environment::Development));
        assert_eq!(Environment::parse("moon"), None);
    }

    #[test]
    fn test_failure_policy_defaults() {
        assert_eq!(
            FailurePolicy::default_for(Environment::Production),
            FailurePolicy::FailClosed
        );
        assert_eq!(
            FailurePolicy::default_for(Environment::Staging),
            FailurePolicy::FailOpen
        );
        assert!(FailurePolicy::FailClosed.assume_blocked());
        assert!(!FailurePolicy::FailOpen.assume_blocked());
    }

    #[test]
    fn test_config_defaults_validate() {
        let config = PortalConfig::default();
        assert_eq!(config.portal_domain_length, 2);
        assert_eq!(config.blocklist, BlocklistPolicy::Enforce);
        assert_eq!(config.on_lookup_failure, FailurePolicy::FailOpen);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_values() {
        let mut config = PortalConfig::default();
        config.portal_domain_length = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDomainLength)));

        let mut config = PortalConfig::default();
        config.lookup_timeout = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));

        let mut config = PortalConfig::default();
        config.analytics_property_limit = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPropertyLimit)));
    }
}
