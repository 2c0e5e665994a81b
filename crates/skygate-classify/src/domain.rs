//! Site domain parsing.
//!
//! Derives which logical site a request targets from its Host header. The
//! trailing labels of the hostname are reserved for the portal's own apex
//! domain; everything before them names the site.

/// A request's parsed domain.
///
/// Immutable once constructed; created per request and discarded after
/// classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDomain {
    /// Host labels preceding the portal apex, lower-cased and re-joined.
    /// `None` when the host has no labels beyond the apex, i.e. the request
    /// targets the portal itself.
    pub subdomain: Option<String>,
    /// Request path, always starting with `/`.
    pub path: String,
}

impl SiteDomain {
    /// Parse a Host header value and request path.
    ///
    /// Total: malformed hosts degrade to an apex classification instead of
    /// erroring, so every request remains classifiable. Empty labels from
    /// consecutive or trailing dots are ignored and an optional port is
    /// stripped.
    pub fn parse(host: &str, path: &str, suffix_len: usize) -> Self {
        let host = host.split(':').next().unwrap_or(host).to_ascii_lowercase();
        let labels: Vec<&str> = host.split('.').filter(|label| !label.is_empty()).collect();

        let subdomain = if labels.len() <= suffix_len {
            None
        } else {
            Some(labels[..labels.len() - suffix_len].join("."))
        };

        Self {
            subdomain,
            path: normalize_path(path),
        }
    }

    /// Whether the request targets the portal apex rather than a site.
    pub fn is_apex(&self) -> bool {
        self.subdomain.is_none()
    }
}

fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apex_host_has_no_subdomain() {
        let parsed = SiteDomain::parse("wal.app", "/", 2);
        assert_eq!(parsed.subdomain, None);
        assert!(parsed.is_apex());
    }

    #[test]
    fn test_single_label_subdomain() {
        let parsed = SiteDomain::parse("my-site.wal.app", "/index.html", 2);
        assert_eq!(parsed.subdomain.as_deref(), Some("my-site"));
        assert_eq!(parsed.path, "/index.html");
    }

    #[test]
    fn test_nested_subdomain_labels_rejoined() {
        let parsed = SiteDomain::parse("docs.my-site.wal.app", "/", 2);
        assert_eq!(parsed.subdomain.as_deref(), Some("docs.my-site"));
    }

    #[test]
    fn test_subdomain_is_lower_cased() {
        let parsed = SiteDomain::parse("My-Site.WAL.App", "/", 2);
        assert_eq!(parsed.subdomain.as_deref(), Some("my-site"));
    }

    #[test]
    fn test_fewer_labels_than_suffix() {
        let parsed = SiteDomain::parse("localhost", "/health", 2);
        assert_eq!(parsed.subdomain, None);
    }

    #[test]
    fn test_empty_labels_ignored() {
        assert_eq!(
            SiteDomain::parse("my-site.wal.app.", "/", 2).subdomain.as_deref(),
            Some("my-site")
        );
        assert_eq!(
            SiteDomain::parse("my-site..wal.app", "/", 2).subdomain.as_deref(),
            Some("my-site")
        );
        assert_eq!(SiteDomain::parse("...", "/", 2).subdomain, None);
    }

    #[test]
    fn test_empty_host_degrades_to_apex() {
        let parsed = SiteDomain::parse("", "/index.html", 2);
        assert_eq!(parsed.subdomain, None);
        assert_eq!(parsed.path, "/index.html");
    }

    #[test]
    fn test_port_stripped() {
        let parsed = SiteDomain::parse("my-site.wal.app:8080", "/", 2);
        assert_eq!(parsed.subdomain.as_deref(), Some("my-site"));
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(SiteDomain::parse("wal.app", "", 2).path, "/");
        assert_eq!(SiteDomain::parse("wal.app", "index.html", 2).path, "/index.html");
        assert_eq!(SiteDomain::parse("wal.app", "/a/b", 2).path, "/a/b");
    }

    #[test]
    fn test_reparse_of_reconstructed_host_is_stable() {
        let first = SiteDomain::parse("Docs.My-Site.wal.app", "/page.html", 2);
        let rebuilt = format!("{}.wal.app", first.subdomain.as_deref().unwrap());
        let second = SiteDomain::parse(&rebuilt, "/page.html", 2);
        assert_eq!(first, second);
    }
}
