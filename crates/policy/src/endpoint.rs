//! Endpoint allowlisting with SSRF prevention, for the sync providers'
//! outbound HTTP clients (§4.6) — a provider's configured base URL must
//! not resolve to a private/internal address.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointCheck {
    Allowed,
    Denied { url: String, reason: String },
}

/// Check if a URL is allowed by an endpoint allowlist.
///
/// - Empty allowlist or a `"*"` entry → allow everything except private IPs.
/// - Otherwise the URL must start with one of the allowed prefixes.
/// - Private/internal hosts are blocked unconditionally (SSRF prevention).
pub fn check_endpoint(url: &str, allowed_endpoints: &[String]) -> EndpointCheck {
    if is_private_url(url) {
        return EndpointCheck::Denied {
            url: url.into(),
            reason: "request to private/internal address blocked (SSRF prevention)".into(),
        };
    }

    if allowed_endpoints.is_empty() || allowed_endpoints.iter().any(|e| e == "*") {
        return EndpointCheck::Allowed;
    }

    if allowed_endpoints.iter().any(|e| url.starts_with(e.as_str())) {
        EndpointCheck::Allowed
    } else {
        EndpointCheck::Denied {
            url: url.into(),
            reason: format!(
                "url not in allowed endpoints ({} configured)",
                allowed_endpoints.len()
            ),
        }
    }
}

fn is_private_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    let host = lower
        .strip_prefix("http://")
        .or_else(|| lower.strip_prefix("https://"))
        .unwrap_or(&lower);
    let host = host.split('/').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);

    host == "localhost"
        || host == "127.0.0.1"
        || host.starts_with("10.")
        || host.starts_with("192.168.")
        || host.starts_with("172.1")
        || host.starts_with("172.2")
        || host.starts_with("172.30.")
        || host.starts_with("172.31.")
        || host == "169.254.169.254"
        || host == "[::1]"
        || host == "0.0.0.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allowlist_allows_public_hosts() {
        assert_eq!(
            check_endpoint("https://api.example.com/v1", &[]),
            EndpointCheck::Allowed
        );
    }

    #[test]
    fn matching_prefix_allowed() {
        let allowed = vec!["https://api.example.com".to_string()];
        assert_eq!(
            check_endpoint("https://api.example.com/v1/data", &allowed),
            EndpointCheck::Allowed
        );
    }

    #[test]
    fn non_matching_prefix_denied() {
        let allowed = vec!["https://api.example.com".to_string()];
        assert!(matches!(
            check_endpoint("https://evil.com/steal", &allowed),
            EndpointCheck::Denied { .. }
        ));
    }

    #[test]
    fn private_address_blocked_even_with_wildcard() {
        let allowed = vec!["*".to_string()];
        let result = check_endpoint("http://169.254.169.254/latest/meta-data/", &allowed);
        match result {
            EndpointCheck::Denied { reason, .. } => assert!(reason.contains("SSRF")),
            EndpointCheck::Allowed => panic!("expected private address to be denied"),
        }
    }

    #[test]
    fn localhost_blocked() {
        assert!(matches!(
            check_endpoint("http://127.0.0.1:8080/admin", &[]),
            EndpointCheck::Denied { .. }
        ));
    }
}
