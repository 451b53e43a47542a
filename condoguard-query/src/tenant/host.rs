//! Host header parsing for subdomain-based tenant routing.

use std::net::IpAddr;

/// Normalise a raw host: strip the port and a trailing dot, lowercase.
///
/// Returns `None` for an empty host. IPv6 literals keep their address
/// without brackets.
pub fn normalize_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let host = if let Some(rest) = raw.strip_prefix('[') {
        // [v6]:port
        rest.split(']').next().unwrap_or_default()
    } else if raw.matches(':').count() == 1 {
        raw.split(':').next().unwrap_or_default()
    } else {
        raw
    };

    let host = host.trim_end_matches('.');
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// Whether `host` (already normalised) is an IP address literal.
pub fn is_ip_literal(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok()
}

/// The left-most label of `host`, when it has more than two labels.
///
/// `tenant.platform.tld` yields `tenant`; `platform.tld` and `localhost`
/// yield nothing. IP literals never yield a label.
pub fn subdomain_of(host: &str) -> Option<&str> {
    if is_ip_literal(host) {
        return None;
    }
    let mut labels = host.split('.');
    let first = labels.next().filter(|label| !label.is_empty())?;
    if labels.count() >= 2 { Some(first) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_port_and_case() {
        assert_eq!(normalize_host("T1.Condo.App:8080").as_deref(), Some("t1.condo.app"));
        assert_eq!(normalize_host("condo.app.").as_deref(), Some("condo.app"));
        assert_eq!(normalize_host("[::1]:3000").as_deref(), Some("::1"));
        assert_eq!(normalize_host("   "), None);
        assert_eq!(normalize_host(":80"), None);
    }

    #[test]
    fn test_subdomain_requires_three_labels() {
        assert_eq!(subdomain_of("tenant.platform.tld"), Some("tenant"));
        assert_eq!(subdomain_of("a.b.platform.tld"), Some("a"));
        assert_eq!(subdomain_of("platform.tld"), None);
        assert_eq!(subdomain_of("localhost"), None);
    }

    #[test]
    fn test_ip_literals_have_no_subdomain() {
        assert!(is_ip_literal("127.0.0.1"));
        assert!(is_ip_literal("::1"));
        assert_eq!(subdomain_of("10.0.0.12"), None);
    }

    #[test]
    fn test_empty_leading_label() {
        assert_eq!(subdomain_of(".platform.tld"), None);
    }
}
