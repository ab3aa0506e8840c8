//! Apex-domain classification backed by the Public Suffix List.
//!
//! A URL is considered apex when its host carries no subdomain label, or
//! only the conventional `www`. Everything here is pure and total:
//! `is_apex` never fails, and the typed variants let callers count rejects
//! instead of losing them.

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("unparseable URL: {0}")]
    Unparseable(String),

    #[error("URL has no host: {0}")]
    NoHost(String),

    #[error("IP addresses have no registrable domain: {0}")]
    IpAddress(String),

    #[error("no registrable domain in host: {0}")]
    NoRegistrableDomain(String),
}

/// Add an `https://` prefix for bare hosts so ranklist entries parse.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn host_of(raw: &str) -> Result<String, ClassifyError> {
    let parsed = Url::parse(&normalize_url(raw))
        .map_err(|_| ClassifyError::Unparseable(raw.to_string()))?;

    if matches!(
        parsed.host(),
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_))
    ) {
        return Err(ClassifyError::IpAddress(raw.to_string()));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ClassifyError::NoHost(raw.to_string()))?;

    Ok(host.trim_end_matches('.').to_ascii_lowercase())
}

/// Extract the registrable domain (eTLD+1) from a URL or bare host.
/// Handles multi-label suffixes: `www.example.co.uk` -> `example.co.uk`.
pub fn registrable_domain(raw: &str) -> Result<String, ClassifyError> {
    let host = host_of(raw)?;
    match psl::domain(host.as_bytes()) {
        Some(domain) => Ok(String::from_utf8_lossy(domain.as_bytes()).to_string()),
        None => Err(ClassifyError::NoRegistrableDomain(host)),
    }
}

/// The subdomain portion of the host; empty string when the host is the
/// registrable domain itself.
pub fn subdomain_label(raw: &str) -> Result<String, ClassifyError> {
    let host = host_of(raw)?;
    let domain = match psl::domain(host.as_bytes()) {
        Some(domain) => String::from_utf8_lossy(domain.as_bytes()).to_string(),
        None => return Err(ClassifyError::NoRegistrableDomain(host)),
    };

    if host == domain {
        Ok(String::new())
    } else if host.ends_with(&format!(".{}", domain)) {
        Ok(host[..host.len() - domain.len() - 1].to_string())
    } else {
        // PSL returned a domain that is not a suffix of the host; treat the
        // host as unclassifiable rather than guessing.
        Err(ClassifyError::NoRegistrableDomain(host))
    }
}

/// True iff the URL points at an apex domain (no subdomain, or `www` only).
/// Total: any classification failure yields `false`.
pub fn is_apex(raw: &str) -> bool {
    matches!(subdomain_label(raw).as_deref(), Ok("") | Ok("www"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("example.com").unwrap(), "example.com");
        assert_eq!(
            registrable_domain("https://www.example.com/path").unwrap(),
            "example.com"
        );
        assert_eq!(
            registrable_domain("api.staging.example.com").unwrap(),
            "example.com"
        );
        assert_eq!(
            registrable_domain("www.example.co.uk").unwrap(),
            "example.co.uk"
        );
    }

    #[test]
    fn test_registrable_domain_rejects_ips() {
        assert_eq!(
            registrable_domain("http://192.168.0.1/"),
            Err(ClassifyError::IpAddress("http://192.168.0.1/".to_string()))
        );
    }

    #[test]
    fn test_subdomain_label() {
        assert_eq!(subdomain_label("example.com").unwrap(), "");
        assert_eq!(subdomain_label("www.example.com").unwrap(), "www");
        assert_eq!(subdomain_label("mail.example.com").unwrap(), "mail");
        assert_eq!(
            subdomain_label("a.b.example.co.uk").unwrap(),
            "a.b"
        );
    }

    #[test]
    fn test_is_apex() {
        assert!(is_apex("example.com"));
        assert!(is_apex("www.example.com"));
        assert!(is_apex("https://example.com/some/page"));
        assert!(is_apex("www.example.co.uk"));

        assert!(!is_apex("mail.example.com"));
        assert!(!is_apex("a.b.example.com"));
        assert!(!is_apex("www.staging.example.com"));
    }

    #[test]
    fn test_is_apex_is_total() {
        assert!(!is_apex(""));
        assert!(!is_apex("not a url at all"));
        assert!(!is_apex("http://"));
        assert!(!is_apex("http://192.168.0.1/"));
    }
}
