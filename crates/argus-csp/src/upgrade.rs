//! Insecure request upgrading
//!
//! URL rewriting for `upgrade-insecure-requests`: http becomes https,
//! default port 80 becomes 443, locally trusted hosts are left alone.

use url::{Host, Url};

/// Whether `upgrade_request_url` would change this URL.
///
/// Only subresource and form-submission requests are ever upgraded;
/// excluding top-level navigations is the caller's responsibility.
pub fn should_upgrade_request_url(url: &Url) -> bool {
    if url.scheme() != "http" {
        return false;
    }
    // Non-default ports opt out of the rewrite.
    if url.port().is_some() {
        return false;
    }
    !is_locally_trusted(url)
}

/// Rewrite an insecure request URL to https.
///
/// Returns the input unchanged when no upgrade applies.
pub fn upgrade_request_url(url: &Url) -> Url {
    if !should_upgrade_request_url(url) {
        return url.clone();
    }
    let mut upgraded = url.clone();
    // http -> https is always a representable scheme change.
    let _ = upgraded.set_scheme("https");
    upgraded
}

/// Loopback IPv4, `localhost` and its subdomains never upgrade; plain
/// http is considered secure enough there.
fn is_locally_trusted(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(address)) => address.is_loopback(),
        Some(Host::Domain(domain)) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        _ => false,
    }
}
