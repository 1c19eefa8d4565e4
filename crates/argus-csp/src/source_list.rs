//! Source lists
//!
//! Parsing and matching of a directive value: a whitespace-separated list
//! of source expressions plus the `'self'`, `*` and
//! `'unsafe-allow-redirects'` keywords.

use tracing::debug;
use url::Url;

use crate::context::CspContext;
use crate::source::CspSource;

/// Schemes a bare `*` is allowed to match. Anything else must hit an
/// explicit source expression or `'self'`.
const NETWORK_SCHEMES: &[&str] = &["http", "https", "ws", "wss", "ftp"];

/// The parsed value of one directive.
///
/// An empty list with all flags unset is `'none'`: it matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspSourceList {
    pub sources: Vec<CspSource>,
    pub allow_self: bool,
    pub allow_star: bool,
    pub allow_redirects: bool,
}

impl CspSourceList {
    /// Parse a directive value. Never fails: malformed expressions are
    /// dropped one by one and the rest of the list is kept.
    pub fn parse(value: &str) -> Self {
        Self::parse_inner(value, false)
    }

    /// Parse an ancestor source list (`frame-ancestors`).
    ///
    /// Stricter subset: expressions must name a host, so scheme-only
    /// forms are dropped too.
    pub fn parse_ancestors(value: &str) -> Self {
        Self::parse_inner(value, true)
    }

    fn parse_inner(value: &str, ancestors: bool) -> Self {
        let mut list = CspSourceList::default();

        for token in value.split_ascii_whitespace() {
            if token.eq_ignore_ascii_case("'self'") {
                list.allow_self = true;
            } else if token == "*" {
                list.allow_star = true;
            } else if token.eq_ignore_ascii_case("'unsafe-allow-redirects'") {
                list.allow_redirects = true;
            } else {
                match CspSource::parse(token) {
                    Ok(source) => {
                        if ancestors && source.host.is_empty() && !source.is_host_wildcard {
                            debug!(token, "dropping scheme-only ancestor source");
                            continue;
                        }
                        list.sources.push(source);
                    }
                    Err(err) => {
                        debug!(token, %err, "dropping malformed source expression");
                    }
                }
            }
        }

        list
    }

    /// Match a candidate URL against this list.
    pub fn matches(
        &self,
        url: &Url,
        context: &dyn CspContext,
        has_followed_redirect: bool,
        is_response_check: bool,
    ) -> bool {
        // A list that tolerates redirects accepts any redirected request;
        // the response check still has to match the final URL strictly.
        if self.allow_redirects && has_followed_redirect && !is_response_check {
            return true;
        }

        let self_scheme = context.self_source().map(|s| s.scheme.clone());
        let self_scheme = self_scheme.as_deref();
        let trustworthy = context.is_url_potentially_trustworthy(url);

        if self.allow_self {
            if let Some(self_source) = context.self_source() {
                if self_source.matches(url, self_scheme, trustworthy) {
                    return true;
                }
            }
        }

        if self.allow_star && NETWORK_SCHEMES.contains(&url.scheme()) {
            return true;
        }

        self.sources
            .iter()
            .any(|source| source.matches(url, self_scheme, trustworthy))
    }

    /// True when the list is `'none'`-equivalent.
    pub fn is_none(&self) -> bool {
        self.sources.is_empty() && !self.allow_self && !self.allow_star
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::TestContext;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_parse_keywords() {
        let list = CspSourceList::parse("'self' * 'unsafe-allow-redirects'");
        assert!(list.allow_self);
        assert!(list.allow_star);
        assert!(list.allow_redirects);
        assert!(list.sources.is_empty());
    }

    #[test]
    fn test_parse_none_is_empty() {
        let list = CspSourceList::parse("'none'");
        assert!(list.is_none());
    }

    #[test]
    fn test_parse_drops_malformed_tokens_only() {
        let list = CspSourceList::parse("https://good.com bad..host https://also-good.com");
        assert_eq!(list.sources.len(), 2);
        assert_eq!(list.sources[0].host, "good.com");
        assert_eq!(list.sources[1].host, "also-good.com");
    }

    #[test]
    fn test_ancestor_list_drops_scheme_only() {
        let list = CspSourceList::parse_ancestors("https: https://parent.com");
        assert_eq!(list.sources.len(), 1);
        assert_eq!(list.sources[0].host, "parent.com");
    }

    #[test]
    fn test_none_matches_nothing() {
        let context = TestContext::with_self("http", "example.com", Some(80));
        let list = CspSourceList::parse("'none'");
        assert!(!list.matches(&url("http://example.com/"), &context, false, false));
        assert!(!list.matches(&url("https://other.com/x"), &context, false, false));
    }

    #[test]
    fn test_self_matches_own_origin_only() {
        let context = TestContext::with_self("http", "example.com", Some(80));
        let list = CspSourceList::parse("'self'");
        assert!(list.matches(&url("http://example.com/"), &context, false, false));
        assert!(!list.matches(&url("http://evil.com/"), &context, false, false));
    }

    #[test]
    fn test_star_skips_non_network_schemes() {
        let context = TestContext::with_self("https", "example.com", None);
        let list = CspSourceList::parse("*");
        assert!(list.matches(&url("https://anything.com/"), &context, false, false));
        assert!(list.matches(&url("ftp://files.com/"), &context, false, false));
        assert!(!list.matches(&url("data:text/plain,hello"), &context, false, false));

        let explicit = CspSourceList::parse("* data:");
        assert!(explicit.matches(&url("data:text/plain,hello"), &context, false, false));
    }

    #[test]
    fn test_redirect_tolerance() {
        let context = TestContext::with_self("https", "example.com", None);
        let list = CspSourceList::parse("https://a.com 'unsafe-allow-redirects'");
        let elsewhere = url("https://b.com/");

        assert!(!list.matches(&elsewhere, &context, false, false));
        assert!(list.matches(&elsewhere, &context, true, false));
        // The response check still validates the final URL.
        assert!(!list.matches(&elsewhere, &context, true, true));

        let strict = CspSourceList::parse("https://a.com");
        assert!(!strict.matches(&elsewhere, &context, true, false));
        assert!(strict.matches(&url("https://a.com/"), &context, true, false));
    }
}
