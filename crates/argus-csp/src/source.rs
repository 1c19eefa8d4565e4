//! Source expressions
//!
//! Parsing and matching of a single CSP source expression
//! (scheme://host:port/path with wildcards).

use percent_encoding::percent_decode_str;
use url::Url;

/// Error raised while parsing a single source expression.
///
/// A failed expression is dropped from its source list; the rest of the
/// directive keeps parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceParseError {
    #[error("'none' is not a source expression")]
    NoneKeyword,

    #[error("invalid scheme: {0:?}")]
    InvalidScheme(String),

    #[error("missing host after '//'")]
    MissingHost,

    #[error("empty host")]
    EmptyHost,

    #[error("invalid host character: {0:?}")]
    InvalidHostCharacter(char),

    #[error("invalid port: {0:?}")]
    InvalidPort(String),
}

/// One allow-rule atom inside a directive value.
///
/// Immutable once parsed. An empty `scheme` means "inherit from the
/// protected context"; an empty `host` with `is_host_wildcard` unset means
/// the expression was scheme-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspSource {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub is_host_wildcard: bool,
    pub is_port_wildcard: bool,
}

impl CspSource {
    /// Parse a single source expression.
    ///
    /// `'none'` is rejected here; the source-list parser handles it.
    pub fn parse(expression: &str) -> Result<Self, SourceParseError> {
        if expression.eq_ignore_ascii_case("'none'") {
            return Err(SourceParseError::NoneKeyword);
        }

        let mut source = CspSource::default();
        let mut rest = expression;

        // A scheme is present when a ':' appears before any '/' and is
        // followed by nothing (scheme-only) or by "//host...". Anything
        // else ("example.com:80") is a host expression.
        let colon = expression.find(':');
        let slash = expression.find('/');
        if let Some(colon) = colon.filter(|c| slash.map_or(true, |s| *c < s)) {
            let (scheme, after) = (&expression[..colon], &expression[colon + 1..]);
            if after.is_empty() {
                if !is_valid_scheme(scheme) {
                    return Err(SourceParseError::InvalidScheme(scheme.to_string()));
                }
                source.scheme = scheme.to_ascii_lowercase();
                return Ok(source);
            }
            if let Some(host_part) = after.strip_prefix("//") {
                if !is_valid_scheme(scheme) {
                    return Err(SourceParseError::InvalidScheme(scheme.to_string()));
                }
                if host_part.is_empty() || host_part.starts_with('/') {
                    return Err(SourceParseError::MissingHost);
                }
                source.scheme = scheme.to_ascii_lowercase();
                rest = host_part;
            }
            // Else: the colon belongs to a port, fall through to host parsing.
        }

        // host[:port][/path]
        let (host_port, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        let (host, port) = match host_port.find(':') {
            Some(i) => (&host_port[..i], Some(&host_port[i + 1..])),
            None => (host_port, None),
        };

        source.parse_host(host)?;
        if let Some(port) = port {
            source.parse_port(port)?;
        }
        if !path.is_empty() {
            source.parse_path(path);
        }
        Ok(source)
    }

    fn parse_host(&mut self, host: &str) -> Result<(), SourceParseError> {
        if host.is_empty() {
            return Err(SourceParseError::EmptyHost);
        }

        let host = if host == "*" {
            self.is_host_wildcard = true;
            return Ok(());
        } else if let Some(rest) = host.strip_prefix("*.") {
            self.is_host_wildcard = true;
            rest
        } else {
            host
        };

        if host.is_empty() {
            return Err(SourceParseError::EmptyHost);
        }
        for label in host.split('.') {
            if label.is_empty() {
                return Err(SourceParseError::EmptyHost);
            }
            if let Some(c) = label.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
                return Err(SourceParseError::InvalidHostCharacter(c));
            }
        }

        self.host = host.to_ascii_lowercase();
        Ok(())
    }

    fn parse_port(&mut self, port: &str) -> Result<(), SourceParseError> {
        if port == "*" {
            self.is_port_wildcard = true;
            return Ok(());
        }
        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SourceParseError::InvalidPort(port.to_string()));
        }
        match port.parse::<u16>() {
            Ok(p) => {
                self.port = Some(p);
                Ok(())
            }
            Err(_) => Err(SourceParseError::InvalidPort(port.to_string())),
        }
    }

    fn parse_path(&mut self, path: &str) {
        // Query and fragment never take part in CSP path matching.
        let end = path.find(['?', '#']).unwrap_or(path.len());
        self.path = percent_decode_str(&path[..end])
            .decode_utf8_lossy()
            .into_owned();
    }

    /// Match a candidate URL against this source.
    ///
    /// `self_scheme` is the protected context's own scheme; an empty source
    /// scheme matches it, or any URL the context deems potentially
    /// trustworthy.
    pub fn matches(&self, url: &Url, self_scheme: Option<&str>, url_is_trustworthy: bool) -> bool {
        if !self.scheme_matches(url.scheme(), self_scheme, url_is_trustworthy) {
            return false;
        }
        // Scheme-only expressions constrain nothing but the scheme.
        if self.host.is_empty() && !self.is_host_wildcard {
            return true;
        }
        self.host_matches(url.host_str().unwrap_or(""))
            && self.port_matches(url.port(), url.scheme())
            && self.path_matches(url.path())
    }

    fn scheme_matches(&self, url_scheme: &str, self_scheme: Option<&str>, trustworthy: bool) -> bool {
        if self.scheme.is_empty() {
            return trustworthy || self_scheme.is_some_and(|s| s.eq_ignore_ascii_case(url_scheme));
        }
        self.scheme.eq_ignore_ascii_case(url_scheme)
    }

    fn host_matches(&self, url_host: &str) -> bool {
        if self.is_host_wildcard {
            if self.host.is_empty() {
                return true;
            }
            // `*.example.com` matches example.com and any subdomain of it.
            let url_host = url_host.to_ascii_lowercase();
            return url_host == self.host || url_host.ends_with(&format!(".{}", self.host));
        }
        url_host.eq_ignore_ascii_case(&self.host)
    }

    fn port_matches(&self, url_port: Option<u16>, url_scheme: &str) -> bool {
        if self.is_port_wildcard {
            return true;
        }
        let effective = url_port.or_else(|| default_port(url_scheme));
        match self.port {
            Some(p) => effective == Some(p),
            // No port in the expression: only the scheme's default port.
            None => url_port.is_none() || effective == default_port(url_scheme),
        }
    }

    fn path_matches(&self, url_path: &str) -> bool {
        if self.path.is_empty() {
            return true;
        }
        let url_path = percent_decode_str(url_path).decode_utf8_lossy();
        if self.path.ends_with('/') {
            return url_path.starts_with(&self.path);
        }
        // Prefix match that respects segment boundaries: /foo matches
        // /foo and /foo/bar but never /foobar.
        url_path == self.path
            || (url_path.starts_with(&self.path)
                && url_path.as_bytes().get(self.path.len()) == Some(&b'/'))
    }
}

/// Default port for a scheme, per the WHATWG URL special schemes.
pub(crate) fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        "ftp" => Some(21),
        _ => None,
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
