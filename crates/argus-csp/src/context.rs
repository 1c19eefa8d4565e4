//! Context boundary
//!
//! The engine never loads, renders or reports anything itself; the
//! embedding document supplies its origin, scheme policy and reporting
//! sink through this trait.

use url::Url;

use crate::source::CspSource;
use crate::violation::{CspViolationParams, SourceLocation};

/// Collaborator surface a protected document exposes to the engine.
pub trait CspContext {
    /// Source expression describing the document's own origin, used by
    /// `'self'` matching. `None` for opaque origins: `'self'` then never
    /// matches.
    fn self_source(&self) -> Option<&CspSource>;

    /// The document's own URL, substituted for the blocked URL in
    /// `frame-ancestors` violations so the embedder's URL never leaks
    /// into the embedded frame's reports.
    fn self_url(&self) -> Option<&Url>;

    /// Schemes exempted from CSP entirely: no evaluation, no reports.
    fn scheme_should_bypass_csp(&self, _scheme: &str) -> bool {
        false
    }

    /// Whether a URL counts as potentially trustworthy; schemeless
    /// source expressions accept such URLs.
    fn is_url_potentially_trustworthy(&self, url: &Url) -> bool {
        matches!(url.scheme(), "https" | "wss")
    }

    /// Last chance to redact violation data before it leaves the engine.
    fn sanitize_for_violation(
        &self,
        _blocked_url: &mut Url,
        _source_location: &mut Option<SourceLocation>,
    ) {
    }

    /// Deliver one violation. Fire-and-forget: called synchronously, in
    /// per-policy order, before the aggregate check returns.
    fn report_violation(&self, params: CspViolationParams);
}
