//! Policies
//!
//! Header parsing: raw `Content-Security-Policy` values into policy
//! records, plus directive resolution over one policy.

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::directive::{CspDirective, DirectiveName};

/// Whether a policy blocks violations or only reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyDisposition {
    #[default]
    Enforce,
    Report,
}

/// Where the policy was delivered from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PolicySource {
    #[default]
    Http,
    Meta,
}

/// The raw header a policy was parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspHeader {
    pub raw: String,
    pub disposition: PolicyDisposition,
    pub source: PolicySource,
}

/// One parsed policy: an ordered set of uniquely-named directives plus
/// reporting configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CspPolicy {
    pub header: CspHeader,
    pub directives: Vec<CspDirective>,
    pub report_endpoints: Vec<String>,
    pub use_reporting_api: bool,
}

impl CspPolicy {
    /// Parse one header value into its policies.
    ///
    /// Repeated headers arrive pre-joined with `,` (RFC 7230 §3.2.2), and
    /// each top-level comma-separated segment is an independent policy, so
    /// this returns a sequence. Relative `report-uri` targets resolve
    /// against `base_url`.
    pub fn parse_list(
        header_value: &str,
        base_url: &Url,
        disposition: PolicyDisposition,
        source: PolicySource,
    ) -> Vec<CspPolicy> {
        header_value
            .split(',')
            .filter(|segment| !segment.trim().is_empty())
            .map(|segment| Self::parse_segment(segment, base_url, disposition, source))
            .collect()
    }

    fn parse_segment(
        segment: &str,
        base_url: &Url,
        disposition: PolicyDisposition,
        source: PolicySource,
    ) -> CspPolicy {
        let mut policy = CspPolicy {
            header: CspHeader {
                raw: segment.trim().to_string(),
                disposition,
                source,
            },
            ..CspPolicy::default()
        };
        let mut reporting_configured = false;

        for token in segment.split(';') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            let (name, value) = match token.find(|c: char| c.is_ascii_whitespace()) {
                Some(i) => (&token[..i], token[i..].trim_start()),
                None => (token, ""),
            };
            let name = name.to_ascii_lowercase();

            match name.as_str() {
                // The reporting directives form one class: report-to wins
                // over report-uri, and each is honored at most once.
                "report-to" => {
                    if !policy.use_reporting_api {
                        policy.use_reporting_api = true;
                        policy.report_endpoints.clear();
                        if let Some(group) = value.split_ascii_whitespace().next() {
                            policy.report_endpoints.push(group.to_string());
                        }
                        reporting_configured = true;
                    }
                }
                "report-uri" => {
                    if !reporting_configured {
                        reporting_configured = true;
                        for target in value.split_ascii_whitespace() {
                            match base_url.join(target) {
                                Ok(resolved) => policy.report_endpoints.push(resolved.into()),
                                Err(_) => {
                                    debug!(uri = target, "dropping unresolvable report-uri target");
                                }
                            }
                        }
                    }
                }
                _ => {
                    // First directive of a given name wins.
                    if policy.directives.iter().any(|d| d.raw_name == name) {
                        debug!(name, "ignoring duplicate directive");
                        continue;
                    }
                    policy.directives.push(CspDirective::new(&name, value));
                }
            }
        }

        policy
    }

    /// Find the directive governing `requested`, walking the fallback
    /// chain. Also returns the name that actually matched, so violation
    /// messages can call out fallback use.
    pub fn resolve_directive(
        &self,
        requested: DirectiveName,
    ) -> Option<(&CspDirective, DirectiveName)> {
        let mut name = requested;
        while name != DirectiveName::Unknown {
            if let Some(directive) = self.directives.iter().find(|d| d.name == name) {
                return Some((directive, name));
            }
            name = name.fallback();
        }
        None
    }

    /// Look up a directive by its exact name, no fallback.
    pub fn directive(&self, name: DirectiveName) -> Option<&CspDirective> {
        self.directives.iter().find(|d| d.name == name)
    }

    /// True when the policy carries `upgrade-insecure-requests`,
    /// regardless of its (empty) value.
    pub fn upgrades_insecure_requests(&self) -> bool {
        self.directive(DirectiveName::UpgradeInsecureRequests).is_some()
    }
}
