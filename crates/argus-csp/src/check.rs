//! Policy checks
//!
//! Per-policy evaluation (resolve, match, report) and the aggregate
//! check across every policy a document carries.

use tracing::debug;
use url::Url;

use crate::context::CspContext;
use crate::directive::DirectiveName;
use crate::policy::{CspPolicy, PolicyDisposition, PolicySource};
use crate::violation::{self, CspViolationParams, SourceLocation};

/// Which dispositions an aggregate check should evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    All,
    EnforcedOnly,
    ReportOnly,
}

impl CspPolicy {
    /// Evaluate one candidate URL against this policy.
    ///
    /// Returns whether the policy allows the URL. A violated report-only
    /// policy reports but still returns `true`.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        &self,
        context: &dyn CspContext,
        requested: DirectiveName,
        url: &Url,
        has_followed_redirect: bool,
        is_response_check: bool,
        source_location: Option<&SourceLocation>,
        is_form_submission: bool,
    ) -> bool {
        // navigate-to has no effect on form submissions whenever
        // form-action governs them.
        if is_form_submission
            && requested == DirectiveName::NavigateTo
            && self.directive(DirectiveName::FormAction).is_some()
        {
            return true;
        }

        if scheme_bypasses_csp(context, url) {
            return true;
        }

        // Absence is not a denial.
        let Some((directive, resolved)) = self.resolve_directive(requested) else {
            return true;
        };

        if directive
            .source_list
            .matches(url, context, has_followed_redirect, is_response_check)
        {
            return true;
        }

        // frame-ancestors reports must never reveal the embedder to the
        // embedded frame; its own URL stands in for the blocked one.
        let mut blocked_url = match requested {
            DirectiveName::FrameAncestors => {
                context.self_url().cloned().unwrap_or_else(|| url.clone())
            }
            _ => url.clone(),
        };
        let mut source_location = source_location.cloned();
        context.sanitize_for_violation(&mut blocked_url, &mut source_location);

        let console_message = violation::console_message(
            self.header.disposition,
            requested,
            resolved,
            directive,
            &blocked_url,
        );
        debug!(
            directive = resolved.as_str(),
            %blocked_url,
            "content security policy violation"
        );
        context.report_violation(CspViolationParams {
            directive_used: resolved.as_str().to_string(),
            effective_directive: requested.as_str().to_string(),
            console_message,
            blocked_url,
            report_endpoints: self.report_endpoints.clone(),
            use_reporting_api: self.use_reporting_api,
            raw_header: self.header.raw.clone(),
            disposition: self.header.disposition,
            after_redirect: has_followed_redirect,
            source_location,
        });

        self.header.disposition == PolicyDisposition::Report
    }
}

/// The ordered policy sequence of one document or context.
///
/// Grows as headers and late `<meta>` policies arrive; never shrinks
/// before navigation tears the context down.
#[derive(Debug, Clone, Default)]
pub struct CspPolicySet {
    policies: Vec<CspPolicy>,
}

impl CspPolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one header value and append the resulting policies.
    pub fn append_header(
        &mut self,
        header_value: &str,
        base_url: &Url,
        disposition: PolicyDisposition,
        source: PolicySource,
    ) {
        self.policies
            .extend(CspPolicy::parse_list(header_value, base_url, disposition, source));
    }

    pub fn append(&mut self, policy: CspPolicy) {
        self.policies.push(policy);
    }

    pub fn policies(&self) -> &[CspPolicy] {
        &self.policies
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Check a URL against every applicable policy.
    ///
    /// Every applicable policy must allow; each violated policy reports
    /// independently of the aggregate outcome.
    #[allow(clippy::too_many_arguments)]
    pub fn is_allowed(
        &self,
        context: &dyn CspContext,
        requested: DirectiveName,
        url: &Url,
        has_followed_redirect: bool,
        is_response_check: bool,
        source_location: Option<&SourceLocation>,
        check_mode: CheckMode,
        is_form_submission: bool,
    ) -> bool {
        if scheme_bypasses_csp(context, url) {
            return true;
        }

        let mut allowed = true;
        for policy in &self.policies {
            let applicable = match check_mode {
                CheckMode::All => true,
                CheckMode::EnforcedOnly => {
                    policy.header.disposition == PolicyDisposition::Enforce
                }
                CheckMode::ReportOnly => policy.header.disposition == PolicyDisposition::Report,
            };
            if !applicable {
                continue;
            }
            allowed &= policy.evaluate(
                context,
                requested,
                url,
                has_followed_redirect,
                is_response_check,
                source_location,
                is_form_submission,
            );
        }
        allowed
    }

    /// True when any policy carries `upgrade-insecure-requests`.
    pub fn should_upgrade_insecure_requests(&self) -> bool {
        self.policies.iter().any(CspPolicy::upgrades_insecure_requests)
    }
}

/// Scheme bypass, unwrapping `blob:`/`filesystem:` to their inner URL.
fn scheme_bypasses_csp(context: &dyn CspContext, url: &Url) -> bool {
    let scheme = url.scheme();
    if matches!(scheme, "blob" | "filesystem") {
        if let Ok(inner) = Url::parse(url.path()) {
            return context.scheme_should_bypass_csp(inner.scheme());
        }
    }
    context.scheme_should_bypass_csp(scheme)
}
