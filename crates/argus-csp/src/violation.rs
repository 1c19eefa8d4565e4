//! Violation reports
//!
//! Structured violation parameters handed to the reporting sink, and the
//! console message that accompanies them.

use serde::Serialize;
use url::Url;

use crate::directive::{CspDirective, DirectiveName};
use crate::policy::PolicyDisposition;

/// Script location a violation originated from, when known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub url: String,
    pub line: u32,
    pub column: u32,
}

/// Everything the reporting sink needs to deliver one violation.
///
/// Created fresh per violated policy and consumed immediately;
/// serializable so hosts can ship it as a JSON report body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CspViolationParams {
    /// Name of the directive that was actually enforced (after fallback).
    pub directive_used: String,
    /// Name of the directive the check was made for.
    pub effective_directive: String,
    pub console_message: String,
    pub blocked_url: Url,
    pub report_endpoints: Vec<String>,
    pub use_reporting_api: bool,
    pub raw_header: String,
    pub disposition: PolicyDisposition,
    pub after_redirect: bool,
    pub source_location: Option<SourceLocation>,
}

/// Build the console message for a violation.
///
/// The exact wording is load-bearing: devtools and web tests match on it.
pub(crate) fn console_message(
    disposition: PolicyDisposition,
    requested: DirectiveName,
    resolved: DirectiveName,
    directive: &CspDirective,
    blocked_url: &Url,
) -> String {
    let prefix = match disposition {
        PolicyDisposition::Report => "[Report Only] ",
        PolicyDisposition::Enforce => "",
    };
    let (verb, subject) = match requested {
        DirectiveName::FormAction => ("send form data to", "it"),
        DirectiveName::FrameAncestors => ("frame", "an ancestor"),
        DirectiveName::NavigateTo => ("navigate to", "it"),
        DirectiveName::FrameSrc => ("frame", "it"),
        _ => ("load", "it"),
    };

    let mut message = format!(
        "{}Refused to {} '{}' because {} violates the following Content Security Policy \
         directive: \"{}\".\n",
        prefix,
        verb,
        blocked_url,
        subject,
        directive.header_text(),
    );
    if resolved != requested {
        message.push_str(&format!(
            " Note that '{}' was not explicitly set, so '{}' is used as a fallback.\n",
            requested, resolved,
        ));
    }
    message
}
