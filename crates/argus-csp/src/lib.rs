//! Argus CSP
//!
//! Content Security Policy engine for the Argus browser engine.
//!
//! Features:
//! - Source expression and source list parsing (local-skip on bad tokens)
//! - Header parsing with comma-separated multi-policy support
//! - Directive fallback resolution (frame-src -> child-src -> default-src)
//! - Enforced and report-only policy evaluation with violation reporting
//! - Aggregate checks across every policy a document carries
//! - upgrade-insecure-requests URL rewriting
//!
//! The engine is a pure library: the embedding document supplies its
//! origin, scheme exemptions and reporting sink via [`CspContext`].

pub mod check;
pub mod context;
pub mod directive;
pub mod policy;
pub mod source;
pub mod source_list;
pub mod upgrade;
pub mod violation;

pub use check::{CheckMode, CspPolicySet};
pub use context::CspContext;
pub use directive::{CspDirective, DirectiveName};
pub use policy::{CspHeader, CspPolicy, PolicyDisposition, PolicySource};
pub use source::{CspSource, SourceParseError};
pub use source_list::CspSourceList;
pub use upgrade::{should_upgrade_request_url, upgrade_request_url};
pub use violation::{CspViolationParams, SourceLocation};
