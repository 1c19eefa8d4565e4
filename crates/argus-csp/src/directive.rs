//! Directives
//!
//! Directive names, the fallback chain, and the parsed directive record.

use std::fmt;

use crate::source_list::CspSourceList;

/// The directive names this engine evaluates.
///
/// Unrecognized names parse to `Unknown`; they are kept on the policy as
/// raw strings but never take part in matching or fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveName {
    DefaultSrc,
    ChildSrc,
    FrameSrc,
    FormAction,
    NavigateTo,
    FrameAncestors,
    UpgradeInsecureRequests,
    Unknown,
}

impl DirectiveName {
    /// Parse a lowercase directive name.
    pub fn parse(name: &str) -> Self {
        match name {
            "default-src" => Self::DefaultSrc,
            "child-src" => Self::ChildSrc,
            "frame-src" => Self::FrameSrc,
            "form-action" => Self::FormAction,
            "navigate-to" => Self::NavigateTo,
            "frame-ancestors" => Self::FrameAncestors,
            "upgrade-insecure-requests" => Self::UpgradeInsecureRequests,
            _ => Self::Unknown,
        }
    }

    /// Serialized directive token, as it appears in headers and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DefaultSrc => "default-src",
            Self::ChildSrc => "child-src",
            Self::FrameSrc => "frame-src",
            Self::FormAction => "form-action",
            Self::NavigateTo => "navigate-to",
            Self::FrameAncestors => "frame-ancestors",
            Self::UpgradeInsecureRequests => "upgrade-insecure-requests",
            Self::Unknown => "",
        }
    }

    /// Next directive to consult when this one is absent from a policy.
    ///
    /// Only the frame/child/default chain cascades; everything else
    /// terminates immediately.
    pub fn fallback(&self) -> Self {
        match self {
            Self::FrameSrc => Self::ChildSrc,
            Self::ChildSrc => Self::DefaultSrc,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for DirectiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named rule within a policy.
///
/// `raw_name` keeps the lowercased header token (meaningful for unknown
/// directives); `value` keeps the raw directive value for console messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspDirective {
    pub name: DirectiveName,
    pub raw_name: String,
    pub value: String,
    pub source_list: CspSourceList,
}

impl CspDirective {
    pub fn new(raw_name: &str, value: &str) -> Self {
        let name = DirectiveName::parse(raw_name);
        let source_list = match name {
            DirectiveName::FrameAncestors => CspSourceList::parse_ancestors(value),
            _ => CspSourceList::parse(value),
        };
        Self {
            name,
            raw_name: raw_name.to_string(),
            value: value.to_string(),
            source_list,
        }
    }

    /// Header-text rendering used in violation console messages.
    pub fn header_text(&self) -> String {
        if self.value.is_empty() {
            self.raw_name.clone()
        } else {
            format!("{} {}", self.raw_name, self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &[DirectiveName] = &[
        DirectiveName::DefaultSrc,
        DirectiveName::ChildSrc,
        DirectiveName::FrameSrc,
        DirectiveName::FormAction,
        DirectiveName::NavigateTo,
        DirectiveName::FrameAncestors,
        DirectiveName::UpgradeInsecureRequests,
    ];

    #[test]
    fn test_directive_name_round_trip() {
        for name in KNOWN {
            assert_eq!(DirectiveName::parse(name.as_str()), *name);
        }
        assert_eq!(DirectiveName::parse("script-src"), DirectiveName::Unknown);
        assert_eq!(DirectiveName::Unknown.as_str(), "");
    }

    #[test]
    fn test_fallback_chain_terminates() {
        assert_eq!(DirectiveName::FrameSrc.fallback(), DirectiveName::ChildSrc);
        assert_eq!(DirectiveName::ChildSrc.fallback(), DirectiveName::DefaultSrc);
        for name in KNOWN {
            let mut current = *name;
            let mut steps = 0;
            while current != DirectiveName::Unknown {
                current = current.fallback();
                steps += 1;
                assert!(steps <= 3, "fallback chain must terminate");
            }
        }
        assert_eq!(DirectiveName::Unknown.fallback(), DirectiveName::Unknown);
    }

    #[test]
    fn test_frame_ancestors_uses_ancestor_grammar() {
        let directive = CspDirective::new("frame-ancestors", "https: https://parent.com");
        assert_eq!(directive.source_list.sources.len(), 1);

        let directive = CspDirective::new("frame-src", "https: https://frame.com");
        assert_eq!(directive.source_list.sources.len(), 2);
    }

    #[test]
    fn test_header_text() {
        let directive = CspDirective::new("frame-src", "https://a.com 'self'");
        assert_eq!(directive.header_text(), "frame-src https://a.com 'self'");
        let bare = CspDirective::new("upgrade-insecure-requests", "");
        assert_eq!(bare.header_text(), "upgrade-insecure-requests");
    }
}
