//! Versioned host markup contracts.

use crate::dom::Element;

/// Structural markers the resolver relies on. A host markup change is handled
/// by adding a new implementation, not by patching the resolver.
pub trait MarkupContract {
    /// Identifier of the markup revision this contract targets.
    fn version(&self) -> &'static str;

    /// Whether the element is one rendered timeline item.
    fn is_content_node(&self, el: &Element) -> bool;

    /// Whether the element wraps the author's display name and handle.
    fn is_author_block(&self, el: &Element) -> bool;

    /// Whether the element is an internal, root-relative link.
    fn is_profile_link(&self, el: &Element) -> bool;

    /// First path segments that never name a profile.
    fn reserved_segments(&self) -> &[&'static str];
}

/// Timeline markup as rendered with `data-testid` hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineMarkupV1;

const TEST_ID: &str = "data-testid";
const RESERVED: &[&str] = &["status", "i"];

impl MarkupContract for TimelineMarkupV1 {
    fn version(&self) -> &'static str {
        "timeline-v1"
    }

    fn is_content_node(&self, el: &Element) -> bool {
        el.tag() == "article" && el.attr(TEST_ID).as_deref() == Some("tweet")
    }

    fn is_author_block(&self, el: &Element) -> bool {
        el.attr(TEST_ID).as_deref() == Some("User-Name")
    }

    fn is_profile_link(&self, el: &Element) -> bool {
        el.tag() == "a" && el.attr("href").is_some_and(|href| href.starts_with('/'))
    }

    fn reserved_segments(&self) -> &[&'static str] {
        RESERVED
    }
}
