//! Author resolution: maps a rendered content node to the identity that
//! wrote it.

pub mod markup;

pub use markup::{MarkupContract, TimelineMarkupV1};

use crate::dom::Element;
use crate::types::canonicalize;

/// The author of a content node, as far as the markup reveals it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Lowercase handle, the block-list key.
    pub canonical_username: String,
    /// Handle as rendered in the link.
    pub display_username: String,
    /// Best-effort stable identity, defaults to the canonical username.
    pub identity_hint: String,
}

/// Strategy that classifies content nodes and resolves their author.
pub trait AuthorResolver {
    /// Whether the element is a content node this resolver understands.
    fn qualifies(&self, el: &Element) -> bool;

    /// Resolve the author of a content node. `None` means the node cannot be
    /// classified; it is not an error.
    fn resolve(&self, node: &Element) -> Option<Author>;

    /// Element inside the node next to which a block control belongs.
    fn control_anchor(&self, _node: &Element) -> Option<Element> {
        None
    }
}

/// Resolves authors from the first path segment of internal links.
#[derive(Debug, Clone, Default)]
pub struct HandleResolver<M> {
    markup: M,
}

impl<M: MarkupContract> HandleResolver<M> {
    pub fn new(markup: M) -> Self {
        Self { markup }
    }

    pub fn markup(&self) -> &M {
        &self.markup
    }

    /// Handle named by a root-relative link, unless it is reserved.
    fn handle_of(&self, href: &str) -> Option<String> {
        let segment = first_segment(href)?;
        if self
            .markup
            .reserved_segments()
            .iter()
            .any(|reserved| segment.eq_ignore_ascii_case(reserved))
        {
            return None;
        }
        Some(segment.to_string())
    }

    /// First link inside the author block, with its leading `/` removed.
    fn identity_hint(&self, node: &Element) -> Option<String> {
        let block = node.find_first(|el| self.markup.is_author_block(el))?;
        let link = block.find_first(|el| self.markup.is_profile_link(el))?;
        let href = link.attr("href")?;
        let hint = href.strip_prefix('/').unwrap_or(&href);
        let hint = hint.split(['?', '#']).next().unwrap_or_default();
        (!hint.is_empty()).then(|| hint.to_string())
    }
}

impl<M: MarkupContract> AuthorResolver for HandleResolver<M> {
    fn qualifies(&self, el: &Element) -> bool {
        self.markup.is_content_node(el)
    }

    fn resolve(&self, node: &Element) -> Option<Author> {
        let display_username = node
            .find_all(|el| self.markup.is_profile_link(el))
            .iter()
            .filter_map(|link| link.attr("href"))
            .find_map(|href| self.handle_of(&href))?;

        let canonical_username = canonicalize(&display_username);
        let identity_hint = self
            .identity_hint(node)
            .unwrap_or_else(|| canonical_username.clone());

        Some(Author {
            canonical_username,
            display_username: display_username
                .strip_prefix('@')
                .unwrap_or(&display_username)
                .to_string(),
            identity_hint,
        })
    }

    fn control_anchor(&self, node: &Element) -> Option<Element> {
        node.find_first(|el| self.markup.is_author_block(el))
    }
}

/// First non-empty path segment of a root-relative href, without query or
/// fragment and without a leading `@`.
fn first_segment(href: &str) -> Option<&str> {
    let path = href.strip_prefix('/')?;
    let segment = path.split(['/', '?', '#']).next()?;
    let segment = segment.strip_prefix('@').unwrap_or(segment);
    (!segment.is_empty()).then_some(segment)
}
