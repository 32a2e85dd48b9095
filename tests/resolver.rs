//! Author resolution tests against the timeline markup contract.

use quick_block::dom::Element;
use quick_block::{AuthorResolver, Document, HandleResolver, MarkupContract, TimelineMarkupV1};

fn resolver() -> HandleResolver<TimelineMarkupV1> {
    HandleResolver::new(TimelineMarkupV1)
}

fn article(doc: &Document) -> Element {
    doc.create_element("article").with_attr("data-testid", "tweet")
}

fn link(doc: &Document, href: &str) -> Element {
    doc.create_element("a").with_attr("href", href)
}

#[test]
fn test_first_profile_link_wins() {
    let doc = Document::new();
    let node = article(&doc)
        .with_child(link(&doc, "/Alice"))
        .with_child(link(&doc, "/bob"));

    let author = resolver().resolve(&node).unwrap();
    assert_eq!(author.canonical_username, "alice");
    assert_eq!(author.display_username, "Alice");
    assert_eq!(author.identity_hint, "alice");
}

#[test]
fn test_reserved_segments_are_skipped() {
    let doc = Document::new();
    let node = article(&doc)
        .with_child(link(&doc, "/i/web/status/1"))
        .with_child(link(&doc, "/status/2"))
        .with_child(link(&doc, "/"))
        .with_child(link(&doc, "/carol/status/3"));

    let author = resolver().resolve(&node).unwrap();
    assert_eq!(author.canonical_username, "carol");
}

#[test]
fn test_reserved_match_is_whole_segment() {
    let doc = Document::new();
    let node = article(&doc).with_child(link(&doc, "/status_updates"));
    assert_eq!(
        resolver().resolve(&node).unwrap().canonical_username,
        "status_updates"
    );

    let node = article(&doc).with_child(link(&doc, "/ivan"));
    assert_eq!(resolver().resolve(&node).unwrap().canonical_username, "ivan");
}

#[test]
fn test_external_and_missing_links_do_not_resolve() {
    let doc = Document::new();
    let node = article(&doc)
        .with_child(link(&doc, "https://example.com/dave"))
        .with_child(doc.create_element("a"))
        .with_child(doc.create_element("span").with_attr("href", "/notalink"));
    assert!(resolver().resolve(&node).is_none());

    let empty = article(&doc);
    assert!(resolver().resolve(&empty).is_none());
}

#[test]
fn test_identity_hint_comes_from_author_block() {
    let doc = Document::new();
    let block = doc
        .create_element("div")
        .with_attr("data-testid", "User-Name")
        .with_child(link(&doc, "/RealErin?src=hover"));
    let node = article(&doc)
        .with_child(link(&doc, "/Erin/status/9"))
        .with_child(block);

    let author = resolver().resolve(&node).unwrap();
    assert_eq!(author.canonical_username, "erin");
    assert_eq!(author.identity_hint, "RealErin");
    assert_eq!(resolver().control_anchor(&node).unwrap().attr("data-testid").as_deref(), Some("User-Name"));
}

#[test]
fn test_qualifies_only_timeline_articles() {
    let doc = Document::new();
    let r = resolver();
    assert!(r.qualifies(&article(&doc)));
    assert!(!r.qualifies(&doc.create_element("article")));
    assert!(!r.qualifies(&doc.create_element("div").with_attr("data-testid", "tweet")));
    assert_eq!(r.markup().version(), "timeline-v1");
}

/// A later markup revision: posts are `<li data-kind="post">`, the author
/// block is marked by `data-author`, and `hashtag` is reserved.
struct ListMarkup;

impl MarkupContract for ListMarkup {
    fn version(&self) -> &'static str {
        "list-v2"
    }

    fn is_content_node(&self, el: &Element) -> bool {
        el.tag() == "li" && el.attr("data-kind").as_deref() == Some("post")
    }

    fn is_author_block(&self, el: &Element) -> bool {
        el.attr("data-author").is_some()
    }

    fn is_profile_link(&self, el: &Element) -> bool {
        el.tag() == "a" && el.attr("href").is_some_and(|h| h.starts_with('/'))
    }

    fn reserved_segments(&self) -> &[&'static str] {
        &["hashtag", "status", "i"]
    }
}

#[test]
fn test_markup_revision_is_a_strategy_swap() {
    let doc = Document::new();
    let node = doc
        .create_element("li")
        .with_attr("data-kind", "post")
        .with_child(link(&doc, "/hashtag/rust"))
        .with_child(
            doc.create_element("span")
                .with_attr("data-author", "")
                .with_child(link(&doc, "/frank")),
        );

    let v2 = HandleResolver::new(ListMarkup);
    assert!(v2.qualifies(&node));
    assert_eq!(v2.resolve(&node).unwrap().canonical_username, "frank");

    // The old contract neither qualifies the node nor skips `hashtag`.
    assert!(!resolver().qualifies(&node));
    assert_eq!(resolver().resolve(&node).unwrap().canonical_username, "hashtag");
}
