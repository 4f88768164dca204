//! Tag tables and node classification.
//!
//! Three fixed sets drive the differ:
//!
//! - **structural** tags are containers whose children get aligned one by one
//! - **leaf** tags are blocks whose text gets diffed character by character
//! - **wrap-unsafe** tags may not receive an `<ins>`/`<del>` as a direct
//!   child or parent without the browser reshuffling the table or list, so
//!   their contents are wrapped instead

use crate::dom::{Document, NodeRef};

/// Containers diffed by aligning their children.
pub const STRUCTURAL_TAGS: &[&str] = &["table", "thead", "tbody", "tr", "ul", "ol"];

/// Blocks diffed as text.
pub const LEAF_TAGS: &[&str] = &[
    "p", "li", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6", "div",
];

/// Tags whose contents, not the tag itself, get wrapped in a marker.
pub const WRAP_UNSAFE_TAGS: &[&str] = &["li", "td", "th", "tr", "thead", "tbody"];

/// Table cells, the only tags that can span rows or columns.
pub const CELL_TAGS: &[&str] = &["td", "th"];

/// Role of a tag in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    /// Table, table section, row or list
    Structural,
    /// Paragraph, list item, cell, heading or generic block
    Leaf,
    /// Everything else (formatting, links, unknown tags)
    Inline,
}

impl TagClass {
    /// Classify a tag name.
    pub fn of(tag: &str) -> Self {
        if STRUCTURAL_TAGS.contains(&tag) {
            TagClass::Structural
        } else if LEAF_TAGS.contains(&tag) {
            TagClass::Leaf
        } else {
            TagClass::Inline
        }
    }

    /// Class of a node; text and comments are inline.
    pub fn of_node(node: NodeRef<'_>) -> Self {
        node.tag().map_or(TagClass::Inline, TagClass::of)
    }
}

/// Whether wrapping this tag in `<ins>`/`<del>` would break the markup.
pub fn is_wrap_unsafe(tag: &str) -> bool {
    WRAP_UNSAFE_TAGS.contains(&tag)
}

/// Structural for alignment purposes: the node itself or one of its direct
/// children is a structural tag. A `<div>` holding a table counts.
pub fn is_structural(node: NodeRef<'_>) -> bool {
    TagClass::of_node(node) == TagClass::Structural
        || node
            .children()
            .any(|child| TagClass::of_node(child) == TagClass::Structural)
}

/// Whether any direct child is a leaf tag.
pub fn has_diffable_children(node: NodeRef<'_>) -> bool {
    node.children()
        .any(|child| TagClass::of_node(child) == TagClass::Leaf)
}

/// Whether a table contains a cell spanning more than one row or column.
pub fn has_spanned_cells(table: NodeRef<'_>) -> bool {
    table.descendants().any(|node| {
        node.tag().is_some_and(|tag| CELL_TAGS.contains(&tag))
            && ["colspan", "rowspan"]
                .iter()
                .any(|name| node.attr(name).is_some_and(|value| value != "1"))
    })
}

/// Flatten a parsed document into the sequence of nodes to align.
///
/// Walks the body depth-first. Structural and leaf elements are taken whole
/// (their subtrees are not walked), other elements are looked through.
/// Non-blank text directly in the body is kept as an item of its own; text
/// nested in inline wrappers and comments are skipped.
pub fn extract_diffable_nodes(doc: &Document) -> Vec<NodeRef<'_>> {
    let mut out = Vec::new();
    for top in doc.body_children() {
        if top.text().is_some() {
            if !top.is_blank_text() {
                out.push(top);
            }
            continue;
        }
        walk(top, &mut out);
    }
    out
}

fn walk<'a>(node: NodeRef<'a>, out: &mut Vec<NodeRef<'a>>) {
    if !node.is_element() {
        return;
    }
    match TagClass::of_node(node) {
        TagClass::Structural | TagClass::Leaf => out.push(node),
        TagClass::Inline => {
            for child in node.children() {
                walk(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;
    use facet_testhelpers::test;

    fn tags<'a>(nodes: &[NodeRef<'a>]) -> Vec<&'a str> {
        nodes.iter().map(|n| n.tag().unwrap_or("#text")).collect()
    }

    #[test]
    fn test_tag_classes() {
        assert_eq!(TagClass::of("table"), TagClass::Structural);
        assert_eq!(TagClass::of("ol"), TagClass::Structural);
        assert_eq!(TagClass::of("h6"), TagClass::Leaf);
        assert_eq!(TagClass::of("div"), TagClass::Leaf);
        assert_eq!(TagClass::of("strong"), TagClass::Inline);
        assert_eq!(TagClass::of("section"), TagClass::Inline);
        assert!(is_wrap_unsafe("tr"));
        assert!(!is_wrap_unsafe("table"));
        assert!(!is_wrap_unsafe("p"));
    }

    #[test]
    fn test_extract_takes_blocks_whole() {
        let doc = parse("<p>one</p>\n<ul><li>a</li><li>b</li></ul>\n<h2>two</h2>");
        let nodes = extract_diffable_nodes(&doc);
        assert_eq!(tags(&nodes), vec!["p", "ul", "h2"]);
    }

    #[test]
    fn test_extract_looks_through_inline_wrappers() {
        let doc = parse("<section><article><p>inner</p><span>skipped</span></article></section>");
        let nodes = extract_diffable_nodes(&doc);
        assert_eq!(tags(&nodes), vec!["p"]);
    }

    #[test]
    fn test_extract_keeps_top_level_text() {
        let doc = parse("Intro text <p>para</p>\n  ");
        let nodes = extract_diffable_nodes(&doc);
        assert_eq!(tags(&nodes), vec!["#text", "p"]);
        assert_eq!(nodes[0].text(), Some("Intro text "));
    }

    #[test]
    fn test_extract_empty_document() {
        let doc = parse("");
        assert!(extract_diffable_nodes(&doc).is_empty());
        let doc = parse("<!-- only a comment -->");
        assert!(extract_diffable_nodes(&doc).is_empty());
    }

    #[test]
    fn test_structural_by_child() {
        let doc = parse("<div><table><tr><td>x</td></tr></table></div><div><p>y</p></div>");
        let divs: Vec<_> = doc.body_children().collect();
        assert!(is_structural(divs[0]));
        assert!(!is_structural(divs[1]));
        assert!(has_diffable_children(divs[1]));
        assert!(!has_diffable_children(divs[0]));
    }

    #[test]
    fn test_spanned_cells() {
        let doc = parse(
            r#"<table><tr><td colspan="2">a</td></tr></table><table><tr><td colspan="1" rowspan="1">b</td></tr></table>"#,
        );
        let tables: Vec<_> = doc.body_children().collect();
        assert!(has_spanned_cells(tables[0]));
        assert!(!has_spanned_cells(tables[1]));
    }
}
