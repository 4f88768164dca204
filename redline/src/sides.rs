//! One-sided views of a diff, for side-by-side display.
//!
//! The old side drops every `<ins>` (keeping `<del>` so removals stay
//! highlighted), the new side drops every `<del>`. Blocks left without any
//! text are removed afterwards so the views don't show empty bullets.

use indextree::NodeId;

use crate::diff::Marker;
use crate::dom::{Document, NodeRef, parse};
use crate::tracing_macros::trace;

/// The diff as the old document: insertions removed.
pub fn old_side(diff_markup: &str) -> String {
    one_side(diff_markup, Marker::Ins)
}

/// The diff as the new document: deletions removed.
pub fn new_side(diff_markup: &str) -> String {
    one_side(diff_markup, Marker::Del)
}

fn one_side(diff_markup: &str, drop: Marker) -> String {
    let mut doc = parse(diff_markup);
    let Some(body) = doc.body() else {
        return String::new();
    };

    let markers = collect(&doc, body, |n| n.tag() == Some(drop.tag()));
    trace!(marker = drop.tag(), count = markers.len(), "dropping markers");
    for id in markers {
        doc.detach(id);
    }

    remove_empty_blocks(&mut doc, body);
    doc.to_html()
}

fn collect(doc: &Document, body: NodeId, pred: impl Fn(NodeRef<'_>) -> bool) -> Vec<NodeId> {
    doc.node(body)
        .descendants()
        .filter(|&n| pred(n))
        .map(NodeRef::id)
        .collect()
}

fn is_blank(node: NodeRef<'_>) -> bool {
    node.text_content().trim().is_empty()
}

/// Remove top-level elements without text (except `br`, `hr` and anything
/// holding an image), then every `p` and `li` without text or a direct image.
fn remove_empty_blocks(doc: &mut Document, body: NodeId) {
    let top_level: Vec<NodeId> = doc
        .node(body)
        .children()
        .filter(|&n| {
            n.tag().is_some_and(|tag| tag != "br" && tag != "hr")
                && is_blank(n)
                && !n.descendants().any(|d| d.tag() == Some("img"))
        })
        .map(NodeRef::id)
        .collect();
    for id in top_level {
        doc.detach(id);
    }

    let blocks = collect(doc, body, |n| {
        matches!(n.tag(), Some("p" | "li"))
            && is_blank(n)
            && !n.children().any(|c| c.tag() == Some("img"))
    });
    for id in blocks {
        doc.detach(id);
    }
}
