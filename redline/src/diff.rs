//! The structural differ.
//!
//! Both inputs are parsed, flattened into sequences of block-level nodes,
//! and the sequences are aligned on their text. Aligned pairs are diffed
//! recursively: containers align their children again, leaf blocks get a
//! character diff of their text, and anything without a partner is wrapped
//! whole in `<ins>` or `<del>`.

use std::fmt::Write;

use facet::Facet;
use ratcliff::text::{Chunk, ChunkOp, diff_text};
use ratcliff::{OpTag, opcodes};

use crate::classify::{
    CELL_TAGS, extract_diffable_nodes, has_diffable_children, has_spanned_cells, is_structural,
    is_wrap_unsafe,
};
use crate::dom::{NodeRef, parse};
use crate::serialize::{SerializeOptions, escape_text, outer_html};
use crate::tracing_macros::{debug, trace};

/// Errors from the byte-level entry point.
#[derive(Facet, Debug)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum DiffError {
    /// old markup is not valid UTF-8 (valid up to byte {valid_up_to})
    OldNotUtf8 { valid_up_to: usize },

    /// new markup is not valid UTF-8 (valid up to byte {valid_up_to})
    NewNotUtf8 { valid_up_to: usize },
}

/// Marker element wrapped around changed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `<ins>`: present only in the new markup
    Ins,
    /// `<del>`: present only in the old markup
    Del,
}

impl Marker {
    /// Tag name of the marker element.
    pub fn tag(self) -> &'static str {
        match self {
            Marker::Ins => "ins",
            Marker::Del => "del",
        }
    }
}

/// How a pair of aligned nodes gets diffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStrategy {
    /// At least one side is a text run: character diff, no wrapping tag
    Text,
    /// Tag names differ: delete the old node and insert the new one whole
    Replace,
    /// New side is a table with merged cells: emit it as is, classes stripped
    SpannedTable,
    /// Containers: align the children
    Recurse,
    /// Blocks of the same tag: character diff of their text
    Leaf,
}

impl PairStrategy {
    /// Pick the strategy for an aligned pair.
    pub fn choose(old: NodeRef<'_>, new: NodeRef<'_>) -> Self {
        let (Some(old_tag), Some(new_tag)) = (old.tag(), new.tag()) else {
            return PairStrategy::Text;
        };
        if old_tag != new_tag {
            PairStrategy::Replace
        } else if new_tag == "table" && has_spanned_cells(new) {
            PairStrategy::SpannedTable
        } else if is_structural(old)
            || is_structural(new)
            || has_diffable_children(old)
            || has_diffable_children(new)
        {
            PairStrategy::Recurse
        } else {
            PairStrategy::Leaf
        }
    }
}

/// Diff two optional markup strings; a missing side counts as empty.
///
/// ```
/// assert_eq!(
///     redline::html_diff(Some("Groundhog Day!"), Some("Valentines Day!")),
///     "<del>Groundhog</del><ins>Valentines</ins> Day!"
/// );
/// assert_eq!(redline::html_diff(None, None), "");
/// ```
pub fn html_diff(old: Option<&str>, new: Option<&str>) -> String {
    diff(old.unwrap_or_default(), new.unwrap_or_default())
}

/// Diff two markup (or plain text) strings into one fragment with
/// `<ins>`/`<del>` markers.
///
/// - identical inputs come back unchanged
/// - when neither input starts with a tag, whitespace is normalized and the
///   texts are diffed directly
/// - otherwise both sides are parsed and diffed structurally; whitespace
///   between top-level blocks is not preserved
pub fn diff(old: &str, new: &str) -> String {
    if old == new {
        debug!("identical inputs");
        return old.to_string();
    }

    if !looks_like_markup(old) && !looks_like_markup(new) {
        debug!("plain text inputs");
        return diff_plain_text(old, new);
    }

    let old_doc = parse(old);
    let new_doc = parse(new);
    let old_nodes = extract_diffable_nodes(&old_doc);
    let new_nodes = extract_diffable_nodes(&new_doc);
    debug!(
        old_nodes = old_nodes.len(),
        new_nodes = new_nodes.len(),
        "structural diff"
    );

    let mut out = String::new();
    diff_node_lists(&old_nodes, &new_nodes, &mut out);
    out
}

/// [`diff`] over raw bytes, which must be UTF-8.
pub fn html_diff_bytes(old: &[u8], new: &[u8]) -> Result<String, DiffError> {
    let old = std::str::from_utf8(old).map_err(|e| DiffError::OldNotUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;
    let new = std::str::from_utf8(new).map_err(|e| DiffError::NewNotUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;
    Ok(diff(old, new))
}

/// Whether a diff result contains any change markers.
pub fn has_diff(markup: &str) -> bool {
    markup.contains("<ins>") || markup.contains("<del>")
}

fn looks_like_markup(input: &str) -> bool {
    input.trim().starts_with('<')
}

/// Collapse whitespace runs to one space and trim both ends.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn diff_plain_text(old: &str, new: &str) -> String {
    let old = normalize_whitespace(old);
    let new = normalize_whitespace(new);
    if old == new {
        return old;
    }

    let mut out = String::new();
    // plain text inputs are emitted as given, like the identical shortcut
    write_chunks(&diff_text(&old, &new), TextMode::Raw, &mut out);
    out
}

#[derive(Clone, Copy)]
enum TextMode {
    Raw,
    Escaped,
}

fn write_chunks(chunks: &[Chunk], mode: TextMode, out: &mut String) {
    for chunk in chunks {
        let text = match mode {
            TextMode::Raw => chunk.text.clone(),
            TextMode::Escaped => escape_text(&chunk.text),
        };
        let _ = match chunk.op {
            ChunkOp::Equal => write!(out, "{text}"),
            ChunkOp::Delete => write!(out, "<del>{text}</del>"),
            ChunkOp::Insert => write!(out, "<ins>{text}</ins>"),
        };
    }
}

/// Key a node is aligned on: its trimmed text runs, concatenated.
fn alignment_key(node: NodeRef<'_>) -> String {
    match node.text() {
        Some(text) => text.trim().to_string(),
        None => node.stripped_text(),
    }
}

/// Align two node sequences and diff them into `out`.
///
/// Mutually recursive with [`diff_pair`]: each level works on the children
/// of the level above, so the recursion ends at the leaves.
fn diff_node_lists(old: &[NodeRef<'_>], new: &[NodeRef<'_>], out: &mut String) {
    let old_keys: Vec<String> = old.iter().map(|&n| alignment_key(n)).collect();
    let new_keys: Vec<String> = new.iter().map(|&n| alignment_key(n)).collect();

    for op in opcodes(&old_keys, &new_keys) {
        trace!(tag = ?op.tag, a = ?op.a, b = ?op.b, "opcode");
        match op.tag {
            OpTag::Equal | OpTag::Replace => {
                // equal keys still go through diff_pair: markup can differ under equal text
                let paired = op.a.len().min(op.b.len());
                for (&o, &n) in old[op.a.clone()].iter().zip(&new[op.b.clone()]) {
                    diff_pair(o, n, out);
                }
                for &o in &old[op.a.start + paired..op.a.end] {
                    wrap_node(o, Marker::Del, out);
                }
                for &n in &new[op.b.start + paired..op.b.end] {
                    wrap_node(n, Marker::Ins, out);
                }
            }
            OpTag::Delete => {
                for &o in &old[op.a] {
                    wrap_node(o, Marker::Del, out);
                }
            }
            OpTag::Insert => {
                for &n in &new[op.b] {
                    wrap_node(n, Marker::Ins, out);
                }
            }
        }
    }
}

/// Diff one aligned pair into `out`.
fn diff_pair(old: NodeRef<'_>, new: NodeRef<'_>, out: &mut String) {
    let strategy = PairStrategy::choose(old, new);
    trace!(?strategy, old = ?old.tag(), new = ?new.tag(), "pair");

    match strategy {
        PairStrategy::Text => {
            let chunks = diff_text(&pair_text(old), &pair_text(new));
            write_chunks(&chunks, TextMode::Escaped, out);
        }
        PairStrategy::Replace => {
            wrap_node(old, Marker::Del, out);
            wrap_node(new, Marker::Ins, out);
        }
        PairStrategy::SpannedTable => {
            out.push_str(&outer_html(new, &SerializeOptions::new().strip_class()));
        }
        PairStrategy::Recurse => {
            let tag = new.tag().unwrap_or_default();
            let _ = write!(out, "<{tag}>");
            diff_node_lists(&significant_children(old), &significant_children(new), out);
            let _ = write!(out, "</{tag}>");
        }
        PairStrategy::Leaf => diff_leaf(old, new, out),
    }
}

/// Text of one side of a text pair; an element paired with a text run
/// contributes its text content.
fn pair_text(node: NodeRef<'_>) -> String {
    match node.text() {
        Some(text) => text.to_string(),
        None => node.text_content(),
    }
}

/// Children that take part in alignment: no blank text, no comments.
fn significant_children<'a>(node: NodeRef<'a>) -> Vec<NodeRef<'a>> {
    node.children()
        .filter(|child| !child.is_blank_text() && !child.is_comment())
        .collect()
}

/// Character diff of two same-tag blocks, wrapped in the new block's tag.
/// Inline formatting and link targets are not compared, only the text.
fn diff_leaf(old: NodeRef<'_>, new: NodeRef<'_>, out: &mut String) {
    let tag = new.tag().unwrap_or_default();
    let chunks = diff_text(&old.text_content(), &new.text_content());
    let _ = write!(out, "<{tag}>");
    write_chunks(&chunks, TextMode::Escaped, out);
    let _ = write!(out, "</{tag}>");
}

/// Wrap a whole node in a marker.
///
/// Rows, cells, table sections and list items keep their own tag outside and
/// get the marker inside; a row wraps each cell separately.
fn wrap_node(node: NodeRef<'_>, marker: Marker, out: &mut String) {
    let m = marker.tag();
    let Some(tag) = node.tag() else {
        let text = node.text().unwrap_or_default();
        let _ = write!(out, "<{m}>{}</{m}>", escape_text(text));
        return;
    };

    if !is_wrap_unsafe(tag) {
        let _ = write!(out, "<{m}>{}</{m}>", node.outer_html());
        return;
    }

    let _ = write!(out, "<{tag}>");
    if tag == "tr" {
        for child in node.children() {
            match child.tag() {
                Some(cell) if CELL_TAGS.contains(&cell) => {
                    let _ = write!(out, "<{cell}><{m}>{}</{m}></{cell}>", child.inner_html());
                }
                _ => out.push_str(&child.outer_html()),
            }
        }
    } else {
        let _ = write!(out, "<{m}>{}</{m}>", node.inner_html());
    }
    let _ = write!(out, "</{tag}>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn pair_of(old: &str, new: &str) -> PairStrategy {
        let old_doc = parse(old);
        let new_doc = parse(new);
        let o = old_doc.body_children().next().expect("old node");
        let n = new_doc.body_children().next().expect("new node");
        PairStrategy::choose(o, n)
    }

    #[test]
    fn test_pair_strategies() {
        assert_eq!(pair_of("text", "<p>x</p>"), PairStrategy::Text);
        assert_eq!(pair_of("<h3>x</h3>", "<h4>x</h4>"), PairStrategy::Replace);
        assert_eq!(pair_of("<p>x</p>", "<p>y</p>"), PairStrategy::Leaf);
        assert_eq!(pair_of("<ul><li>x</li></ul>", "<ul></ul>"), PairStrategy::Recurse);
        assert_eq!(
            pair_of("<div><p>x</p></div>", "<div>y</div>"),
            PairStrategy::Recurse
        );
        assert_eq!(
            pair_of(
                "<table><tr><td>a</td></tr></table>",
                r#"<table><tr><td rowspan="2">a</td></tr></table>"#
            ),
            PairStrategy::SpannedTable
        );
    }

    #[test]
    fn test_wrap_plain_block() {
        let doc = parse(r#"<p class="lead">Hello</p>"#);
        let mut out = String::new();
        wrap_node(doc.body_children().next().expect("p"), Marker::Ins, &mut out);
        assert_eq!(out, r#"<ins><p class="lead">Hello</p></ins>"#);
    }

    #[test]
    fn test_wrap_list_item_wraps_contents() {
        let doc = parse("<li>Item <em>one</em></li>");
        let mut out = String::new();
        wrap_node(doc.body_children().next().expect("li"), Marker::Del, &mut out);
        assert_eq!(out, "<li><del>Item <em>one</em></del></li>");
    }

    #[test]
    fn test_wrap_row_wraps_each_cell() {
        let doc = parse("<table><tr><td>a</td><th>b</th></tr></table>");
        let row = doc
            .body_children()
            .next()
            .and_then(|t| t.descendants().find(|n| n.tag() == Some("tr")))
            .expect("tr");
        let mut out = String::new();
        wrap_node(row, Marker::Ins, &mut out);
        assert_eq!(out, "<tr><td><ins>a</ins></td><th><ins>b</ins></th></tr>");
    }

    #[test]
    fn test_wrap_text_is_escaped() {
        let doc = parse("a &lt; b");
        let mut out = String::new();
        wrap_node(doc.body_children().next().expect("text"), Marker::Del, &mut out);
        assert_eq!(out, "<del>a &lt; b</del>");
    }

    #[test]
    fn test_alignment_key_trims_runs() {
        let doc = parse("<li>  Item\n<ul><li> nested </li></ul></li>");
        let li = doc.body_children().next().expect("li");
        assert_eq!(alignment_key(li), "Itemnested");
    }

    #[test]
    fn test_has_diff() {
        assert!(has_diff("a<ins>b</ins>"));
        assert!(has_diff("<del>a</del>"));
        assert!(!has_diff("<p>same</p>"));
    }

    #[test]
    fn test_bytes_entry_point() {
        assert_eq!(
            html_diff_bytes(b"Groundhog", b"Groundhog Day").ok().as_deref(),
            Some("Groundhog<ins> Day</ins>")
        );
        assert!(matches!(
            html_diff_bytes(b"ok", b"bad \xff"),
            Err(DiffError::NewNotUtf8 { valid_up_to: 4 })
        ));
        assert!(matches!(
            html_diff_bytes(b"\xc3", b"ok"),
            Err(DiffError::OldNotUtf8 { valid_up_to: 0 })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = DiffError::NewNotUtf8 { valid_up_to: 4 };
        assert_eq!(
            err.to_string(),
            "new markup is not valid UTF-8 (valid up to byte 4)"
        );
    }
}
