//! HTML serializer for arena nodes.
//!
//! Follows the HTML5 serialization rules the differ relies on:
//!
//! - Void elements never get end tags
//! - Text content escapes `&`, `<` and `>`
//! - Attribute values are escaped and double-quoted
//! - Raw text elements (script, style) are not escaped
//! - RCDATA elements (title, textarea) escape only `&` and `<`
//! - Foreign content (SVG/MathML) uses self-closing syntax when empty

use std::fmt::Write;

use crate::dom::{Namespace, NodeKind, NodeRef};

/// Options for HTML serialization.
#[derive(Clone, Debug, Default)]
pub struct SerializeOptions {
    /// Omit `class` attributes on the node and all its descendants
    /// (default: false).
    pub strip_class: bool,
}

impl SerializeOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every `class` attribute from the output.
    pub fn strip_class(mut self) -> Self {
        self.strip_class = true;
        self
    }
}

/// Serialize a node including its own tags.
pub fn outer_html(node: NodeRef<'_>, opts: &SerializeOptions) -> String {
    let mut out = String::new();
    Serializer::new(&mut out, opts).write_node(node);
    out
}

/// Serialize the children of a node.
pub fn inner_html(node: NodeRef<'_>, opts: &SerializeOptions) -> String {
    let mut out = String::new();
    let mut ser = Serializer::new(&mut out, opts);
    for child in node.children() {
        ser.write_node(child);
    }
    out
}

/// Escape text for use as HTML element content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    Serializer::new(&mut out, &SerializeOptions::default()).write_text_escaped(text);
    out
}

/// HTML5 void elements - these never have end tags.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Raw text elements - content is not escaped.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// RCDATA elements - only `&` and `<` are escaped.
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

struct Serializer<'a, W: Write> {
    out: &'a mut W,
    options: &'a SerializeOptions,
}

impl<'a, W: Write> Serializer<'a, W> {
    fn new(out: &'a mut W, options: &'a SerializeOptions) -> Self {
        Self { out, options }
    }

    fn write_text_escaped(&mut self, text: &str) {
        for c in text.chars() {
            let _ = match c {
                '&' => self.out.write_str("&amp;"),
                '<' => self.out.write_str("&lt;"),
                '>' => self.out.write_str("&gt;"),
                _ => self.out.write_char(c),
            };
        }
    }

    fn write_rcdata_escaped(&mut self, text: &str) {
        for c in text.chars() {
            let _ = match c {
                '&' => self.out.write_str("&amp;"),
                '<' => self.out.write_str("&lt;"),
                _ => self.out.write_char(c),
            };
        }
    }

    fn write_attr(&mut self, name: &str, value: &str) {
        let _ = write!(self.out, " {name}=\"");
        for c in value.chars() {
            let _ = match c {
                '&' => self.out.write_str("&amp;"),
                '"' => self.out.write_str("&quot;"),
                '<' => self.out.write_str("&lt;"),
                '>' => self.out.write_str("&gt;"),
                _ => self.out.write_char(c),
            };
        }
        let _ = self.out.write_char('"');
    }

    fn write_node(&mut self, node: NodeRef<'_>) {
        match &node.data().kind {
            NodeKind::Document => {
                for child in node.children() {
                    self.write_node(child);
                }
            }
            NodeKind::Element(_) => self.write_element(node),
            NodeKind::Text(text) => self.write_text_escaped(text),
            NodeKind::Comment(text) => {
                let _ = write!(self.out, "<!--{text}-->");
            }
        }
    }

    fn write_element(&mut self, node: NodeRef<'_>) {
        let Some(elem) = node.element() else {
            return;
        };
        let tag: &str = &elem.tag;

        let _ = write!(self.out, "<{tag}");
        for (name, value) in &elem.attrs {
            if self.options.strip_class && name == "class" {
                continue;
            }
            self.write_attr(name, value);
        }

        if is_void_element(tag) {
            let _ = self.out.write_char('>');
            return;
        }

        let mut children = node.children().peekable();
        if node.data().ns != Namespace::Html && children.peek().is_none() {
            let _ = self.out.write_str("/>");
            return;
        }
        let _ = self.out.write_char('>');

        if RAW_TEXT_ELEMENTS.contains(&tag) || RCDATA_ELEMENTS.contains(&tag) {
            let raw = RAW_TEXT_ELEMENTS.contains(&tag);
            for child in children {
                if let Some(text) = child.text() {
                    if raw {
                        let _ = self.out.write_str(text);
                    } else {
                        self.write_rcdata_escaped(text);
                    }
                }
            }
        } else {
            for child in children {
                self.write_node(child);
            }
        }

        let _ = write!(self.out, "</{tag}>");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;
    use facet_testhelpers::test;

    #[test]
    fn test_void_elements() {
        let doc = parse(r#"<p>a<br>b<img src="x.png"></p>"#);
        assert_eq!(doc.to_html(), r#"<p>a<br>b<img src="x.png"></p>"#);
    }

    #[test]
    fn test_text_escaping() {
        let doc = parse("<div>&lt;script&gt; &amp; \"quotes\"</div>");
        assert_eq!(doc.to_html(), "<div>&lt;script&gt; &amp; \"quotes\"</div>");
        assert_eq!(escape_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn test_attribute_escaping() {
        let doc = parse(r#"<a href='x?a=1&amp;b="2"'>link</a>"#);
        assert_eq!(
            doc.to_html(),
            r#"<a href="x?a=1&amp;b=&quot;2&quot;">link</a>"#
        );
    }

    #[test]
    fn test_single_quoted_attributes_come_out_double_quoted() {
        let doc = parse("<p>This links to <a href='https://groundhog-day.com'>a site</a>.</p>");
        assert_eq!(
            doc.to_html(),
            r#"<p>This links to <a href="https://groundhog-day.com">a site</a>.</p>"#
        );
    }

    #[test]
    fn test_raw_text_elements() {
        let doc = parse("<div><script>if (a < b && c) {}</script><style>p > a {}</style></div>");
        assert_eq!(
            doc.to_html(),
            "<div><script>if (a < b && c) {}</script><style>p > a {}</style></div>"
        );
    }

    #[test]
    fn test_rcdata_elements() {
        let doc = parse("<textarea>a < b > c</textarea>");
        assert_eq!(doc.to_html(), "<textarea>a &lt; b > c</textarea>");
    }

    #[test]
    fn test_foreign_content_self_closing() {
        let doc = parse(r#"<svg><circle r="1"></circle></svg>"#);
        assert_eq!(doc.to_html(), r#"<svg><circle r="1"/></svg>"#);
    }

    #[test]
    fn test_comment_serialization() {
        let doc = parse("<div><!-- note --></div>");
        assert_eq!(doc.to_html(), "<div><!-- note --></div>");
    }

    #[test]
    fn test_strip_class_applies_to_descendants() {
        let doc = parse(
            r#"<table class="table--small"><tbody><tr class="row"><td class="c" id="k">x</td></tr></tbody></table>"#,
        );
        let table = doc.body_children().next().expect("table");
        assert_eq!(
            outer_html(table, &SerializeOptions::new().strip_class()),
            r#"<table><tbody><tr><td id="k">x</td></tr></tbody></table>"#
        );
        // the tree itself is untouched
        assert!(table.outer_html().contains(r#"class="table--small""#));
    }

    #[test]
    fn test_inner_and_outer_html() {
        let doc = parse("<li>Item <em>one</em></li>");
        let li = doc.body_children().next().expect("li");
        assert_eq!(li.outer_html(), "<li>Item <em>one</em></li>");
        assert_eq!(li.inner_html(), "Item <em>one</em>");
    }
}
