//! Arena-based markup tree built by html5ever.
//!
//! - **indextree Arena**: all nodes in contiguous memory, addressed by `NodeId`
//! - **Refcounted strings**: text and attribute values are `StrTendril`s that
//!   share the source buffer
//! - **Read-only handles**: the differ walks the tree through [`NodeRef`]
//!   and never mutates a parsed document

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, QualName, parse_document};
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use std::borrow::Cow;
use std::cell::RefCell;

use crate::serialize::{SerializeOptions, inner_html, outer_html};
use crate::tracing_macros::trace;

/// A parsed document: every node lives in the arena.
#[derive(Debug, Clone)]
pub struct Document {
    /// All nodes
    pub arena: Arena<NodeData>,

    /// Root node (usually `<html>`)
    pub root: NodeId,

    /// DOCTYPE if present (usually "html")
    pub doctype: Option<StrTendril>,
}

impl Document {
    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Read-only handle to a node.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// Get the `<body>` element if present
    pub fn body(&self) -> Option<NodeId> {
        self.root
            .children(&self.arena)
            .find(|&id| self.node(id).tag() == Some("body"))
    }

    /// Children of `<body>`, i.e. the content of the parsed fragment.
    pub fn body_children(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.body()
            .into_iter()
            .flat_map(move |body| self.node(body).children())
    }

    /// Remove a node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        id.detach(&mut self.arena);
    }

    /// Serialize the body content (no doctype, no `<html>`/`<body>` wrappers).
    pub fn to_html(&self) -> String {
        self.body()
            .map(|body| inner_html(self.node(body), &SerializeOptions::default()))
            .unwrap_or_default()
    }
}

/// What goes in each arena slot
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Node kind and payload
    pub kind: NodeKind,
    /// Namespace the node was created in
    pub ns: Namespace,
}

/// Node types
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// Element with tag and attributes
    Element(ElementData),
    /// Text content
    Text(StrTendril),
    /// HTML comment
    Comment(StrTendril),
}

/// Element data (tag + attributes)
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercase local name
    pub tag: StrTendril,

    /// Attributes in source order, first occurrence wins
    pub attrs: IndexMap<String, StrTendril>,
}

/// XML namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// HTML namespace
    Html,
    /// Inline `<svg>` content
    Svg,
    /// Inline `<math>` content
    MathMl,
}

impl Namespace {
    /// Map a namespace URL to a known namespace, defaulting to HTML.
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html,
        }
    }

    /// The namespace URL.
    pub fn url(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

/// Read-only handle to a node of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    /// Arena id of the node.
    pub fn id(self) -> NodeId {
        self.id
    }

    /// The document this node belongs to.
    pub fn document(self) -> &'a Document {
        self.doc
    }

    /// Node payload.
    pub fn data(self) -> &'a NodeData {
        self.doc.get(self.id)
    }

    /// Element payload, `None` for text, comments and the document node.
    pub fn element(self) -> Option<&'a ElementData> {
        match &self.data().kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    /// Tag name, `None` unless this is an element.
    pub fn tag(self) -> Option<&'a str> {
        self.element().map(|elem| elem.tag.as_ref())
    }

    /// Is this an element?
    pub fn is_element(self) -> bool {
        self.element().is_some()
    }

    /// Content of a text node, `None` for anything else.
    pub fn text(self) -> Option<&'a str> {
        match &self.data().kind {
            NodeKind::Text(text) => Some(text.as_ref()),
            _ => None,
        }
    }

    /// Is this a comment?
    pub fn is_comment(self) -> bool {
        matches!(self.data().kind, NodeKind::Comment(_))
    }

    /// Attribute value by name.
    pub fn attr(self, name: &str) -> Option<&'a str> {
        self.element()?.attrs.get(name).map(|value| value.as_ref())
    }

    /// Direct children, in order.
    pub fn children(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        self.id
            .children(&doc.arena)
            .map(move |id| NodeRef { doc, id })
    }

    /// All descendants in document order, excluding the node itself.
    pub fn descendants(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        self.id
            .descendants(&doc.arena)
            .skip(1)
            .map(move |id| NodeRef { doc, id })
    }

    /// Text runs of the subtree: the node itself when it is text, otherwise
    /// every descendant text node. Comments are not text.
    fn text_runs(self) -> impl Iterator<Item = &'a str> + 'a {
        let doc = self.doc;
        self.id
            .descendants(&doc.arena)
            .filter_map(move |id| doc.node(id).text())
    }

    /// All text of the subtree concatenated, formatting tags ignored.
    pub fn text_content(self) -> String {
        self.text_runs().collect()
    }

    /// Each text run trimmed, empty runs dropped, the rest concatenated.
    ///
    /// `<p> Sentence <em>one</em>\n</p>` gives `"Sentenceone"`. Only useful
    /// as a comparison key.
    pub fn stripped_text(self) -> String {
        self.text_runs()
            .map(str::trim)
            .filter(|run| !run.is_empty())
            .collect()
    }

    /// Is this a text node holding only whitespace?
    pub fn is_blank_text(self) -> bool {
        self.text().is_some_and(|text| text.trim().is_empty())
    }

    /// Serialized node including its own tags.
    pub fn outer_html(self) -> String {
        outer_html(self, &SerializeOptions::default())
    }

    /// Serialized children.
    pub fn inner_html(self) -> String {
        inner_html(self, &SerializeOptions::default())
    }
}

/// Parse markup into an arena-based [`Document`].
///
/// Parsing never fails: html5ever recovers from any malformed input the way
/// a browser would. Fragments end up inside the implied `<body>`.
pub fn parse(html: &str) -> Document {
    let sink = ArenaSink::new();
    let doc = parse_document(sink, Default::default()).one(StrTendril::from(html));
    trace!(nodes = doc.arena.count(), "parsed");
    doc
}

/// Owned element name wrapper
#[derive(Debug, Clone)]
struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// TreeSink building the arena; html5ever drives it through `&self`.
struct ArenaSink {
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,

    doctype: RefCell<Option<StrTendril>>,
}

impl ArenaSink {
    fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });

        ArenaSink {
            arena: RefCell::new(arena),
            document,
            doctype: RefCell::new(None),
        }
    }

    fn new_node(&self, kind: NodeKind, ns: Namespace) -> NodeId {
        self.arena.borrow_mut().new_node(NodeData { kind, ns })
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = Document;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let arena = self.arena.into_inner();

        // the root element, usually <html>
        let root = self
            .document
            .children(&arena)
            .find(|&id| matches!(arena[id].get().kind, NodeKind::Element(_)))
            .unwrap_or(self.document);

        Document {
            arena,
            root,
            doctype: self.doctype.into_inner(),
        }
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers on its own
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        let node = arena[*target].get();

        let (ns, local) = match &node.kind {
            NodeKind::Element(elem) => (node.ns, LocalName::from(elem.tag.as_ref())),
            _ => (Namespace::Html, LocalName::from("")),
        };

        OwnedElemName(QualName {
            prefix: None,
            ns: html5ever::Namespace::from(ns.url()),
            local,
        })
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let tag = StrTendril::from(name.local.as_ref());
        let ns = Namespace::from_url(name.ns.as_ref());

        let mut attr_map = IndexMap::with_capacity(attrs.len());
        for attr in attrs {
            attr_map
                .entry(attr.name.local.to_string())
                .or_insert(attr.value);
        }

        self.new_node(
            NodeKind::Element(ElementData {
                tag,
                attrs: attr_map,
            }),
            ns,
        )
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.new_node(NodeKind::Comment(text), Namespace::Html)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // processing instructions only occur in XML; keep an empty comment
        self.new_node(NodeKind::Comment(StrTendril::new()), Namespace::Html)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // adjacent text merges into one node, like a browser DOM
                let last_child = parent.children(&arena).next_back();
                if let Some(last) = last_child
                    && let NodeKind::Text(existing) = &mut arena[last].get_mut().kind
                {
                    existing.push_tendril(&text);
                    return;
                }

                let text_node = arena.new_node(NodeData {
                    kind: NodeKind::Text(text),
                    ns: Namespace::Html,
                });
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => arena.new_node(NodeData {
                kind: NodeKind::Text(text),
                ns: Namespace::Html,
            }),
        };
        sibling.insert_before(node, &mut arena);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        // foster parenting: go before the table if it is still attached
        let attached = self.arena.borrow()[*element].parent().is_some();
        if attached {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        *self.doctype.borrow_mut() = Some(name);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // template content stays inline under the <template> element
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Element(elem) = &mut arena[*target].get_mut().kind {
            for attr in attrs {
                elem.attrs
                    .entry(attr.name.local.to_string())
                    .or_insert(attr.value);
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&arena).collect();
        for child in children {
            child.detach(&mut arena);
            new_parent.append(child, &mut arena);
        }
    }
}
