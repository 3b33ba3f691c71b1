//! Node arena for the domforge HTML parser.
//!
//! This crate provides the flat, creation-ordered node store that the tree
//! builder fills and that the serializer and selector engine read.
//!
//! # Design
//!
//! All parent/child/sibling relationships are [`NodeId`] indices into one
//! contiguous vector, providing O(1) access and traversal without borrow
//! checker issues. Indices are assigned once, at creation, and are never
//! reused or reordered, so an element's index together with its recorded
//! close bound describes the contiguous index range of its descendants.

use strum_macros::Display;

/// A type-safe index into the node arena.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// `NodeId` provides O(1) access to any node in the tree without borrowing
/// issues. The index doubles as the document-order key: node A precedes
/// node B in the source exactly when `A.0 < B.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The synthetic root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// The kind of content a node represents.
///
/// Unlike the DOM standard's node types this set reflects what a *lenient*
/// parser can encounter: malformed constructs degrade to [`Text`],
/// unrecognized `<!…>` markup becomes [`Unknown`], and an end tag that
/// matches no open ancestor is preserved verbatim as [`OrphanEndTag`].
///
/// [`Text`]: NodeType::Text
/// [`Unknown`]: NodeType::Unknown
/// [`OrphanEndTag`]: NodeType::OrphanEndTag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NodeType {
    /// An element with a tag name and attributes.
    Element,
    /// A `<!-- … -->` comment, stored verbatim.
    Comment,
    /// A run of character data (also the fallback for degraded markup).
    Text,
    /// A closing tag that matched no open ancestor, kept as literal text.
    OrphanEndTag,
    /// The synthetic document root; owns no tag markup of its own.
    Root,
    /// `<!…>` markup that is neither a comment nor a valid tag (e.g. a
    /// DOCTYPE), stored verbatim.
    Unknown,
}

/// Quoting used around an attribute value in the source markup.
///
/// Recorded per attribute so serialization can reproduce the original
/// bytes; programmatically added attributes default to double quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum QuoteStyle {
    /// `name="value"`
    #[default]
    Double,
    /// `name='value'`
    Single,
    /// `name=value` (or a bare boolean attribute).
    None,
}

/// Whitespace captured around one attribute.
///
/// [§ 13.1.2.3 Attributes](https://html.spec.whatwg.org/multipage/syntax.html#attributes-2)
/// permits arbitrary space before the name and around `=`; all three runs
/// are preserved so unmodified attributes serialize byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSpacing {
    /// Whitespace between the previous token and the attribute name.
    pub before: String,
    /// Whitespace between the name and `=`.
    pub before_eq: String,
    /// Whitespace between `=` and the value.
    pub after_eq: String,
}

impl Default for AttrSpacing {
    fn default() -> Self {
        AttrSpacing {
            before: " ".to_string(),
            before_eq: String::new(),
            after_eq: String::new(),
        }
    }
}

/// An attribute value.
///
/// HTML distinguishes `name="value"` from the bare form (`checked`,
/// `disabled`, …); on top of that, a caller may set a boolean attribute to
/// `false`, which keeps the entry but suppresses it at serialization time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// A string value.
    Text(String),
    /// A boolean marker: `true` = present without a value, `false` =
    /// present in the attribute list but omitted from output.
    Flag(bool),
}

impl AttrValue {
    /// The string value, if this is a text attribute.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s.as_str()),
            AttrValue::Flag(_) => None,
        }
    }

    /// True for `Flag(true)` and for any text value; false only for a
    /// suppressed boolean attribute.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, AttrValue::Flag(false))
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

/// One attribute: name, value, and the formatting metadata needed to
/// reproduce it exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name as stored (case-normalized at parse time when the
    /// configuration asks for it).
    pub name: String,
    /// The value (string or boolean marker).
    pub value: AttrValue,
    /// Quoting seen in the source.
    pub quote: QuoteStyle,
    /// Whitespace seen around the attribute.
    pub spacing: AttrSpacing,
}

impl Attribute {
    /// Build an attribute with default (programmatic) formatting: one
    /// leading space, no space around `=`, double quotes for text values
    /// and the bare form for flags.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        let value = value.into();
        let quote = match value {
            AttrValue::Flag(_) => QuoteStyle::None,
            AttrValue::Text(_) => QuoteStyle::Double,
        };
        Attribute {
            name: name.into(),
            value,
            quote,
            spacing: AttrSpacing::default(),
        }
    }
}

/// One entry in the arena.
///
/// A node keeps everything needed to re-emit its slice of the original
/// markup: the verbatim text for non-element nodes, and for elements the
/// attribute list with formatting metadata, the trailing characters before
/// `>` (`end_space`, e.g. the `/` of self-closing syntax), and the
/// begin/end bookkeeping described on each field.
#[derive(Debug, Clone)]
pub struct Node {
    /// What kind of node this is.
    pub node_type: NodeType,
    /// Tag name (`"text"`, `"comment"`, `"unknown"`, `"root"` for
    /// non-element nodes, mirroring how they were produced).
    pub tag: String,
    /// Ordered attribute list; insertion order affects serialization.
    pub attributes: Vec<Attribute>,
    /// Parent index; `None` for the root (and for detached nodes).
    pub parent: Option<NodeId>,
    /// Element-typed direct children, in document order.
    pub children: Vec<NodeId>,
    /// ALL direct children (element, text, comment, unknown), in order.
    pub nodes: Vec<NodeId>,
    /// Arena index of the node that owns this element's opening-tag markup
    /// (always itself for parsed elements); `None` for the root and for
    /// programmatically built nodes.
    pub begin: Option<NodeId>,
    /// Close bookkeeping: `None` = no close recorded (synthesize one for a
    /// programmatic non-void element), `Some(0)` = no closing tag is ever
    /// emitted, `Some(n)` = the cursor value when the matching close was
    /// found, which is also the exclusive upper bound of this element's
    /// descendant index range.
    pub end: Option<usize>,
    /// Verbatim captured markup for Text/Comment/Unknown/orphan nodes.
    pub text: Option<String>,
    /// Explicit inner-markup override; bypasses `nodes` when present.
    pub inner: Option<String>,
    /// Explicit outer-markup override; bypasses everything when present.
    pub outer: Option<String>,
    /// Characters captured between the last attribute and `>`.
    pub end_space: String,
    /// Byte offset of this tag's `<` in the (noise-extracted) buffer.
    pub tag_start: usize,
}

impl Node {
    /// A detached node of the given type and tag with no content.
    #[must_use]
    pub fn new(node_type: NodeType, tag: impl Into<String>) -> Self {
        Node {
            node_type,
            tag: tag.into(),
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
            nodes: Vec::new(),
            begin: None,
            end: None,
            text: None,
            inner: None,
            outer: None,
            end_space: String::new(),
            tag_start: 0,
        }
    }

    /// Whether this is an element node.
    #[must_use]
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Whether this is a text node (degraded markup included).
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Whether this is a comment node.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.node_type == NodeType::Comment
    }

    /// Whether the element was written with self-closing syntax (a `/`
    /// before the closing `>`).
    #[must_use]
    pub fn is_self_closing(&self) -> bool {
        self.end_space.contains('/')
    }

    /// Whether the tag name carries a namespace prefix (`fbt:param`).
    #[must_use]
    pub fn is_namespaced(&self) -> bool {
        self.tag.contains(':')
    }

    /// Look up an attribute entry by exact name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// The attribute's value, if present.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attribute(name).map(|a| &a.value)
    }

    /// The attribute's string value, if present and not a boolean marker.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.get_attribute(name).and_then(AttrValue::as_str)
    }

    /// Whether the attribute exists in the list (a suppressed boolean
    /// attribute still counts as present).
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Set an attribute. An existing entry keeps its captured spacing and
    /// quoting so unrelated formatting survives the edit; a new entry gets
    /// programmatic defaults and lands at the end of the list.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<AttrValue>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
                quote: QuoteStyle::Double,
                spacing: AttrSpacing::default(),
            }),
        }
    }

    /// Remove an attribute entirely, metadata included.
    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|a| a.name != name);
    }
}

/// The flat, creation-ordered store of all nodes produced by one parse.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
/// "The DOM represents a document as a tree."
///
/// Every relationship is an index; nothing owns anything but the arena
/// itself, which rules out reference cycles and dangling parents by
/// construction.
#[derive(Debug, Clone, Default)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// A tree holding only the synthetic root node.
    #[must_use]
    pub fn new() -> Self {
        let mut root = Node::new(NodeType::Root, "root");
        root.begin = None;
        DomTree { nodes: vec![root] }
    }

    /// The root node ID.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes in the arena (including the root).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True after [`DomTree::clear`] (a live tree always holds the root).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable node by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Append a detached node to the arena and return its index.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Link `child` under `parent` at the end of its child lists. Every
    /// child lands in `nodes`; `structural` additionally records it in
    /// `children` (element children only, as the tree builder decides).
    pub fn link(&mut self, parent: NodeId, child: NodeId, structural: bool) {
        if let Some(node) = self.nodes.get_mut(child.0) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.nodes.push(child);
            if structural {
                node.children.push(child);
            }
        }
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// Append `child` as the last child of `parent` in both child lists.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.link(parent, child, true);
    }

    /// Insert `new` under `parent` immediately before `reference`; appends
    /// instead when `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, new: NodeId, reference: NodeId) {
        let Some(index) = self
            .get(parent)
            .and_then(|p| p.children.iter().position(|&c| c == reference))
        else {
            self.append_child(parent, new);
            return;
        };
        if let Some(node) = self.nodes.get_mut(new.0) {
            node.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.insert(index, new);
            let at = index.min(p.nodes.len());
            p.nodes.insert(at, new);
        }
    }

    /// Detach `child` from `parent`. Returns the child when it was a
    /// structural child of `parent`; the arena entry itself stays (indices
    /// are never reused).
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        let mut was_child = false;
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.nodes.retain(|&n| n != child);
            if let Some(index) = p.children.iter().position(|&c| c == child) {
                p.children.remove(index);
                was_child = true;
            }
        }
        if was_child {
            if let Some(node) = self.nodes.get_mut(child.0) {
                node.parent = None;
            }
            Some(child)
        } else {
            None
        }
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// The element-typed children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// ALL direct children of a node, in document order.
    #[must_use]
    pub fn child_nodes(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.nodes.as_slice()).unwrap_or(&[])
    }

    /// First element child.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Last element child.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Next element sibling, computed from the parent's child list.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.get(index + 1).copied()
    }

    /// Previous element sibling, computed from the parent's child list.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        index.checked_sub(1).and_then(|i| siblings.get(i)).copied()
    }

    /// Whether the node has element children.
    #[must_use]
    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    /// Drop every node, root included, severing all index references.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl std::ops::Index<NodeId> for DomTree {
    type Output = Node;

    /// # Panics
    /// Panics if `id` does not refer to a node in this arena.
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl std::ops::IndexMut<NodeId> for DomTree {
    /// # Panics
    /// Panics if `id` does not refer to a node in this arena.
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}
