//! The parsed document: arena, noise map, configuration, and queries.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use domforge_dom::{Attribute, AttrValue, DomTree, Node, NodeId, NodeType};
use domforge_selector::parse_selector;

use crate::config::Configuration;
use crate::encoding;
use crate::error::LoadError;
use crate::noise::{self, NoiseMap};
use crate::parser;
use crate::void_tags;

/// Visitor invoked for each node as its markup is rendered.
pub type NodeCallback = Box<dyn FnMut(&mut Node)>;

/// A lenient parse of one HTML document.
///
/// Construction never fails on malformed markup; only absent input does
/// (see [`LoadError`]). The document owns the node arena, the noise map
/// recorded during extraction, and a snapshot of the void-tag registry
/// taken at parse time, so registry edits made later do not change how
/// this document serializes.
pub struct Document {
    tree: DomTree,
    noise: NoiseMap,
    config: Configuration,
    voids: HashSet<String>,
    charset: String,
    original_size: usize,
    callback: Option<NodeCallback>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.tree.len())
            .field("charset", &self.charset)
            .field("original_size", &self.original_size)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Parse a markup string with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyInput`] when `html` holds no bytes at
    /// all. Whitespace-only input parses to an empty document.
    pub fn from_html(html: &str) -> Result<Self, LoadError> {
        Self::from_html_with(html, Configuration::default())
    }

    /// Parse a markup string with an explicit configuration.
    ///
    /// Extra void tags named by the configuration are merged into the
    /// process-wide registry before parsing.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyInput`] when `html` holds no bytes.
    pub fn from_html_with(html: &str, config: Configuration) -> Result<Self, LoadError> {
        if html.is_empty() {
            return Err(LoadError::EmptyInput);
        }
        if let Some(tags) = config.get_self_closing_tags() {
            void_tags::register_self_closing_tags(tags);
        }

        let trimmed = html.trim();
        let original_size = trimmed.len();
        let mut noise = NoiseMap::new();
        let extracted = noise::extract(
            trimmed.to_string(),
            config.should_remove_line_breaks(),
            &mut noise,
        );

        let mut tree = DomTree::new();
        let voids = void_tags::snapshot();
        parser::parse_into(&mut tree, &mut noise, &config, &voids, NodeId::ROOT, &extracted);

        let mut document = Document {
            tree,
            noise,
            config,
            voids,
            charset: String::new(),
            original_size,
            callback: None,
        };
        document.detect_charset();

        Ok(document)
    }

    /// Decode raw bytes (UTF-8, else windows-1252) and parse them.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyInput`] when `bytes` is empty.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::from_bytes_with(bytes, Configuration::default())
    }

    /// Decode raw bytes and parse them with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyInput`] when `bytes` is empty.
    pub fn from_bytes_with(bytes: &[u8], config: Configuration) -> Result<Self, LoadError> {
        if bytes.is_empty() {
            return Err(LoadError::EmptyInput);
        }
        Self::from_html_with(&encoding::decode(bytes), config)
    }

    /// Read and parse a file with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::FileUnreadable`] unless `path` names an
    /// existing regular file, [`LoadError::Io`] on read failure, and
    /// [`LoadError::EmptyInput`] for an empty file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_file_with(path, Configuration::default())
    }

    /// Read and parse a file with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Document::from_file`].
    pub fn from_file_with(path: impl AsRef<Path>, config: Configuration) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let metadata =
            fs::metadata(path).map_err(|_| LoadError::FileUnreadable(path.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(LoadError::FileUnreadable(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        Self::from_bytes_with(&bytes, config)
    }

    /// The node arena.
    #[must_use]
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Mutable access to the node arena, for structural edits beyond the
    /// conveniences on `Document`.
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// The recorded noise spans.
    #[must_use]
    pub fn noise(&self) -> &NoiseMap {
        &self.noise
    }

    /// The configuration this document was parsed with.
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The charset detected from `<meta>` markup (`"UTF-8"` when nothing
    /// declares one; the latin-1 family normalizes to `"CP1252"`).
    #[must_use]
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Byte length of the trimmed input.
    #[must_use]
    pub fn original_size(&self) -> usize {
        self.original_size
    }

    /// A node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.tree.get(id)
    }

    /// A node by id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.tree.get_mut(id)
    }

    pub(crate) fn is_void(&self, tag: &str) -> bool {
        self.voids.contains(&tag.to_lowercase())
    }

    /// Install a visitor fired for every node whose markup is rendered.
    pub fn set_callback(&mut self, callback: impl FnMut(&mut Node) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Remove the visitor.
    pub fn remove_callback(&mut self) {
        self.callback = None;
    }

    pub(crate) fn fire_callback(&mut self, id: NodeId) {
        if self.callback.is_none() {
            return;
        }
        let mut callback = self.callback.take();
        if let (Some(callback), Some(node)) = (callback.as_mut(), self.tree.get_mut(id)) {
            callback(node);
        }
        self.callback = callback;
    }

    /// Drop the arena and noise map entirely.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.noise.clear();
        self.charset.clear();
    }

    /// The whole document's markup (root inner markup).
    pub fn html(&mut self) -> String {
        let root = self.tree.root();
        self.inner_html(root)
    }

    /// The whole document's plain text.
    #[must_use]
    pub fn text(&self) -> String {
        self.text_content(self.tree.root())
    }

    /// Render the document and write it to `path`, encoded to the
    /// configured target charset.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when the file cannot be written.
    pub fn save_to_file(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let markup = self.html();
        let bytes = encoding::encode(&markup, self.config.target_charset());
        fs::write(path, bytes)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Evaluate `selector` from `from`. With `lowercase` set, tag names
    /// compare case-insensitively (for documents parsed without tag
    /// folding). Results are deduplicated, in document order; malformed
    /// selectors yield nothing.
    #[must_use]
    pub fn query(&self, from: NodeId, selector: &str, lowercase: bool) -> Vec<NodeId> {
        let selectors = parse_selector(selector, self.config.is_lowercase());
        domforge_selector::select(&self.tree, from, &selectors, lowercase)
    }

    /// All matches for `selector` from the root.
    #[must_use]
    pub fn find(&self, selector: &str) -> Vec<NodeId> {
        self.query(self.tree.root(), selector, false)
    }

    /// The `idx`-th match from the root; negative indexes count from the
    /// end.
    #[must_use]
    pub fn find_nth(&self, selector: &str, idx: isize) -> Option<NodeId> {
        nth(&self.find(selector), idx)
    }

    /// The first match from the root.
    #[must_use]
    pub fn find_one(&self, selector: &str) -> Option<NodeId> {
        self.find_nth(selector, 0)
    }

    /// The `idx`-th match for `selector` evaluated from `from`.
    #[must_use]
    pub fn query_nth(&self, from: NodeId, selector: &str, idx: isize, lowercase: bool) -> Option<NodeId> {
        nth(&self.query(from, selector, lowercase), idx)
    }

    /// The first element with the given id attribute.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_one(&format!("#{id}"))
    }

    /// All elements with the given id attribute.
    #[must_use]
    pub fn elements_by_id(&self, id: &str) -> Vec<NodeId> {
        self.find(&format!("#{id}"))
    }

    /// The first element with the given tag name.
    #[must_use]
    pub fn element_by_tag_name(&self, name: &str) -> Option<NodeId> {
        self.find_one(name)
    }

    /// All elements with the given tag name.
    #[must_use]
    pub fn elements_by_tag_name(&self, name: &str) -> Vec<NodeId> {
        self.find(name)
    }

    // ------------------------------------------------------------------
    // Node construction
    // ------------------------------------------------------------------

    /// Build a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_with(
            tag,
            None,
            std::iter::empty::<(String, AttrValue)>(),
        )
    }

    /// Build a detached element with inner content and attributes.
    /// Attributes get programmatic formatting (one leading space, double
    /// quotes for text values, bare form for boolean markers); a void tag
    /// comes out self-closing.
    pub fn create_element_with<S, V>(
        &mut self,
        tag: &str,
        content: Option<&str>,
        attributes: impl IntoIterator<Item = (S, V)>,
    ) -> NodeId
    where
        S: Into<String>,
        V: Into<AttrValue>,
    {
        let tag = if self.config.is_lowercase() {
            tag.to_lowercase()
        } else {
            tag.to_string()
        };
        let mut node = Node::new(NodeType::Element, tag.clone());
        for (name, value) in attributes {
            node.attributes.push(Attribute::new(name.into(), value.into()));
        }
        if let Some(content) = content {
            node.inner = Some(content.to_string());
        }
        if self.is_void(&tag) {
            node.end_space = "/".to_string();
            node.end = Some(0);
        }
        self.tree.alloc(node)
    }

    /// Build a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        let mut node = Node::new(NodeType::Text, "text");
        node.text = Some(text.to_string());
        self.tree.alloc(node)
    }

    /// Build a detached comment node; `text` is wrapped in `<!--…-->`.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        let mut node = Node::new(NodeType::Comment, "comment");
        node.text = Some(format!("<!--{text}-->"));
        self.tree.alloc(node)
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.tree.append_child(parent, child);
    }

    /// Insert `new` under `parent` just before `reference` (append when
    /// `reference` is not a child of `parent`).
    pub fn insert_before(&mut self, parent: NodeId, new: NodeId, reference: NodeId) {
        self.tree.insert_before(parent, new, reference);
    }

    /// Detach `child` from `parent`; returns it when it was a structural
    /// child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        self.tree.remove_child(parent, child)
    }

    // ------------------------------------------------------------------
    // Content replacement
    // ------------------------------------------------------------------

    /// Replace the node's inner markup: children are discarded and
    /// `markup` is re-parsed into the same arena (blank markup leaves the
    /// node childless).
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) {
        if self.tree.get(id).is_none() {
            return;
        }
        if self.tree[id].text.is_some() {
            self.tree[id].text = Some(markup.to_string());
        } else {
            self.tree[id].inner = Some(markup.to_string());
        }
        self.rebuild(id);
    }

    /// Override the node's rendered outer markup verbatim.
    pub fn set_outer_html(&mut self, id: NodeId, markup: &str) {
        if let Some(node) = self.tree.get_mut(id) {
            node.outer = Some(markup.to_string());
        }
    }

    /// Replace the raw text of a text-backed node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(node) = self.tree.get_mut(id) {
            node.text = Some(text.to_string());
        }
    }

    /// Re-parse the node's current inner markup as its new children.
    ///
    /// The fragment lands in the same arena via a synthetic wrapper
    /// element whose child lists are moved onto `id`; the wrapper stays
    /// behind as an unlinked arena entry. Grafted nodes are reachable by
    /// navigation but sit outside `id`'s original index range, so
    /// descendant scans from an ancestor do not see them.
    fn rebuild(&mut self, id: NodeId) {
        let markup = self.inner_html(id);

        let node = &mut self.tree[id];
        node.nodes.clear();
        node.children.clear();
        node.inner = None;

        if markup.trim().is_empty() {
            return;
        }

        let wrapper = self.tree.alloc(Node::new(NodeType::Element, "root"));
        self.tree[wrapper].begin = Some(wrapper);

        let extracted = noise::extract(
            markup,
            self.config.should_remove_line_breaks(),
            &mut self.noise,
        );
        parser::parse_into(
            &mut self.tree,
            &mut self.noise,
            &self.config,
            &self.voids,
            wrapper,
            &extracted,
        );

        let kids = std::mem::take(&mut self.tree[wrapper].nodes);
        let children = std::mem::take(&mut self.tree[wrapper].children);
        for &kid in &kids {
            self.tree[kid].parent = Some(id);
        }
        self.tree[id].nodes = kids;
        self.tree[id].children = children;
    }

    /// Sniff the charset declared by `<meta>` markup. Runs once after
    /// parsing; the result answers [`Document::charset`].
    fn detect_charset(&mut self) {
        let mut detected: Option<String> = None;

        if let Some(meta) = self
            .query(self.tree.root(), "meta[http-equiv=Content-Type]", true)
            .into_iter()
            .next()
        {
            if let Some(content) = self.tree[meta].attr("content") {
                detected = charset_from_content(content);
            }
        }

        if detected.is_none() {
            if let Some(meta) = self.find_one("meta[charset]") {
                detected = self.tree[meta].attr("charset").map(ToString::to_string);
            }
        }

        let mut charset = detected.unwrap_or_else(|| "UTF-8".to_string());
        let lower = charset.to_lowercase();
        if lower == "iso-8859-1" || lower == "latin1" || lower == "latin-1" {
            charset = "CP1252".to_string();
        }
        self.charset = charset;
    }
}

/// Everything after `charset=` in a meta content value.
fn charset_from_content(content: &str) -> Option<String> {
    let needle = b"charset=";
    let bytes = content.as_bytes();
    let pos = bytes
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))?;
    Some(content[pos + needle.len()..].to_string())
}

/// Index into a match list, counting from the end for negative `idx`.
fn nth(found: &[NodeId], idx: isize) -> Option<NodeId> {
    let idx = if idx < 0 {
        found.len() as isize + idx
    } else {
        idx
    };
    usize::try_from(idx).ok().and_then(|i| found.get(i)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_extraction_from_content_value() {
        assert_eq!(
            charset_from_content("text/html; charset=utf-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            charset_from_content("text/html; CHARSET=ISO-8859-1"),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(charset_from_content("text/html"), None);
    }

    #[test]
    fn nth_handles_negative_and_out_of_range() {
        let found = [NodeId(1), NodeId(2), NodeId(3)];
        assert_eq!(nth(&found, 0), Some(NodeId(1)));
        assert_eq!(nth(&found, -1), Some(NodeId(3)));
        assert_eq!(nth(&found, 3), None);
        assert_eq!(nth(&found, -4), None);
    }
}
