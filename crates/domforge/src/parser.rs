//! The lenient tree builder.
//!
//! [§ 13.2 Parsing HTML documents](https://html.spec.whatwg.org/multipage/parsing.html)
//! describes a conforming parser; this one deliberately is not. It never
//! rejects input: markup it cannot make sense of degrades to text nodes,
//! unmatched end tags are kept verbatim, and a small recovery table closes
//! the tags authors habitually leave open (`<li>`, `<p>`, table cells).
//! What it promises instead is byte fidelity: every captured span
//! serializes back exactly as it was read.
//!
//! Nodes are appended to the arena in source order, so an element's arena
//! index is its begin bound and the arena length at the moment its close
//! tag is read is its (exclusive) end bound. The selector engine leans on
//! those bounds for descendant scans.

use std::collections::HashSet;

use domforge_dom::{AttrSpacing, Attribute, AttrValue, DomTree, Node, NodeId, NodeType, QuoteStyle};

use crate::config::Configuration;
use crate::noise::NoiseMap;
use crate::scanner::{Scanner, WHITESPACE_CHARS};
use crate::warning::warn_once;

/// Tags whose end tag may close ancestors across an optional-closing run.
const BLOCK_TAGS: [&str; 6] = ["body", "div", "form", "root", "span", "table"];

/// [§ 13.1.2.4 Optional tags](https://html.spec.whatwg.org/multipage/syntax.html#optional-tags)
///
/// Opening `tag` implicitly closes an open parent whose name is in the
/// returned set.
fn optional_closing(tag: &str) -> Option<&'static [&'static str]> {
    Some(match tag {
        "b" => &["b"],
        "dd" | "dl" | "dt" => &["dd", "dt"],
        "li" => &["li"],
        "optgroup" | "option" => &["optgroup", "option"],
        "p" => &["p"],
        "rp" | "rt" => &["rp", "rt"],
        "td" | "th" => &["td", "th"],
        "tr" => &["td", "th", "tr"],
        _ => return None,
    })
}

/// `^\w[\w:-]*$`: the shape a start tag name must have to be treated as
/// an element.
fn valid_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphanumeric() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':' || c == '-')
}

/// Parse `html` (already noise-extracted) as the content of `parse_root`,
/// which must be a node in `tree`. On return `parse_root`'s end bound is
/// the arena length.
pub(crate) fn parse_into(
    tree: &mut DomTree,
    noise: &mut NoiseMap,
    config: &Configuration,
    voids: &HashSet<String>,
    parse_root: NodeId,
    html: &str,
) {
    let mut builder = TreeBuilder {
        scanner: Scanner::new(html),
        tree,
        noise,
        config,
        voids,
        parse_root,
        current_parent: parse_root,
    };
    builder.run();
}

struct TreeBuilder<'a> {
    scanner: Scanner,
    tree: &'a mut DomTree,
    noise: &'a mut NoiseMap,
    config: &'a Configuration,
    voids: &'a HashSet<String>,
    parse_root: NodeId,
    current_parent: NodeId,
}

impl TreeBuilder<'_> {
    fn run(&mut self) {
        loop {
            let text = self.scanner.copy_until_char('<');
            if text.is_empty() {
                if self.read_tag() {
                    continue;
                }
                return;
            }

            let mut node = Node::new(NodeType::Text, "text");
            node.text = Some(text);
            let id = self.tree.alloc(node);
            self.link(id, false);
        }
    }

    /// Attach `id` under the open parent. Every node lands in the parent's
    /// `nodes` list; `structural` additionally records it in `children`.
    fn link(&mut self, id: NodeId, structural: bool) {
        self.tree.link(self.current_parent, id, structural);
    }

    fn parent_of_current(&self) -> Option<NodeId> {
        self.tree[self.current_parent].parent
    }

    /// Dispatch on the character after `<`. Returns false at end of input.
    fn read_tag(&mut self) -> bool {
        if self.scanner.current() != Some('<') {
            let end = self.tree.len();
            self.tree[self.parse_root].end = Some(end);
            return false;
        }

        let tag_start = self.scanner.position();
        self.scanner.advance();

        if self.scanner.current() == Some('/') {
            return self.read_end_tag();
        }

        self.read_start_tag(tag_start)
    }

    fn read_end_tag(&mut self) -> bool {
        self.scanner.advance();
        self.scanner.skip(WHITESPACE_CHARS);
        let mut tag = self.scanner.copy_until_char('>');
        if let Some(space) = tag.find(' ') {
            tag.truncate(space);
        }

        let parent_tag_lower = self.tree[self.current_parent].tag.to_lowercase();
        let tag_lower = tag.to_lowercase();

        if parent_tag_lower != tag_lower {
            let is_block = BLOCK_TAGS.contains(&tag_lower.as_str());
            let parent_optional =
                self.config.is_force_tags_closed() && optional_closing(&parent_tag_lower).is_some();

            if parent_optional && is_block {
                // The open parent may close implicitly: mark it unclosed
                // and look for the matching ancestor.
                self.tree[self.current_parent].end = Some(0);
                let original_parent = self.current_parent;

                self.climb_to_matching(&tag_lower);

                if self.tree[self.current_parent].tag.to_lowercase() != tag_lower {
                    self.current_parent = original_parent;
                    if let Some(parent) = self.parent_of_current() {
                        self.current_parent = parent;
                    }
                    let end = self.tree.len();
                    self.tree[self.current_parent].end = Some(end);

                    return self.orphan_end_tag(&tag);
                }
            } else if self.parent_of_current().is_some() && is_block {
                self.tree[self.current_parent].end = Some(0);
                let original_parent = self.current_parent;

                self.climb_to_matching(&tag_lower);

                if self.tree[self.current_parent].tag.to_lowercase() != tag_lower {
                    self.current_parent = original_parent;
                    let end = self.tree.len();
                    self.tree[self.current_parent].end = Some(end);

                    return self.orphan_end_tag(&tag);
                }
            } else if self
                .parent_of_current()
                .is_some_and(|p| self.tree[p].tag.to_lowercase() == tag_lower)
            {
                // The end tag belongs to the grandparent: the parent was
                // left open.
                self.tree[self.current_parent].end = Some(0);
                self.current_parent = self
                    .parent_of_current()
                    .unwrap_or(self.current_parent);
            } else {
                return self.orphan_end_tag(&tag);
            }
        }

        let end = self.tree.len();
        self.tree[self.current_parent].end = Some(end);
        if let Some(parent) = self.parent_of_current() {
            self.current_parent = parent;
        }
        self.scanner.advance();

        true
    }

    /// Walk up toward the root until the open parent's tag is `tag_lower`
    /// (or the root is reached).
    fn climb_to_matching(&mut self, tag_lower: &str) {
        while self.parent_of_current().is_some()
            && self.tree[self.current_parent].tag.to_lowercase() != tag_lower
        {
            self.current_parent = self.parent_of_current().unwrap_or(self.current_parent);
        }
    }

    /// Keep an end tag that matched nothing as verbatim text.
    fn orphan_end_tag(&mut self, tag: &str) -> bool {
        warn_once("parser", &format!("unmatched end tag </{tag}> kept as text"));

        let mut node = Node::new(NodeType::OrphanEndTag, "text");
        node.text = Some(format!("</{tag}>"));
        let id = self.tree.alloc(node);
        self.link(id, false);
        self.scanner.advance();

        true
    }

    fn read_start_tag(&mut self, tag_start: usize) -> bool {
        // The node is allocated before its markup is understood, so its
        // arena index is its begin bound whatever it degrades to.
        let id = self.tree.alloc(Node::new(NodeType::Text, "text"));
        self.tree[id].begin = Some(id);
        self.tree[id].tag_start = tag_start;

        let tag = self.scanner.copy_until(" />\r\n\t");

        // <!doctype …>, <!-- placeholders, and other bang markup.
        if tag.starts_with('!') {
            let mut text = format!("<{tag}{}", self.scanner.copy_until_char('>'));
            if self.scanner.current() == Some('>') {
                text.push('>');
            }
            let node = &mut self.tree[id];
            if tag.starts_with("!--") {
                node.node_type = NodeType::Comment;
                node.tag = "comment".to_string();
            } else {
                node.node_type = NodeType::Unknown;
                node.tag = "unknown".to_string();
            }
            node.text = Some(text);
            self.link(id, true);
            self.scanner.advance();

            return true;
        }

        // A start tag cannot contain another `<`: the captured run was
        // text, and the inner `<` gets reprocessed.
        if tag.contains('<') {
            let mut tag = tag;
            tag.pop();
            self.tree[id].text = Some(format!("<{tag}"));
            self.link(id, false);
            self.scanner.retreat();

            return true;
        }

        if !valid_tag_name(&tag) {
            let mut text = format!("<{tag}{}", self.scanner.copy_until("<>"));

            if self.scanner.current() == Some('<') {
                self.tree[id].text = Some(text);
                self.link(id, false);

                return true;
            }

            if self.scanner.current() == Some('>') {
                text.push('>');
            }
            self.tree[id].text = Some(text);
            self.link(id, false);
            self.scanner.advance();

            return true;
        }

        let tag_lower = tag.to_lowercase();
        {
            let node = &mut self.tree[id];
            node.node_type = NodeType::Element;
            node.tag = if self.config.is_lowercase() {
                tag_lower.clone()
            } else {
                tag.clone()
            };
        }

        // Opening this tag may implicitly close open parents (`<li>`
        // inside `<li>`, `<tr>` inside `<td>`, …).
        if self.config.is_force_tags_closed() {
            if let Some(closes) = optional_closing(&tag_lower) {
                loop {
                    let parent_tag = self.tree[self.current_parent].tag.to_lowercase();
                    if !closes.contains(&parent_tag.as_str()) {
                        break;
                    }
                    self.tree[self.current_parent].end = Some(0);
                    let Some(parent) = self.parent_of_current() else {
                        break;
                    };
                    self.current_parent = parent;
                }
            }
        }

        let mut guard = 0usize;
        let mut spacing = AttrSpacing {
            before: self.scanner.copy_skip(WHITESPACE_CHARS),
            before_eq: String::new(),
            after_eq: String::new(),
        };

        loop {
            let attr_name = self.scanner.copy_until(" =/>");

            if attr_name.is_empty() && self.scanner.current().is_some() && spacing.before.is_empty()
            {
                break;
            }

            // No progress since the last round: step over the offending
            // character instead of spinning.
            if guard == self.scanner.position() {
                self.scanner.advance();
                if matches!(self.scanner.current(), Some('>' | '/')) {
                    break;
                }
                continue;
            }
            guard = self.scanner.position();

            // The buffer ran out mid-tag: the whole run was text.
            if self.scanner.position() + 1 >= self.scanner.len()
                && self.scanner.current() != Some('>')
            {
                let node = &mut self.tree[id];
                node.node_type = NodeType::Text;
                node.tag = "text".to_string();
                node.end = Some(0);
                node.text = Some(format!("<{tag}{}{attr_name}", spacing.before));
                self.link(id, false);

                return true;
            }

            // A fresh `<` right behind the cursor: the captured tag was
            // text, and the `<` starts over.
            if self.scanner.char_at(self.scanner.position().wrapping_sub(1)) == Some('<') {
                let text = self.scanner.slice(tag_start, self.scanner.position() - 1);
                let node = &mut self.tree[id];
                node.node_type = NodeType::Text;
                node.tag = "text".to_string();
                node.attributes.clear();
                node.end = Some(0);
                node.text = Some(text);
                self.scanner.retreat();
                self.link(id, false);

                return true;
            }

            if attr_name != "/" && !attr_name.is_empty() {
                spacing.before_eq = self.scanner.copy_skip(WHITESPACE_CHARS);
                let mut name = self.noise.restore(&attr_name);
                if self.config.is_lowercase() {
                    name = name.to_lowercase();
                }

                if self.scanner.current() == Some('=') {
                    self.scanner.advance();
                    self.parse_attribute(id, name, &mut spacing);
                } else {
                    // Bare boolean attribute (checked, selected, …).
                    match self.tree[id].attributes.iter_mut().find(|a| a.name == name) {
                        Some(attr) => {
                            attr.value = AttrValue::Flag(true);
                            attr.quote = QuoteStyle::None;
                        }
                        None => self.tree[id].attributes.push(Attribute {
                            name,
                            value: AttrValue::Flag(true),
                            quote: QuoteStyle::None,
                            spacing: spacing.clone(),
                        }),
                    }
                    if self.scanner.current() != Some('>') {
                        self.scanner.retreat();
                    }
                }

                spacing = AttrSpacing {
                    before: self.scanner.copy_skip(WHITESPACE_CHARS),
                    before_eq: String::new(),
                    after_eq: String::new(),
                };
            } else {
                break;
            }

            if matches!(self.scanner.current(), Some('>' | '/')) {
                break;
            }
        }

        self.link(id, true);
        self.tree[id].end_space = spacing.before.clone();

        if self.scanner.copy_until_char('>') == "/" {
            self.tree[id].end_space.push('/');
            self.tree[id].end = Some(0);
        } else {
            let tag_name = self.tree[id].tag.to_lowercase();
            if !self.voids.contains(&tag_name) {
                self.current_parent = id;
            }
        }
        self.scanner.advance();

        if self.tree[id].tag == "br" {
            self.tree[id].inner = Some(self.config.get_default_br_text().to_string());
        }

        true
    }

    fn parse_attribute(&mut self, id: NodeId, name: String, spacing: &mut AttrSpacing) {
        let is_duplicate = self.tree[id].has_attribute(&name);

        if !is_duplicate {
            spacing.after_eq = self.scanner.copy_skip(WHITESPACE_CHARS);
        }

        let (quote, value) = match self.scanner.current() {
            Some('"') => {
                self.scanner.advance();
                let value = self.scanner.copy_until_char('"');
                self.scanner.advance();
                (QuoteStyle::Double, value)
            }
            Some('\'') => {
                self.scanner.advance();
                let value = self.scanner.copy_until_char('\'');
                self.scanner.advance();
                (QuoteStyle::Single, value)
            }
            _ => (QuoteStyle::None, self.scanner.copy_until(" >")),
        };

        let mut value = self.noise.restore(&value);
        if name == "class" {
            value = value.trim().to_string();
        }

        // First occurrence wins; a duplicate's value is consumed above
        // but dropped.
        if !is_duplicate {
            self.tree[id].attributes.push(Attribute {
                name,
                value: AttrValue::Text(value),
                quote,
                spacing: spacing.clone(),
            });
        }
    }
}
