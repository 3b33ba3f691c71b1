//! Format-preserving serialization.
//!
//! [§ 13.3 Serializing](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)
//! describes normalized output; this serializer does the opposite. Markup
//! round-trips byte for byte: captured text is re-emitted through the
//! noise map, attribute quoting and whitespace come from the recorded
//! per-attribute metadata, and a close tag is written only where one was
//! read (or where a programmatically built element needs one).

use domforge_dom::{AttrValue, NodeId, NodeType, QuoteStyle};

use crate::document::Document;
use crate::encoding;

impl Document {
    /// The node's full markup, including its own tags.
    ///
    /// Fires the visitor callback (if set) for this node and every
    /// descendant rendered along the way; the callback may mutate each
    /// node before it is emitted. An unknown id renders as empty.
    pub fn outer_html(&mut self, id: NodeId) -> String {
        let Some(node) = self.tree().get(id) else {
            return String::new();
        };
        if node.node_type == NodeType::Root {
            return self.inner_html(id);
        }

        self.fire_callback(id);

        let node = &self.tree()[id];
        if let Some(outer) = &node.outer {
            return outer.clone();
        }
        if let Some(text) = &node.text {
            return self.noise().restore(text);
        }

        let mut result = match node.begin {
            Some(begin) if self.tree().get(begin).is_some() => self.makeup(begin),
            _ => self.makeup(id),
        };

        let inner = self.tree()[id].inner.clone();
        if let Some(inner) = inner {
            // A br's inner override is plain-text replacement only.
            if self.tree()[id].tag != "br" {
                result.push_str(&inner);
            }
        } else {
            let kids = self.tree()[id].nodes.clone();
            for kid in kids {
                let fragment = self.outer_html(kid);
                result.push_str(&self.convert_text(&fragment));
            }
        }

        let node = &self.tree()[id];
        match node.end {
            Some(end) if end != 0 => {
                result.push_str("</");
                result.push_str(&node.tag);
                result.push('>');
            }
            Some(_) => {}
            None => {
                // Only elements built by hand (no captured begin tag) get
                // a synthesized close; one left open by the parser
                // re-emits exactly what was read.
                if node.begin.is_none()
                    && node.node_type == NodeType::Element
                    && !self.is_void(&node.tag)
                {
                    result.push_str("</");
                    result.push_str(&node.tag);
                    result.push('>');
                }
            }
        }

        result
    }

    /// The markup between the node's tags.
    pub fn inner_html(&mut self, id: NodeId) -> String {
        let Some(node) = self.tree().get(id) else {
            return String::new();
        };
        if let Some(inner) = &node.inner {
            return inner.clone();
        }
        if let Some(text) = &node.text {
            return self.noise().restore(text);
        }

        let kids = node.nodes.clone();
        let mut result = String::new();
        for kid in kids {
            let fragment = self.outer_html(kid);
            result.push_str(&fragment);
        }
        result
    }

    /// The node's plain text: tags dropped, `<br>` and `<span>` rendered
    /// via the configured replacement texts, a blank line before each
    /// paragraph. Comments, unknown markup, and script/style content
    /// contribute nothing.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.tree().get(id) else {
            return String::new();
        };
        if let Some(inner) = &node.inner {
            return inner.clone();
        }

        match node.node_type {
            NodeType::Text | NodeType::OrphanEndTag => {
                return self.noise().restore(node.text.as_deref().unwrap_or(""));
            }
            NodeType::Comment | NodeType::Unknown => return String::new(),
            _ => {}
        }

        if node.tag.eq_ignore_ascii_case("script") || node.tag.eq_ignore_ascii_case("style") {
            return String::new();
        }

        let mut result = String::new();
        for &kid in &node.nodes {
            let kid_tag = self.tree()[kid].tag.as_str();
            if kid_tag == "p" {
                result = format!("{}\n\n", result.trim());
            }
            let fragment = self.text_content(kid);
            result.push_str(&self.convert_text(&fragment));
            if kid_tag == "span" {
                result.push_str(self.config().get_default_span_text());
            }
        }
        result
    }

    /// Re-emit the node's opening tag from its recorded attribute
    /// metadata: captured whitespace, captured quoting, insertion order.
    /// Suppressed boolean attributes are skipped entirely.
    pub(crate) fn makeup(&self, id: NodeId) -> String {
        let node = &self.tree()[id];
        if node.tag == "root" {
            return String::new();
        }

        let mut result = format!("<{}", node.tag);
        for attr in &node.attributes {
            if attr.value == AttrValue::Flag(false) {
                continue;
            }
            result.push_str(&attr.spacing.before);
            match &attr.value {
                AttrValue::Flag(_) => result.push_str(&attr.name),
                AttrValue::Text(value) => {
                    result.push_str(&attr.name);
                    result.push_str(&attr.spacing.before_eq);
                    result.push('=');
                    result.push_str(&attr.spacing.after_eq);
                    match attr.quote {
                        QuoteStyle::Double => {
                            result.push('"');
                            result.push_str(value);
                            result.push('"');
                        }
                        QuoteStyle::Single => {
                            result.push('\'');
                            result.push_str(value);
                            result.push('\'');
                        }
                        QuoteStyle::None => result.push_str(value),
                    }
                }
            }
        }
        result.push_str(&node.end_space);
        result.push('>');
        result
    }

    /// Charset-adjust a rendered fragment. Documents are UTF-8 strings
    /// in memory, so this reduces to BOM stripping; real conversion
    /// happens at the byte boundary when saving.
    pub(crate) fn convert_text(&self, text: &str) -> String {
        encoding::strip_bom(text).to_string()
    }
}
