//! CSS-subset selector parsing and matching for domforge.
//!
//! Implements the selector dialect understood by the parser's `find`
//! surface: type/id/class/attribute compounds joined by the four
//! combinators of [Selectors Level 4](https://www.w3.org/TR/selectors-4/),
//! grouped into comma-separated lists. Pseudo-classes are out of scope.
//!
//! Matching is evaluated left to right over the node arena: each compound
//! maps the current match set to a new one through its trailing
//! combinator, with descendant candidates produced by an arena
//! index-range scan rather than tree walking.

use std::collections::BTreeSet;

use domforge_dom::{AttrValue, DomTree, NodeId};

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
///
/// "A combinator is punctuation that represents a particular kind of
/// relationship between the selectors on either side."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    /// [§ 16.1](https://www.w3.org/TR/selectors-4/#descendant-combinators)
    /// Whitespace: `A B` matches a `B` anywhere below an `A`.
    #[default]
    Descendant,
    /// [§ 16.2](https://www.w3.org/TR/selectors-4/#child-combinators)
    /// `A > B` matches a `B` whose parent is an `A`.
    Child,
    /// [§ 16.3](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators)
    /// `A + B` matches a `B` immediately following an `A`.
    NextSibling,
    /// [§ 16.4](https://www.w3.org/TR/selectors-4/#general-sibling-combinators)
    /// `A ~ B` matches a `B` anywhere after an `A` under the same parent.
    SubsequentSibling,
}

/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// The attribute comparison operators, plus the non-standard `!=`
/// carried over from the simple-dom selector dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttrOp {
    /// `[attr]` — the attribute is present.
    #[default]
    Exists,
    /// `[attr=v]` — value equals `v` exactly.
    Equals,
    /// `[attr!=v]` — value differs from `v` (non-standard).
    NotEquals,
    /// `[attr^=v]` — value begins with `v`.
    Prefix,
    /// `[attr$=v]` — value ends with `v`.
    Suffix,
    /// `[attr*=v]` — value contains `v`.
    Substring,
    /// `[attr|=v]` — value is `v` or begins with `v-`.
    DashMatch,
    /// `[attr~=v]` — value, split on whitespace, contains the word `v`.
    Includes,
}

/// One `[…]` predicate of a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrPredicate {
    /// Attribute name (without the optional leading `!`).
    pub name: String,
    /// Comparison operator.
    pub op: AttrOp,
    /// Comparison value (quotes stripped).
    pub value: String,
    /// Leading `!` on the name: the whole predicate is negated.
    pub negated: bool,
    /// Trailing `i` flag: compare values case-insensitively.
    pub case_insensitive: bool,
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector … represents a set of simultaneous conditions on
/// a single element." Here: an optional tag (or `*`), an optional id,
/// any number of classes, any number of attribute predicates, and the
/// combinator that FOLLOWS this compound in its chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compound {
    /// Tag name; empty or `*` matches any element.
    pub tag: String,
    /// `#id` value; empty when absent.
    pub id: String,
    /// `.class` names, all of which must be present.
    pub classes: Vec<String>,
    /// `[…]` predicates, all of which must hold.
    pub attrs: Vec<AttrPredicate>,
    /// Relationship to the next compound in the chain.
    pub combinator: Combinator,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_empty() && self.id.is_empty() && self.classes.is_empty() && self.attrs.is_empty()
    }
}

/// A parsed selector: comma-separated chains of compounds.
pub type SelectorList = Vec<Vec<Compound>>;

/// Parse a selector string into its chains.
///
/// The parser is deliberately lenient: junk characters are skipped,
/// malformed attribute blocks are dropped, and an unparseable selector
/// simply yields an empty list (so queries degrade to "no match", never
/// an error). When `lowercase_tags` is set, type selectors are folded to
/// lower case to match a tag-lowercasing parse configuration.
#[must_use]
pub fn parse_selector(selector: &str, lowercase_tags: bool) -> SelectorList {
    let chars: Vec<char> = selector.trim().chars().collect();
    let mut chains: SelectorList = Vec::new();
    let mut current: Vec<Compound> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let start = i;
        let mut compound = Compound::default();

        // tag (or '*')
        let tag_start = i;
        while i < chars.len() && (is_name_char(chars[i]) || chars[i] == ':' || chars[i] == '*') {
            i += 1;
        }
        compound.tag = chars[tag_start..i].iter().collect();
        if lowercase_tags {
            compound.tag = compound.tag.to_lowercase();
        }

        // #id
        if i < chars.len() && chars[i] == '#' {
            i += 1;
            let id_start = i;
            while i < chars.len() && is_name_char(chars[i]) {
                i += 1;
            }
            compound.id = chars[id_start..i].iter().collect();
        }

        // .class(.class)*
        while i < chars.len() && chars[i] == '.' {
            i += 1;
            let class_start = i;
            while i < chars.len() && is_name_char(chars[i]) {
                i += 1;
            }
            if i > class_start {
                compound.classes.push(chars[class_start..i].iter().collect());
            }
        }

        // [attr op value flag]*
        while i < chars.len() && chars[i] == '[' {
            i += 1;
            if let Some((predicate, next)) = parse_attr_predicate(&chars, i) {
                compound.attrs.push(predicate);
                i = next;
            } else {
                // Malformed block: resynchronize after the next ']'.
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                i = (i + 1).min(chars.len());
            }
        }

        // Combinator run (also where chain separators live).
        let mut list_break = false;
        let mut combinator = Combinator::Descendant;
        let mut saw_combinator = false;
        while i < chars.len() && is_combinator_char(chars[i]) {
            match chars[i] {
                ',' => list_break = true,
                '>' => combinator = Combinator::Child,
                '+' => combinator = Combinator::NextSibling,
                '~' => combinator = Combinator::SubsequentSibling,
                _ => {}
            }
            saw_combinator = true;
            i += 1;
        }
        compound.combinator = combinator;

        if !compound.is_empty() {
            current.push(compound);
        }
        if list_break && !current.is_empty() {
            chains.push(std::mem::take(&mut current));
        }

        // Guard against zero progress on junk the grammar does not know.
        if i == start && !saw_combinator {
            i += 1;
        }
    }

    if !current.is_empty() {
        chains.push(current);
    }
    chains
}

/// Parse the inside of one `[…]` block starting just past `[`.
/// Returns the predicate and the index just past the closing `]`.
fn parse_attr_predicate(chars: &[char], mut i: usize) -> Option<(AttrPredicate, usize)> {
    // Optional XPath-style '@' prefix, tolerated and ignored.
    if i < chars.len() && chars[i] == '@' {
        i += 1;
    }

    let negated = i < chars.len() && chars[i] == '!';
    if negated {
        i += 1;
    }

    let name_start = i;
    while i < chars.len() && (is_name_char(chars[i]) || chars[i] == ':') {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name: String = chars[name_start..i].iter().collect();

    let mut op = AttrOp::Exists;
    let mut value = String::new();
    let mut case_insensitive = false;

    // Operator?
    if i < chars.len() && matches!(chars[i], '=' | '!' | '^' | '$' | '*' | '|' | '~') {
        op = match chars[i] {
            '=' => AttrOp::Equals,
            '!' => AttrOp::NotEquals,
            '^' => AttrOp::Prefix,
            '$' => AttrOp::Suffix,
            '*' => AttrOp::Substring,
            '|' => AttrOp::DashMatch,
            _ => AttrOp::Includes,
        };
        i += 1;
        if op != AttrOp::Equals {
            if i >= chars.len() || chars[i] != '=' {
                return None;
            }
            i += 1;
        }

        // Value: quoted or bare up to ']'.
        if i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
            let quote = chars[i];
            i += 1;
            let value_start = i;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            value = chars[value_start..i].iter().collect();
            i = (i + 1).min(chars.len());
        } else {
            let value_start = i;
            while i < chars.len() && chars[i] != ']' && !chars[i].is_whitespace() {
                i += 1;
            }
            value = chars[value_start..i].iter().collect();
        }
    }

    // Optional whitespace and case flag before ']'.
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    if i < chars.len() && matches!(chars[i], 'i' | 'I' | 's' | 'S') && chars.get(i + 1) == Some(&']')
    {
        case_insensitive = matches!(chars[i], 'i' | 'I');
        i += 1;
    }

    if i >= chars.len() || chars[i] != ']' {
        return None;
    }
    Some((
        AttrPredicate {
            name,
            op,
            value,
            negated,
            case_insensitive,
        },
        i + 1,
    ))
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_combinator_char(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '>' | '+' | '~' | '/')
}

/// Evaluate a parsed selector list from `from`, returning matches
/// deduplicated and in ascending arena-index (= document) order.
///
/// Each chain starts from a singleton set holding `from` with an
/// implicit descendant relationship; compounds then propagate the set
/// forward through their trailing combinators. A node with no recorded
/// begin index (a programmatically built text or comment node) anchors
/// nothing and yields no matches.
#[must_use]
pub fn select(
    tree: &DomTree,
    from: NodeId,
    selectors: &SelectorList,
    lowercase_match: bool,
) -> Vec<NodeId> {
    let mut found: BTreeSet<NodeId> = BTreeSet::new();

    let anchored = tree
        .get(from)
        .is_some_and(|n| n.begin.is_some() || n.node_type == domforge_dom::NodeType::Root);

    for chain in selectors {
        if chain.is_empty() || !anchored {
            continue;
        }

        let mut head: BTreeSet<NodeId> = BTreeSet::from([from]);
        let mut combinator = Combinator::Descendant;

        for compound in chain {
            let mut matches: BTreeSet<NodeId> = BTreeSet::new();
            for &node in &head {
                seek(tree, node, compound, combinator, lowercase_match, &mut matches);
            }
            head = matches;
            combinator = compound.combinator;
        }

        found.extend(head);
    }

    found.into_iter().collect()
}

/// Collect the nodes related to `node` by `combinator` that satisfy
/// `compound`.
fn seek(
    tree: &DomTree,
    node: NodeId,
    compound: &Compound,
    combinator: Combinator,
    lowercase_match: bool,
    matches: &mut BTreeSet<NodeId>,
) {
    let mut consider = |candidate: NodeId| {
        if compound_matches(tree, candidate, compound, lowercase_match) {
            matches.insert(candidate);
        }
    };

    match combinator {
        Combinator::Descendant => {
            // Everything created between this node's opening tag and its
            // recorded close lies in a contiguous arena index range; an
            // unclosed node's range extends to the end of the arena.
            let Some(current) = tree.get(node) else {
                return;
            };
            let begin = current.begin.map_or(node.0, |b| b.0);
            let end = match current.end {
                Some(end) if end > 0 => end.min(tree.len()),
                _ => tree.len(),
            };
            for index in (begin + 1)..end {
                consider(NodeId(index));
            }
        }
        Combinator::Child => {
            for &child in tree.children(node) {
                consider(child);
            }
        }
        Combinator::NextSibling => {
            if let Some(sibling) = tree.next_sibling(node) {
                consider(sibling);
            }
        }
        Combinator::SubsequentSibling => {
            let Some(parent) = tree.parent(node) else {
                return;
            };
            let siblings = tree.children(parent);
            if let Some(index) = siblings.iter().position(|&c| c == node) {
                for &sibling in &siblings[index + 1..] {
                    consider(sibling);
                }
            }
        }
    }
}

/// Whether `node` satisfies every condition of `compound`.
fn compound_matches(
    tree: &DomTree,
    node: NodeId,
    compound: &Compound,
    lowercase_match: bool,
) -> bool {
    let Some(current) = tree.get(node) else {
        return false;
    };
    if !current.is_element() {
        return false;
    }

    if !compound.tag.is_empty() && compound.tag != "*" {
        let matched = if lowercase_match {
            current.tag.to_lowercase() == compound.tag.to_lowercase()
        } else {
            current.tag == compound.tag
        };
        if !matched {
            return false;
        }
    }

    if !compound.id.is_empty() && current.attr("id").unwrap_or("") != compound.id {
        return false;
    }

    if !compound.classes.is_empty() {
        let class_attr = current.attr("class").unwrap_or("");
        let node_classes: Vec<&str> = class_attr.split_whitespace().collect();
        for class in &compound.classes {
            if !node_classes.contains(&class.as_str()) {
                return false;
            }
        }
    }

    for predicate in &compound.attrs {
        let value = current.get_attribute(&predicate.name);
        let holds = attr_matches(predicate, value);
        if predicate.negated == holds {
            return false;
        }
    }

    true
}

/// Evaluate one attribute predicate (without its negation) against the
/// node's value for that attribute.
///
/// An absent attribute passes only the bare existence test: the dialect
/// this engine reproduces treats `[attr]` as vacuous rather than as a
/// presence requirement, and expresses "must be absent" as `[!attr]`.
fn attr_matches(predicate: &AttrPredicate, value: Option<&AttrValue>) -> bool {
    let Some(value) = value else {
        return predicate.op == AttrOp::Exists;
    };

    let Some(text) = value.as_str() else {
        // Boolean markers have no comparable text: they exist, and they
        // are unequal to every string.
        return matches!(predicate.op, AttrOp::Exists | AttrOp::NotEquals);
    };

    let (value, pattern) = if predicate.case_insensitive {
        (text.to_lowercase(), predicate.value.to_lowercase())
    } else {
        (text.to_string(), predicate.value.clone())
    };

    match predicate.op {
        AttrOp::Exists => true,
        AttrOp::Equals => value == pattern,
        AttrOp::NotEquals => value != pattern,
        AttrOp::Prefix => value.starts_with(&pattern),
        AttrOp::Suffix => pattern.is_empty() || value.ends_with(&pattern),
        AttrOp::Substring => value.contains(&pattern),
        AttrOp::DashMatch => value == pattern || value.starts_with(&format!("{pattern}-")),
        AttrOp::Includes => value.split_whitespace().any(|word| word == pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_parts() {
        let list = parse_selector("div#main.box.wide[type=text]", false);
        assert_eq!(list.len(), 1);
        let compound = &list[0][0];
        assert_eq!(compound.tag, "div");
        assert_eq!(compound.id, "main");
        assert_eq!(compound.classes, vec!["box", "wide"]);
        assert_eq!(compound.attrs.len(), 1);
        assert_eq!(compound.attrs[0].name, "type");
        assert_eq!(compound.attrs[0].op, AttrOp::Equals);
        assert_eq!(compound.attrs[0].value, "text");
    }

    #[test]
    fn parses_combinators_and_lists() {
        let list = parse_selector("ul > li, p + span", false);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0][0].combinator, Combinator::Child);
        assert_eq!(list[1][0].combinator, Combinator::NextSibling);
        assert_eq!(list[0].len(), 2);
        assert_eq!(list[1].len(), 2);
    }

    #[test]
    fn parses_attr_variants() {
        let list = parse_selector("[href^='https'][!data-x][lang|=en i]", false);
        let attrs = &list[0][0].attrs;
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].op, AttrOp::Prefix);
        assert_eq!(attrs[0].value, "https");
        assert!(attrs[1].negated);
        assert_eq!(attrs[1].op, AttrOp::Exists);
        assert_eq!(attrs[2].op, AttrOp::DashMatch);
        assert!(attrs[2].case_insensitive);
    }

    #[test]
    fn empty_selector_yields_no_chains() {
        assert!(parse_selector("", false).is_empty());
        assert!(parse_selector("   ", false).is_empty());
    }
}
