//! Integration tests for arena structure and mutation.

use domforge_dom::{
    AttrSpacing, Attribute, AttrValue, DomTree, Node, NodeId, NodeType, QuoteStyle,
};

fn element(tree: &mut DomTree, tag: &str) -> NodeId {
    tree.alloc(Node::new(NodeType::Element, tag))
}

#[test]
fn test_new_tree_holds_only_root() {
    let tree = DomTree::new();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.root(), NodeId::ROOT);
    assert_eq!(tree[NodeId::ROOT].node_type, NodeType::Root);
    assert_eq!(tree[NodeId::ROOT].tag, "root");
}

#[test]
fn test_append_child_links_both_lists() {
    let mut tree = DomTree::new();
    let div = element(&mut tree, "div");
    tree.append_child(tree.root(), div);

    assert_eq!(tree.parent(div), Some(NodeId::ROOT));
    assert_eq!(tree.children(NodeId::ROOT), &[div]);
    assert_eq!(tree.child_nodes(NodeId::ROOT), &[div]);
}

#[test]
fn test_non_structural_link_lands_in_nodes_only() {
    let mut tree = DomTree::new();
    let text = tree.alloc(Node::new(NodeType::Text, "text"));
    tree.link(tree.root(), text, false);

    assert!(tree.children(NodeId::ROOT).is_empty());
    assert_eq!(tree.child_nodes(NodeId::ROOT), &[text]);
    assert_eq!(tree.parent(text), Some(NodeId::ROOT));
}

#[test]
fn test_sibling_navigation() {
    let mut tree = DomTree::new();
    let a = element(&mut tree, "a");
    let b = element(&mut tree, "b");
    let c = element(&mut tree, "c");
    for id in [a, b, c] {
        tree.append_child(tree.root(), id);
    }

    assert_eq!(tree.first_child(NodeId::ROOT), Some(a));
    assert_eq!(tree.last_child(NodeId::ROOT), Some(c));
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.next_sibling(c), None);
    assert_eq!(tree.prev_sibling(b), Some(a));
    assert_eq!(tree.prev_sibling(a), None);
}

#[test]
fn test_insert_before_reference() {
    let mut tree = DomTree::new();
    let a = element(&mut tree, "a");
    let c = element(&mut tree, "c");
    tree.append_child(tree.root(), a);
    tree.append_child(tree.root(), c);

    let b = element(&mut tree, "b");
    tree.insert_before(tree.root(), b, c);
    assert_eq!(tree.children(NodeId::ROOT), &[a, b, c]);
    assert_eq!(tree.parent(b), Some(NodeId::ROOT));
}

#[test]
fn test_insert_before_missing_reference_appends() {
    let mut tree = DomTree::new();
    let a = element(&mut tree, "a");
    tree.append_child(tree.root(), a);

    let detached = element(&mut tree, "x");
    let b = element(&mut tree, "b");
    tree.insert_before(tree.root(), b, detached);
    assert_eq!(tree.children(NodeId::ROOT), &[a, b]);
}

#[test]
fn test_remove_child_detaches() {
    let mut tree = DomTree::new();
    let a = element(&mut tree, "a");
    let b = element(&mut tree, "b");
    tree.append_child(tree.root(), a);
    tree.append_child(tree.root(), b);

    assert_eq!(tree.remove_child(tree.root(), a), Some(a));
    assert_eq!(tree.children(NodeId::ROOT), &[b]);
    assert!(tree.child_nodes(NodeId::ROOT) == &[b]);
    assert_eq!(tree.parent(a), None);

    // The arena entry itself survives; indices are stable.
    assert!(tree.get(a).is_some());
}

#[test]
fn test_remove_child_of_non_child_returns_none() {
    let mut tree = DomTree::new();
    let a = element(&mut tree, "a");
    assert_eq!(tree.remove_child(tree.root(), a), None);
}

#[test]
fn test_set_attribute_keeps_captured_metadata() {
    let mut node = Node::new(NodeType::Element, "input");
    node.attributes.push(Attribute {
        name: "type".to_string(),
        value: AttrValue::Text("checkbox".to_string()),
        quote: QuoteStyle::Single,
        spacing: AttrSpacing {
            before: "  ".to_string(),
            before_eq: " ".to_string(),
            after_eq: " ".to_string(),
        },
    });

    node.set_attribute("type", "radio");
    let attr = node.attribute("type").unwrap();
    assert_eq!(attr.value.as_str(), Some("radio"));
    assert_eq!(attr.quote, QuoteStyle::Single);
    assert_eq!(attr.spacing.before, "  ");
}

#[test]
fn test_set_new_attribute_gets_programmatic_defaults() {
    let mut node = Node::new(NodeType::Element, "div");
    node.set_attribute("data-x", "1");

    let attr = node.attribute("data-x").unwrap();
    assert_eq!(attr.quote, QuoteStyle::Double);
    assert_eq!(attr.spacing, AttrSpacing::default());
}

#[test]
fn test_boolean_attribute_values() {
    let mut node = Node::new(NodeType::Element, "input");
    node.set_attribute("checked", true);

    assert!(node.has_attribute("checked"));
    assert_eq!(node.attr("checked"), None);
    assert!(node.get_attribute("checked").unwrap().is_truthy());

    node.set_attribute("checked", false);
    // Suppressed, but still present in the list.
    assert!(node.has_attribute("checked"));
    assert!(!node.get_attribute("checked").unwrap().is_truthy());
}

#[test]
fn test_remove_attribute_drops_entry() {
    let mut node = Node::new(NodeType::Element, "a");
    node.set_attribute("href", "x");
    node.remove_attribute("href");
    assert!(!node.has_attribute("href"));
}

#[test]
fn test_attribute_new_picks_quote_by_value() {
    assert_eq!(Attribute::new("id", "x").quote, QuoteStyle::Double);
    assert_eq!(Attribute::new("checked", true).quote, QuoteStyle::None);
}

#[test]
fn test_node_predicates() {
    let mut node = Node::new(NodeType::Element, "fbt:param");
    assert!(node.is_element());
    assert!(node.is_namespaced());
    assert!(!node.is_self_closing());
    node.end_space = " /".to_string();
    assert!(node.is_self_closing());
}

#[test]
fn test_clear_empties_arena() {
    let mut tree = DomTree::new();
    element(&mut tree, "div");
    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
}
