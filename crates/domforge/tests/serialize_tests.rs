//! Integration tests for format-preserving serialization.

use domforge::{Configuration, Document, NodeId};

fn parse(html: &str) -> Document {
    Document::from_html(html).expect("document should parse")
}

/// Parse and immediately re-render.
fn round_trip(html: &str) -> String {
    parse(html).html()
}

#[test]
fn test_round_trip_basic() {
    let html = r#"<div id="main"><p>Hello</p></div>"#;
    assert_eq!(round_trip(html), html);
}

#[test]
fn test_round_trip_attribute_formatting() {
    // Quoting style and the whitespace around every `=` survive.
    let html = r#"<input type = "checkbox" name = 'checkbox1' value = "checkbox1">"#;
    assert_eq!(round_trip(html), html);
}

#[test]
fn test_round_trip_unclosed_tags() {
    let html = "<div><b>okok";
    assert_eq!(round_trip(html), html);
}

#[test]
fn test_round_trip_implicit_closes() {
    for html in [
        "<ul><li>One<li>Two</ul>",
        "<table><tr><td>x</td></table>",
        "<p>One<p>Two",
        "<div><span>x</div>",
    ] {
        assert_eq!(round_trip(html), html);
    }
}

#[test]
fn test_round_trip_protected_regions() {
    for html in [
        "a<!-- hey -->b",
        "<![CDATA[raw < bytes]]>",
        "<?php echo 1; ?>",
        r#"<script type="text/javascript">if(a<b){x()}</script>"#,
        "<style>.c>a{color:red}</style>",
        "<code>&lt;div&gt;</code>",
    ] {
        assert_eq!(round_trip(html), html);
    }
}

#[test]
fn test_round_trip_degraded_markup() {
    for html in ["<x<y>", "<:colon>x", "1 < 2 is true", "<div class"] {
        assert_eq!(round_trip(html), html);
    }
}

#[test]
fn test_round_trip_self_closing_and_voids() {
    for html in [r#"<img src="x"/>"#, r#"<img src="x" />"#, "x<br>y"] {
        assert_eq!(round_trip(html), html);
    }
}

#[test]
fn test_round_trip_preserves_case_when_unfolded() {
    let config = Configuration::default().lowercase(false);
    let html = r#"<DIV CLASS="x">a</DIV>"#;
    let mut doc = Document::from_html_with(html, config).expect("parse");
    assert_eq!(doc.html(), html);
}

#[test]
fn test_tag_case_folds_in_output() {
    assert_eq!(round_trip(r#"<DIV ID="x">a</DIV>"#), r#"<div id="x">a</div>"#);
}

#[test]
fn test_end_tag_padding_is_not_kept() {
    // The close tag is re-emitted from the node's tag name.
    assert_eq!(round_trip("<p>x</p >"), "<p>x</p>");
}

#[test]
fn test_remove_attribute_keeps_neighbor_formatting() {
    let mut doc = parse(r#"<input type = "checkbox" name = 'checkbox1' value = "checkbox1">"#);
    let input = doc.find_one("input").expect("input");
    doc.node_mut(input).expect("node").remove_attribute("value");
    assert_eq!(doc.html(), r#"<input type = "checkbox" name = 'checkbox1'>"#);
}

#[test]
fn test_boolean_attribute_toggle() {
    let mut doc = parse(r#"<input type="a">"#);
    let input = doc.find_one("input").expect("input");

    doc.node_mut(input).expect("node").set_attribute("checked", true);
    assert_eq!(doc.html(), r#"<input type="a" checked>"#);

    doc.node_mut(input).expect("node").set_attribute("checked", false);
    assert_eq!(doc.html(), r#"<input type="a">"#);
    assert!(doc.node(input).expect("node").has_attribute("checked"));
}

#[test]
fn test_clearing_parsed_flag_drops_it_from_output() {
    let mut doc = parse(r#"<input type="checkbox" name="checkbox0" checked value="checkbox0">"#);
    let input = doc.find_one("input").expect("input");
    doc.node_mut(input).expect("node").set_attribute("checked", false);
    assert_eq!(doc.html(), r#"<input type="checkbox" name="checkbox0" value="checkbox0">"#);
}

#[test]
fn test_reserialization_is_idempotent() {
    let first = round_trip("<ul><li>One<li>Two</ul><div><b>okok");
    assert_eq!(round_trip(&first), first);
}

#[test]
fn test_attribute_edit_reuses_captured_quotes() {
    let mut doc = parse("<a href='x'>l</a>");
    let a = doc.find_one("a").expect("a");
    doc.node_mut(a).expect("node").set_attribute("href", "y");
    assert_eq!(doc.html(), "<a href='y'>l</a>");
}

#[test]
fn test_created_elements_synthesize_close_tags() {
    let mut doc = parse("<div></div>");
    let div = doc.find_one("div").expect("div");

    let a = doc.create_element_with("a", Some("link"), [("href", "x")]);
    doc.append_child(div, a);
    assert_eq!(doc.html(), r#"<div><a href="x">link</a></div>"#);
}

#[test]
fn test_created_void_element_is_self_closing() {
    let mut doc = parse("<div></div>");
    let div = doc.find_one("div").expect("div");
    let br = doc.create_element("br");
    doc.append_child(div, br);
    assert_eq!(doc.html(), "<div><br/></div>");
}

#[test]
fn test_created_text_and_comment() {
    let mut doc = parse("<p></p>");
    let p = doc.find_one("p").expect("p");
    let text = doc.create_text("hi ");
    let comment = doc.create_comment("note");
    doc.append_child(p, text);
    doc.append_child(p, comment);
    assert_eq!(doc.html(), "<p>hi <!--note--></p>");
}

#[test]
fn test_callback_mutates_rendered_nodes() {
    let mut doc = parse("<div><b>x</b></div>");
    doc.set_callback(|node| {
        if node.tag == "b" {
            node.tag = "strong".to_string();
        }
    });
    assert_eq!(doc.html(), "<div><strong>x</strong></div>");

    doc.remove_callback();
    // The mutation stuck; only the visitor is gone.
    assert_eq!(doc.html(), "<div><strong>x</strong></div>");
}

#[test]
fn test_outer_override_wins() {
    let mut doc = parse("<div><b>x</b></div>");
    let b = doc.find_one("b").expect("b");
    doc.set_outer_html(b, "<em>y</em>");
    assert_eq!(doc.html(), "<div><em>y</em></div>");
}

#[test]
fn test_set_text_on_text_node() {
    let mut doc = parse("<p>old</p>");
    let p = doc.find_one("p").expect("p");
    let text = doc.tree().child_nodes(p)[0];
    doc.set_text(text, "new");
    assert_eq!(doc.html(), "<p>new</p>");
}

#[test]
fn test_set_inner_html_reparses_fragment() {
    let mut doc = parse(r#"<div id="a"><p>old</p></div>"#);
    let div = doc.find_one("div").expect("div");

    doc.set_inner_html(div, "<span>new</span>");
    assert_eq!(doc.inner_html(div), "<span>new</span>");
    assert_eq!(doc.html(), r#"<div id="a"><span>new</span></div>"#);

    let kids = doc.tree().children(div).to_vec();
    assert_eq!(kids.len(), 1);
    assert_eq!(doc.node(kids[0]).expect("span").tag, "span");
}

#[test]
fn test_set_inner_html_blank_clears_children() {
    let mut doc = parse(r#"<div id="a"><p>old</p></div>"#);
    let div = doc.find_one("div").expect("div");

    doc.set_inner_html(div, "  ");
    assert_eq!(doc.inner_html(div), "");
    assert_eq!(doc.html(), r#"<div id="a"></div>"#);
}

#[test]
fn test_inner_html_of_protected_script() {
    let mut doc = parse("<script>if(a<b){x()}</script>");
    let script = doc.find_one("script").expect("script");
    assert_eq!(doc.inner_html(script), "if(a<b){x()}");
}

#[test]
fn test_text_rendering_rules() {
    let doc = parse("<div><p>Para</p><span>S</span>after</div>");
    assert_eq!(doc.text(), "\n\nParaS after");

    let doc = parse("x<br>y");
    assert_eq!(doc.text(), "x\ny");

    let doc = parse("<script>x()</script>visible<style>.a{}</style>");
    assert_eq!(doc.text(), "visible");
}

#[test]
fn test_text_uses_configured_replacements() {
    let config = Configuration::default()
        .default_br_text(" | ")
        .default_span_text("_");
    let doc = Document::from_html_with("a<br>b<span>c</span>", config).expect("parse");
    assert_eq!(doc.text(), "a | bc_");
}

#[test]
fn test_unknown_id_renders_empty() {
    let mut doc = parse("<p>x</p>");
    assert_eq!(doc.outer_html(NodeId(9999)), "");
    assert_eq!(doc.inner_html(NodeId(9999)), "");
    assert_eq!(doc.text_content(NodeId(9999)), "");
}
