//! domforge CLI
//!
//! Parse an HTML document, optionally run a selector against it, and
//! print what was found.

use anyhow::Result;
use domforge::{Document, NodeId, NodeType};
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: domforge <file.html> [selector]");
        eprintln!("       domforge --html '<div>...</div>' [selector]");
        std::process::exit(1);
    }

    let (mut doc, selector) = if args[1] == "--html" {
        if args.len() < 3 {
            eprintln!("Error: --html requires an HTML string argument");
            std::process::exit(1);
        }
        (Document::from_html(&args[2])?, args.get(3))
    } else {
        (Document::from_file(&args[1])?, args.get(2))
    };

    if let Some(selector) = selector {
        let matches = doc.find(selector);
        println!("=== {} match(es) for {selector} ===", matches.len());
        for id in matches {
            println!("{}", doc.outer_html(id));
        }
        return Ok(());
    }

    println!("=== Document ===");
    println!("nodes:   {}", doc.tree().len());
    println!("charset: {}", doc.charset());

    println!("\n=== Tree ===");
    print_tree(&doc, doc.tree().root(), 0);

    println!("\n=== Markup ===");
    println!("{}", doc.html());

    Ok(())
}

/// Print one node per line, indented by depth.
fn print_tree(doc: &Document, id: NodeId, depth: usize) {
    let Some(node) = doc.node(id) else {
        return;
    };

    let indent = "  ".repeat(depth);
    match node.node_type {
        NodeType::Element | NodeType::Root => {
            println!("{indent}<{}> [{}]", node.tag, node.node_type);
            for &child in doc.tree().child_nodes(id) {
                print_tree(doc, child, depth + 1);
            }
        }
        _ => {
            let preview: String = node
                .text
                .as_deref()
                .unwrap_or("")
                .chars()
                .take(40)
                .collect();
            println!("{indent}{} {preview:?}", node.node_type);
        }
    }
}
