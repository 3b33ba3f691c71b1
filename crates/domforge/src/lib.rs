//! Lenient HTML parsing with byte-faithful serialization.
//!
//! Unlike a conforming WHATWG parser, this one accepts anything: malformed
//! markup degrades to text, tags left open are recovered or left exactly
//! as written, and an unmodified document serializes back byte for byte,
//! original quoting and whitespace included. On top of the parse it offers
//! a CSS-subset query surface and format-preserving edits.
//!
//! ```
//! use domforge::Document;
//!
//! let mut doc = Document::from_html("<div id=\"main\"><p>Hi</p></div>")?;
//! let main = doc.find_one("#main").unwrap();
//! assert_eq!(doc.outer_html(main), "<div id=\"main\"><p>Hi</p></div>");
//! # Ok::<(), domforge::LoadError>(())
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod noise;
pub mod void_tags;
pub mod warning;

mod encoding;
mod parser;
mod scanner;
mod serialize;

pub use config::Configuration;
pub use document::{Document, NodeCallback};
pub use error::LoadError;
pub use noise::NoiseMap;

pub use domforge_dom::{
    AttrSpacing, Attribute, AttrValue, DomTree, Node, NodeId, NodeType, QuoteStyle,
};
pub use domforge_selector::{parse_selector, select, AttrOp, Combinator, Compound, SelectorList};
