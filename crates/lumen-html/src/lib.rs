//! Lumen HTML
//!
//! HTML5 parsing built on html5ever, converted into the arena DOM, plus
//! the serializer used to snapshot documents.

mod parser;
mod serializer;

pub use parser::HtmlParser;
pub use serializer::{HtmlSerializer, escape_attribute, escape_text};
pub use lumen_dom::{Document, DomTree, Node, NodeId};

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Document {
    HtmlParser::new().parse(html)
}

/// Parse an HTML string with a base URL
pub fn parse_with_url(html: &str, url: &str) -> Document {
    HtmlParser::new().parse_with_url(html, url)
}

/// Serialize a whole document
pub fn serialize(document: &Document) -> String {
    HtmlSerializer::new().serialize_outer(document.tree(), NodeId::ROOT)
}
