//! HTML5 Parser implementation
//!
//! Parses with html5ever into an `RcDom`, then copies the result into the
//! arena tree. Whitespace-only text is kept so that serializing an
//! untouched document reproduces its structure exactly.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use lumen_dom::{Document, DomResult, DomTree, NodeId};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// HTML5 parser
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut tree = DomTree::new();
        if let Err(err) = self.convert_children(&dom.document, &mut tree, NodeId::ROOT) {
            tracing::warn!("HTML conversion stopped early: {}", err);
        }

        tracing::debug!("Parsed {} nodes", tree.len());
        Document::from_tree(tree, url)
    }

    fn convert_children(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) -> DomResult<()> {
        for child in handle.children.borrow().iter() {
            self.convert_node(child, tree, parent)?;
        }
        Ok(())
    }

    /// Convert an RcDom node to our DOM format
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) -> DomResult<()> {
        match &handle.data {
            RcNodeData::Document => self.convert_children(handle, tree, parent)?,
            RcNodeData::Doctype { name, .. } => {
                let id = tree.create_doctype(name.to_string());
                tree.append_child(parent, id)?;
            }
            RcNodeData::Text { contents } => {
                let id = tree.create_text(contents.borrow().to_string());
                tree.append_child(parent, id)?;
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(contents.to_string());
                tree.append_child(parent, id)?;
            }
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    let attr_name = match &attr.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                        None => attr.name.local.to_string(),
                    };
                    tree.set_attribute(id, &attr_name, &attr.value)?;
                }
                tree.append_child(parent, id)?;

                // Template contents live outside the tree and are skipped
                self.convert_children(handle, tree, id)?;
            }
            RcNodeData::ProcessingInstruction { .. } => {}
        }
        Ok(())
    }
}
