//! Document - High-level document API

use crate::{DomTree, NodeId};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
}

impl Document {
    /// Create a document with an empty `<html><head></head><body></body></html>` skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Fresh nodes under a fresh root; linking cannot fail
        tree.link_before(NodeId::ROOT, html, NodeId::NONE);
        tree.link_before(html, head, NodeId::NONE);
        tree.link_before(html, body, NodeId::NONE);

        Self { tree, url: url.to_string() }
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
        }
    }

    /// Wrap an already-built tree
    pub fn from_tree(tree: DomTree, url: &str) -> Self {
        Self { tree, url: url.to_string() }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Root `<html>` element
    pub fn document_element(&self) -> Option<NodeId> {
        self.tree.first_element_child(NodeId::ROOT)
    }

    /// `<head>` element
    pub fn head(&self) -> Option<NodeId> {
        self.html_child("head")
    }

    /// `<body>` element
    pub fn body(&self) -> Option<NodeId> {
        self.html_child("body")
    }

    fn html_child(&self, tag: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.tree.element_children(html).find(|&c| self.tree.is_tag(c, tag))
    }

    /// Text of the first `<title>`, if there is one
    pub fn title(&self) -> Option<String> {
        let html = self.document_element()?;
        self.tree
            .descendant_elements(html)
            .find(|&n| self.tree.is_tag(n, "title"))
            .map(|t| self.tree.text_content(t))
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.tree
            .descendant_elements(NodeId::ROOT)
            .find(|&n| self.tree.attr(n, "id") == Some(id))
    }

    /// First free id of the form `prefix-N` (N starting at 1)
    pub fn unique_id(&self, prefix: &str) -> String {
        (1u32..)
            .map(|n| format!("{prefix}-{n}"))
            .find(|candidate| self.get_element_by_id(candidate).is_none())
            .unwrap_or_else(|| prefix.to_string())
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton() {
        let doc = Document::default();
        let html = doc.document_element().unwrap();
        assert!(doc.tree.is_tag(html, "html"));
        assert!(doc.head().is_some());
        assert!(doc.body().is_some());
        assert_eq!(doc.title(), None);
        assert_eq!(doc.url(), "about:blank");
    }

    #[test]
    fn test_unique_id_skips_taken() {
        let mut doc = Document::default();
        let body = doc.body().unwrap();
        let input = doc.tree.create_element("input");
        doc.tree.append_child(body, input).unwrap();
        doc.tree.set_attribute(input, "id", "field-1").unwrap();

        assert_eq!(doc.unique_id("field"), "field-2");
        assert_eq!(doc.get_element_by_id("field-1"), Some(input));
    }

    #[test]
    fn test_empty_document_has_no_body() {
        let doc = Document::empty("about:blank");
        assert_eq!(doc.body(), None);
        assert_eq!(doc.document_element(), None);
    }
}
