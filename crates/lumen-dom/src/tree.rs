//! DOM Tree (arena-based allocation)
//!
//! Owns every node of a document plus the bookkeeping that rides along with
//! mutation: the read-only lock, the undo journal behind checkpoints, and
//! the mutation observer registry.

use crate::observer::ObserverRegistry;
use crate::{ElementData, Node, NodeData, NodeId};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) read_only: bool,
    pub(crate) journal: Vec<UndoOp>,
    pub(crate) checkpoints: Vec<usize>,
    pub(crate) observers: ObserverRegistry,
}

/// One reversible change recorded while a checkpoint is open
#[derive(Debug, Clone)]
pub(crate) enum UndoOp {
    /// Attribute was created (`old == None`) or overwritten
    SetAttr {
        node: NodeId,
        name: String,
        old: Option<String>,
    },
    /// Attribute was removed from position `index`
    RemoveAttr {
        node: NodeId,
        name: String,
        index: usize,
        value: String,
    },
    /// Node was linked under a parent
    Inserted { node: NodeId },
    /// Node was unlinked; `next` is the sibling it sat before
    Detached {
        node: NodeId,
        parent: NodeId,
        next: NodeId,
    },
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            read_only: false,
            journal: Vec::new(),
            checkpoints: Vec::new(),
            observers: ObserverRegistry::default(),
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(Node::text(content))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.push(Node::comment(content))
    }

    /// Create a detached doctype
    pub fn create_doctype(&mut self, name: impl Into<String>) -> NodeId {
        self.push(Node::doctype(name))
    }

    // ---- element accessors ----

    /// Element data, `None` for non-elements
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Lower-case tag name
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Whether `id` is an element named `tag`
    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id) == Some(tag)
    }

    /// Attribute value
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.get_attr(name))
    }

    /// Attribute presence
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_attr(name))
    }

    /// Attribute value with surrounding whitespace removed; `None` when blank
    pub fn attr_trimmed(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attr(id, name).map(str::trim).filter(|v| !v.is_empty())
    }

    // ---- structure ----

    /// Parent node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.to_option())
    }

    /// Parent, if it is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.element(p).is_some())
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    /// Element children in order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .filter(|(_, node)| node.is_element())
            .map(|(child, _)| child)
    }

    /// First element child
    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.element_children(id).next()
    }

    /// Nearest preceding sibling that is an element
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.prev_sibling;
        while current.is_valid() {
            let node = self.get(current)?;
            if node.is_element() {
                return Some(current);
            }
            current = node.prev_sibling;
        }
        None
    }

    /// Nearest following sibling that is an element
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.next_sibling;
        while current.is_valid() {
            let node = self.get(current)?;
            if node.is_element() {
                return Some(current);
            }
            current = node.next_sibling;
        }
        None
    }

    /// Ancestors from the parent up to the document node
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).map_or(NodeId::NONE, |n| n.parent),
        }
    }

    /// Pre-order descendants of `id`, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: self.get(id).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Element descendants in document order
    pub fn descendant_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id).filter(|&d| self.element(d).is_some())
    }

    /// Whether `id` is reachable from the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        if id == NodeId::ROOT {
            return true;
        }
        if self.get(id).is_none() {
            return false;
        }
        self.ancestors(id).any(|a| a == NodeId::ROOT)
    }

    /// Inclusive containment check
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(text)) => text.clone(),
            Some(_) => {
                let mut out = String::new();
                for d in self.descendants(id) {
                    if let Some(text) = self.get(d).and_then(Node::as_text) {
                        out.push_str(text);
                    }
                }
                out
            }
            None => String::new(),
        }
    }

    // ---- read-only lock ----

    /// Lock or unlock the tree against mutation
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    // ---- checkpoints ----

    /// Start recording changes so they can be rolled back
    pub fn checkpoint(&mut self) {
        self.checkpoints.push(self.journal.len());
    }

    /// Keep every change made since the last checkpoint
    pub fn commit(&mut self) {
        self.checkpoints.pop();
        if self.checkpoints.is_empty() {
            self.journal.clear();
        }
    }

    /// Undo every change made since the last checkpoint.
    ///
    /// Returns the number of undone operations. Observer records are not
    /// queued for the reverse changes.
    pub fn rollback(&mut self) -> usize {
        let Some(mark) = self.checkpoints.pop() else {
            return 0;
        };
        let mut undone = 0;
        while self.journal.len() > mark {
            let Some(op) = self.journal.pop() else { break };
            self.undo(op);
            undone += 1;
        }
        if self.checkpoints.is_empty() {
            self.journal.clear();
        }
        tracing::debug!("Rolled back {} DOM change(s)", undone);
        undone
    }

    pub(crate) fn recording(&self) -> bool {
        !self.checkpoints.is_empty()
    }

    pub(crate) fn record_undo(&mut self, op: UndoOp) {
        if self.recording() {
            self.journal.push(op);
        }
    }

    fn undo(&mut self, op: UndoOp) {
        match op {
            UndoOp::SetAttr { node, name, old } => {
                if let Some(elem) = self.get_mut(node).and_then(Node::as_element_mut) {
                    match old {
                        Some(value) => {
                            elem.set_attr(&name, value);
                        }
                        None => {
                            elem.remove_attr(&name);
                        }
                    }
                }
            }
            UndoOp::RemoveAttr { node, name, index, value } => {
                if let Some(elem) = self.get_mut(node).and_then(Node::as_element_mut) {
                    elem.insert_attr_at(index, &name, value);
                }
            }
            UndoOp::Inserted { node } => self.unlink(node),
            UndoOp::Detached { node, parent, next } => self.link_before(parent, node, next),
        }
    }

    // ---- raw linking (no checks, no journal, no records) ----

    pub(crate) fn link_before(&mut self, parent: NodeId, child: NodeId, next: NodeId) {
        let prev = if next.is_valid() {
            self.nodes[next.index()].prev_sibling
        } else {
            self.nodes[parent.index()].last_child
        };

        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }
    }

    pub(crate) fn unlink(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[child.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(id, node)` children pairs
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Iterator walking parent links upwards
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        self.next = self.tree.get(id).map_or(NodeId::NONE, |n| n.parent);
        Some(id)
    }
}

/// Pre-order subtree iterator
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        let node = self.tree.get(current)?;

        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            let mut cursor = current;
            loop {
                if cursor == self.root {
                    break NodeId::NONE;
                }
                let Some(n) = self.tree.get(cursor) else {
                    break NodeId::NONE;
                };
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                cursor = n.parent;
                if !cursor.is_valid() || cursor == self.root {
                    break NodeId::NONE;
                }
            }
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let body = tree.create_element("body");
        let p = tree.create_element("p");
        let text = tree.create_text("hello");
        tree.append_child(tree.root(), html).unwrap();
        tree.append_child(html, body).unwrap();
        tree.append_child(body, p).unwrap();
        tree.append_child(p, text).unwrap();
        (tree, html, body, p)
    }

    #[test]
    fn test_descendants_preorder() {
        let (tree, html, body, p) = sample();
        let order: Vec<NodeId> = tree.descendants(tree.root()).collect();
        assert_eq!(order.len(), 4);
        assert_eq!(&order[..3], &[html, body, p]);

        // Subtree walk stays inside the subtree
        assert_eq!(tree.descendants(p).count(), 1);
    }

    #[test]
    fn test_attachment_and_text() {
        let (mut tree, _, body, p) = sample();
        assert!(tree.is_attached(p));
        assert_eq!(tree.text_content(body), "hello");

        tree.remove_child(body, p).unwrap();
        assert!(!tree.is_attached(p));
        assert_eq!(tree.text_content(body), "");
    }

    #[test]
    fn test_rollback_restores_structure_and_attributes() {
        let (mut tree, _, body, p) = sample();
        tree.set_attribute(p, "class", "intro").unwrap();

        tree.checkpoint();
        tree.set_attribute(p, "class", "changed").unwrap();
        tree.set_attribute(p, "title", "x").unwrap();
        let span = tree.create_element("span");
        tree.insert_before(body, span, Some(p)).unwrap();
        tree.remove_child(body, p).unwrap();
        assert_eq!(tree.rollback(), 4);

        assert_eq!(tree.attr(p, "class"), Some("intro"));
        assert!(!tree.has_attr(p, "title"));
        assert!(!tree.is_attached(span));
        assert_eq!(tree.first_element_child(body), Some(p));
    }

    #[test]
    fn test_commit_keeps_changes() {
        let (mut tree, _, _, p) = sample();
        tree.checkpoint();
        tree.set_attribute(p, "lang", "fr").unwrap();
        tree.commit();
        assert_eq!(tree.rollback(), 0);
        assert_eq!(tree.attr(p, "lang"), Some("fr"));
    }
}
