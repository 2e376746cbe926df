//! DOM Node Operations
//!
//! Core node manipulation: appendChild, removeChild, insertBefore and
//! attribute writes. Every operation honours the read-only lock, records
//! an undo entry while a checkpoint is open and queues mutation records
//! for interested observers.

use crate::tree::UndoOp;
use crate::{DomTree, MutationRecord, MutationType, Node, NodeId};
use thiserror::Error;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// Node not found
    #[error("Node not found: {0}")]
    NotFound(NodeId),
    /// Hierarchy error (e.g., inserting ancestor)
    #[error("Hierarchy request error")]
    HierarchyRequest,
    /// Invalid node type
    #[error("Invalid node type")]
    InvalidNodeType,
    /// Node is not a child
    #[error("Node is not a child")]
    NotAChild,
    /// Document is locked against mutation
    #[error("Document is read-only")]
    ReadOnly,
}

impl DomTree {
    fn ensure_writable(&self) -> DomResult<()> {
        if self.read_only {
            return Err(DomError::ReadOnly);
        }
        Ok(())
    }

    fn ensure_exists(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    /// Append a child node
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (append when `None`).
    ///
    /// A child that is already attached somewhere is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.ensure_writable()?;
        let parent_node = self.ensure_exists(parent)?;
        if parent_node.is_text() {
            return Err(DomError::InvalidNodeType);
        }
        self.ensure_exists(child)?;
        if child == NodeId::ROOT || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        let next = match reference {
            Some(r) => {
                if self.ensure_exists(r)?.parent != parent {
                    return Err(DomError::NotAChild);
                }
                r
            }
            None => NodeId::NONE,
        };
        if next == child {
            return Ok(child);
        }

        let old_parent = self.nodes[child.index()].parent;
        if old_parent.is_valid() {
            self.remove_child(old_parent, child)?;
        }

        self.link_before(parent, child, next);
        self.record_undo(UndoOp::Inserted { node: child });

        let record = MutationRecord {
            mutation_type: MutationType::ChildList,
            target: parent,
            added_nodes: vec![child],
            removed_nodes: Vec::new(),
            previous_sibling: self.nodes[child.index()].prev_sibling.to_option(),
            next_sibling: next.to_option(),
            attribute_name: None,
            old_value: None,
        };
        self.queue_record(record);
        Ok(child)
    }

    /// Remove a child node. The node stays in the arena, detached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.ensure_writable()?;
        self.ensure_exists(parent)?;
        let node = self.ensure_exists(child)?;
        if node.parent != parent {
            return Err(DomError::NotAChild);
        }
        let prev = node.prev_sibling;
        let next = node.next_sibling;

        // Queue before unlinking so subtree observers still see the target
        let record = MutationRecord {
            mutation_type: MutationType::ChildList,
            target: parent,
            added_nodes: Vec::new(),
            removed_nodes: vec![child],
            previous_sibling: prev.to_option(),
            next_sibling: next.to_option(),
            attribute_name: None,
            old_value: None,
        };
        self.queue_record(record);

        self.unlink(child);
        self.record_undo(UndoOp::Detached { node: child, parent, next });
        Ok(child)
    }

    /// Set an attribute. Writing the current value is a no-op.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.ensure_writable()?;
        let elem = self
            .get_mut(id)
            .ok_or(DomError::NotFound(id))?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        if elem.get_attr(name) == Some(value) {
            return Ok(());
        }
        let old = elem.set_attr(name, value);

        self.record_undo(UndoOp::SetAttr {
            node: id,
            name: name.to_ascii_lowercase(),
            old: old.clone(),
        });
        self.queue_attribute_record(id, name, old);
        Ok(())
    }

    /// Remove an attribute; returns whether it was present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<bool> {
        self.ensure_writable()?;
        let elem = self
            .get_mut(id)
            .ok_or(DomError::NotFound(id))?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        let Some((index, value)) = elem.remove_attr(name) else {
            return Ok(false);
        };

        self.record_undo(UndoOp::RemoveAttr {
            node: id,
            name: name.to_ascii_lowercase(),
            index,
            value: value.clone(),
        });
        self.queue_attribute_record(id, name, Some(value));
        Ok(true)
    }

    fn queue_attribute_record(&mut self, id: NodeId, name: &str, old: Option<String>) {
        let record = MutationRecord {
            mutation_type: MutationType::Attributes,
            target: id,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name.to_ascii_lowercase()),
            old_value: old,
        };
        self.queue_record(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_blocks_every_mutation() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.append_child(tree.root(), div).unwrap();

        tree.set_read_only(true);
        let span = tree.create_element("span");
        assert_eq!(tree.append_child(div, span), Err(DomError::ReadOnly));
        assert_eq!(tree.set_attribute(div, "id", "x"), Err(DomError::ReadOnly));
        assert_eq!(tree.remove_attribute(div, "id"), Err(DomError::ReadOnly));
        assert_eq!(tree.remove_child(tree.root(), div), Err(DomError::ReadOnly));

        tree.set_read_only(false);
        assert!(tree.append_child(div, span).is_ok());
    }

    #[test]
    fn test_hierarchy_errors() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();

        assert_eq!(tree.append_child(inner, outer), Err(DomError::HierarchyRequest));
        assert_eq!(tree.append_child(outer, outer), Err(DomError::HierarchyRequest));

        let stray = tree.create_element("p");
        let other = tree.create_element("p");
        assert_eq!(
            tree.insert_before(outer, stray, Some(other)),
            Err(DomError::NotAChild)
        );
        assert_eq!(tree.remove_child(outer, stray), Err(DomError::NotAChild));
    }

    #[test]
    fn test_insert_moves_attached_node() {
        let mut tree = DomTree::new();
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        let child = tree.create_element("span");
        tree.append_child(a, child).unwrap();
        tree.append_child(b, child).unwrap();

        assert_eq!(tree.children(a).count(), 0);
        assert_eq!(tree.parent(child), Some(b));
    }

    #[test]
    fn test_attribute_removal_reports_presence() {
        let mut tree = DomTree::new();
        let input = tree.create_element("input");
        tree.set_attribute(input, "aria-invalid", "true").unwrap();
        assert_eq!(tree.remove_attribute(input, "aria-invalid"), Ok(true));
        assert_eq!(tree.remove_attribute(input, "aria-invalid"), Ok(false));
    }
}
