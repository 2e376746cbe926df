//! Lumen DOM - Document Object Model
//!
//! Arena-based DOM tree that the accessibility engine reads and repairs.
//! Nodes are addressed by [`NodeId`]; ids stay valid after a node is
//! detached, so callers holding one must check [`DomTree::is_attached`].

mod node;
mod tree;
mod document;
mod operations;
mod observer;
mod selector;

pub use node::{Node, NodeData, ElementData, Attribute};
pub use tree::{DomTree, Children, Descendants, Ancestors};
pub use document::Document;
pub use operations::{DomError, DomResult};
pub use observer::{
    MutationObserverInit, MutationRecord, MutationType, ObserverId,
};
pub use selector::{Selector, SelectorError, MatchState, Specificity};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Whether this id refers to a node at all
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Wrap an `Option`, mapping `None` to [`NodeId::NONE`]
    #[inline]
    pub(crate) fn from_option(id: Option<NodeId>) -> NodeId {
        id.unwrap_or(Self::NONE)
    }

    /// `None` for the sentinel
    #[inline]
    pub fn to_option(self) -> Option<NodeId> {
        if self.is_valid() { Some(self) } else { None }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#none")
        }
    }
}
