//! DOM Observers
//!
//! MutationObserver registrations live inside the tree. Mutations queue
//! records on every interested registration; the host drains them with
//! [`DomTree::take_records`] once per batch.

use crate::{DomTree, NodeId};

/// Handle to one observer registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// `childList` + `subtree`, the usual dynamic-content watch
    pub fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Default::default()
        }
    }

    fn wants(&self, record: &MutationRecord) -> bool {
        match record.mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::Attributes => {
                self.attributes
                    && match (&self.attribute_filter, &record.attribute_name) {
                        (Some(filter), Some(name)) => filter.iter().any(|f| f == name),
                        _ => true,
                    }
            }
        }
    }
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    /// Whether the record adds or removes nodes
    pub fn changes_children(&self) -> bool {
        self.mutation_type == MutationType::ChildList
            && (!self.added_nodes.is_empty() || !self.removed_nodes.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

#[derive(Debug)]
struct Registration {
    id: ObserverId,
    target: NodeId,
    options: MutationObserverInit,
    records: Vec<MutationRecord>,
}

/// Observer registrations of one tree
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    next_id: u32,
    registrations: Vec<Registration>,
}

impl DomTree {
    /// Start observing `target`
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ObserverId {
        let registry = &mut self.observers;
        let id = ObserverId(registry.next_id);
        registry.next_id += 1;
        registry.registrations.push(Registration {
            id,
            target,
            options,
            records: Vec::new(),
        });
        tracing::debug!("Observer {:?} watching {}", id, target);
        id
    }

    /// Drain queued records. Unknown ids yield nothing.
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .registrations
            .iter_mut()
            .find(|r| r.id == id)
            .map(|r| std::mem::take(&mut r.records))
            .unwrap_or_default()
    }

    /// Whether records are waiting for `id`
    pub fn has_pending_records(&self, id: ObserverId) -> bool {
        self.observers
            .registrations
            .iter()
            .any(|r| r.id == id && !r.records.is_empty())
    }

    /// Stop observing. Safe to call more than once.
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        let before = self.observers.registrations.len();
        self.observers.registrations.retain(|r| r.id != id);
        before != self.observers.registrations.len()
    }

    /// Number of live registrations
    pub fn observer_count(&self) -> usize {
        self.observers.registrations.len()
    }

    pub(crate) fn queue_record(&mut self, record: MutationRecord) {
        if self.observers.registrations.is_empty() {
            return;
        }
        let interested: Vec<usize> = self
            .observers
            .registrations
            .iter()
            .enumerate()
            .filter(|(_, reg)| {
                let in_scope = record.target == reg.target
                    || (reg.options.subtree && self.contains(reg.target, record.target));
                in_scope && reg.options.wants(&record)
            })
            .map(|(i, _)| i)
            .collect();

        for i in interested {
            let reg = &mut self.observers.registrations[i];
            let mut record = record.clone();
            if record.mutation_type == MutationType::Attributes && !reg.options.attribute_old_value {
                record.old_value = None;
            }
            reg.records.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtree_child_list_records() {
        let mut tree = DomTree::new();
        let body = tree.create_element("body");
        let section = tree.create_element("section");
        tree.append_child(tree.root(), body).unwrap();
        tree.append_child(body, section).unwrap();

        let observer = tree.observe(body, MutationObserverInit::child_list_subtree());
        let p = tree.create_element("p");
        tree.append_child(section, p).unwrap();
        tree.set_attribute(p, "class", "x").unwrap();

        let records = tree.take_records(observer);
        assert_eq!(records.len(), 1);
        assert!(records[0].changes_children());
        assert_eq!(records[0].target, section);
        assert!(tree.take_records(observer).is_empty());
    }

    #[test]
    fn test_attribute_filter_and_old_value() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.append_child(tree.root(), div).unwrap();
        tree.set_attribute(div, "class", "a").unwrap();

        let observer = tree.observe(div, MutationObserverInit {
            attributes: true,
            attribute_old_value: true,
            attribute_filter: Some(vec!["class".to_string()]),
            ..Default::default()
        });
        tree.set_attribute(div, "title", "ignored").unwrap();
        tree.set_attribute(div, "class", "b").unwrap();

        let records = tree.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].old_value.as_deref(), Some("a"));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut tree = DomTree::new();
        let observer = tree.observe(tree.root(), MutationObserverInit::child_list_subtree());
        assert!(tree.disconnect(observer));
        assert!(!tree.disconnect(observer));
        assert_eq!(tree.observer_count(), 0);

        let div = tree.create_element("div");
        tree.append_child(tree.root(), div).unwrap();
        assert!(tree.take_records(observer).is_empty());
    }
}
