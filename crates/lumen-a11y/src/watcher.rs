//! Change watcher
//!
//! Wraps one mutation observer registration on the document. The host
//! delivers batches; the watcher only decides whether a batch is worth a
//! new pass and drains the records the auditor's own fixes produced.

use lumen_dom::{Document, DomTree, MutationObserverInit, MutationRecord, NodeId, ObserverId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchState {
    #[default]
    Stopped,
    Watching,
}

#[derive(Debug, Default)]
pub struct ChangeWatcher {
    observer: Option<ObserverId>,
}

impl ChangeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe child-list changes under `<body>`, or the whole document
    /// when there is no body. Returns false if already watching.
    pub fn start(&mut self, document: &mut Document) -> bool {
        if self.observer.is_some() {
            return false;
        }
        let target = document.body().unwrap_or(NodeId::ROOT);
        let id = document.tree.observe(target, MutationObserverInit::child_list_subtree());
        self.observer = Some(id);
        tracing::debug!("Watching {} for changes", target);
        true
    }

    pub fn is_watching(&self) -> bool {
        self.observer.is_some()
    }

    pub fn state(&self) -> WatchState {
        if self.is_watching() { WatchState::Watching } else { WatchState::Stopped }
    }

    /// Drain the pending batch. `None` when not watching.
    pub fn take_batch(&self, tree: &mut DomTree) -> Option<Vec<MutationRecord>> {
        self.observer.map(|id| tree.take_records(id))
    }

    /// Whether a batch adds or removes any node
    pub fn is_relevant(batch: &[MutationRecord]) -> bool {
        batch.iter().any(MutationRecord::changes_children)
    }

    /// Drop queued records without acting on them
    pub fn discard_pending(&self, tree: &mut DomTree) {
        if let Some(id) = self.observer {
            let dropped = tree.take_records(id).len();
            if dropped > 0 {
                tracing::trace!("Discarded {} record(s) from our own pass", dropped);
            }
        }
    }

    /// Disconnect. Safe to call more than once.
    pub fn stop(&mut self, tree: &mut DomTree) -> bool {
        match self.observer.take() {
            Some(id) => tree.disconnect(id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut doc = Document::new("about:blank");
        let mut watcher = ChangeWatcher::new();
        assert_eq!(watcher.state(), WatchState::Stopped);
        assert!(watcher.take_batch(&mut doc.tree).is_none());

        assert!(watcher.start(&mut doc));
        assert!(!watcher.start(&mut doc));
        assert_eq!(doc.tree.observer_count(), 1);

        let body = doc.body().unwrap();
        let div = doc.tree.create_element("div");
        doc.tree.append_child(body, div).unwrap();
        let batch = watcher.take_batch(&mut doc.tree).unwrap();
        assert!(ChangeWatcher::is_relevant(&batch));
        assert!(watcher.take_batch(&mut doc.tree).unwrap().is_empty());

        assert!(watcher.stop(&mut doc.tree));
        assert!(!watcher.stop(&mut doc.tree));
        assert_eq!(doc.tree.observer_count(), 0);
    }

    #[test]
    fn test_attribute_changes_are_not_observed() {
        let mut doc = Document::new("about:blank");
        let mut watcher = ChangeWatcher::new();
        watcher.start(&mut doc);
        let body = doc.body().unwrap();
        doc.tree.set_attribute(body, "class", "dark").unwrap();
        let batch = watcher.take_batch(&mut doc.tree).unwrap();
        assert!(!ChangeWatcher::is_relevant(&batch));
    }

    #[test]
    fn test_discard_pending() {
        let mut doc = Document::new("about:blank");
        let mut watcher = ChangeWatcher::new();
        watcher.start(&mut doc);
        let body = doc.body().unwrap();
        let p = doc.tree.create_element("p");
        doc.tree.append_child(body, p).unwrap();
        watcher.discard_pending(&mut doc.tree);
        assert!(!doc.tree.has_pending_records(watcher.observer.unwrap()));
    }
}
