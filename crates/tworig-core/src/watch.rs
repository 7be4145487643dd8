//! Per-element visibility watching for lazily rewritten images.
//!
//! Each image is watched until it first becomes visible, rewritten once, and
//! then dropped from the watch set, so a long-running feed does not
//! accumulate observations.

use std::collections::BTreeSet;

use crate::dom::{Document, NodeId};
use crate::rewriter::{PageRewriter, RewriteEvent};

#[derive(Debug, Clone, Default)]
pub struct VisibilityWatcher {
    observed: BTreeSet<NodeId>,
}

impl VisibilityWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching `id`. Returns false if it was already watched.
    pub fn observe(&mut self, id: NodeId) -> bool {
        self.observed.insert(id)
    }

    pub fn unobserve(&mut self, id: NodeId) -> bool {
        self.observed.remove(&id)
    }

    pub fn is_observing(&self, id: NodeId) -> bool {
        self.observed.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Watches `id` (if it is an image) and every image below it.
    pub fn observe_images(&mut self, doc: &Document, id: NodeId) -> usize {
        let mut added = 0;
        if doc.get(id).map(|e| e.tag() == "img").unwrap_or(false) && self.observe(id) {
            added += 1;
        }
        for img in doc.descendants_by_tag(id, "img") {
            if self.observe(img) {
                added += 1;
            }
        }
        added
    }

    /// Handles a batch of elements entering the viewport.
    ///
    /// Watched elements are rewritten and unobserved whether or not anything
    /// changed; unwatched ones are ignored.
    pub fn on_visible(
        &mut self,
        rewriter: &PageRewriter,
        doc: &mut Document,
        visible: &[NodeId],
    ) -> Vec<RewriteEvent> {
        let mut events = Vec::new();
        for &id in visible {
            if !self.unobserve(id) {
                continue;
            }
            events.extend(rewriter.process_node(doc, id));
        }
        tracing::trace!("visibility batch done, {} still watched", self.observed.len());
        events
    }

    /// Stops watching everything.
    pub fn disconnect(&mut self) {
        self.observed.clear();
    }
}
