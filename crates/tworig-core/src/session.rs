//! The observe loop: apply page events, rewrite, repeat until unload.
//!
//! Everything runs on one task. Each event is applied and every mutation
//! record it causes (including those from the rewriter's own writes) is
//! handled before the next event is taken.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::dom::{Document, DomError, ElementSnapshot, MutationRecord, NodeId, ObserverOptions};
use crate::rewriter::{PageRewriter, RewriteEvent};
use crate::watch::VisibilityWatcher;

/// Something the page did. Serialized as JSON with a `type` tag.
///
/// Inserted elements get ids in pre-order, continuing from the document's
/// current size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    Insert {
        /// Parent element; the root when absent.
        #[serde(default)]
        parent: Option<NodeId>,
        element: ElementSnapshot,
    },
    SetAttribute {
        node: NodeId,
        name: String,
        value: String,
    },
    RemoveAttribute {
        node: NodeId,
        name: String,
    },
    /// Elements entered the viewport.
    Visible { nodes: Vec<NodeId> },
    /// Pointer over / click on an element.
    Hover { node: NodeId },
    Unload,
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub events: usize,
    pub rewrites: usize,
    pub rejected_events: usize,
}

/// An attached in-page rewriter for one document.
#[derive(Debug)]
pub struct Session {
    doc: Document,
    rewriter: PageRewriter,
    /// Present when images are rewritten only once visible.
    watcher: Option<VisibilityWatcher>,
    summary: SessionSummary,
}

impl Session {
    /// Attaches the observer to `doc`.
    pub fn new(mut doc: Document, rewriter: PageRewriter, lazy_images: bool) -> Self {
        doc.observe(ObserverOptions::page_rewriter());
        Self {
            doc,
            rewriter,
            watcher: lazy_images.then(VisibilityWatcher::new),
            summary: SessionSummary::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Images still waiting to become visible (0 when not lazy).
    pub fn watched(&self) -> usize {
        self.watcher.as_ref().map(|w| w.len()).unwrap_or(0)
    }

    /// Handles whatever the document already contains.
    pub fn scan_existing(&mut self) -> Vec<RewriteEvent> {
        let root = self.doc.root();
        let mut events = match &mut self.watcher {
            None => self.rewriter.scan_document(&mut self.doc),
            Some(watcher) => {
                watcher.observe_images(&self.doc, root);
                self.rewriter.process_anchors(&mut self.doc, root)
            }
        };
        events.extend(self.settle());
        self.summary.rewrites += events.len();
        events
    }

    /// Applies one event. `Ok(None)` means the page is gone.
    pub fn handle(&mut self, event: PageEvent) -> Result<Option<Vec<RewriteEvent>>, DomError> {
        self.summary.events += 1;
        let mut events = Vec::new();
        match event {
            PageEvent::Insert { parent, element } => {
                let parent = parent.unwrap_or_else(|| self.doc.root());
                self.doc.insert_snapshot(parent, &element)?;
            }
            PageEvent::SetAttribute { node, name, value } => {
                self.doc.set_attribute(node, &name, &value)?;
            }
            PageEvent::RemoveAttribute { node, name } => {
                self.doc.remove_attribute(node, &name)?;
            }
            PageEvent::Visible { nodes } => {
                if let Some(watcher) = &mut self.watcher {
                    events.extend(watcher.on_visible(&self.rewriter, &mut self.doc, &nodes));
                }
            }
            PageEvent::Hover { node } => {
                if self.doc.get(node).is_none() {
                    return Err(DomError::UnknownNode(node));
                }
                events.extend(self.rewriter.on_interaction(&mut self.doc, node));
            }
            PageEvent::Unload => return Ok(None),
        }
        events.extend(self.settle());
        self.summary.rewrites += events.len();
        Ok(Some(events))
    }

    /// Delivers queued records until the document is quiet.
    fn settle(&mut self) -> Vec<RewriteEvent> {
        let Some(watcher) = &mut self.watcher else {
            return self.rewriter.drain(&mut self.doc);
        };
        let mut events = Vec::new();
        loop {
            let records = self.doc.take_records();
            if records.is_empty() {
                return events;
            }
            for record in records {
                match record {
                    MutationRecord::ChildList { added, .. } => {
                        for node in added {
                            watcher.observe_images(&self.doc, node);
                            events.extend(self.rewriter.process_anchors(&mut self.doc, node));
                        }
                    }
                    MutationRecord::Attributes { target, .. } => {
                        if !watcher.is_observing(target) {
                            events.extend(self.rewriter.process_node(&mut self.doc, target));
                        }
                    }
                }
            }
        }
    }

    /// Detaches the observer and every per-element watch.
    pub fn finish(mut self) -> (Document, SessionSummary) {
        self.doc.disconnect();
        if let Some(watcher) = &mut self.watcher {
            watcher.disconnect();
        }
        (self.doc, self.summary)
    }
}

/// Runs `session` until `events` closes or an `Unload` arrives.
///
/// Rewrites are forwarded on `rewrites`; a dropped receiver is not an error.
/// Events naming unknown nodes are logged and skipped.
pub async fn run(
    mut session: Session,
    mut events: mpsc::Receiver<PageEvent>,
    rewrites: mpsc::Sender<RewriteEvent>,
) -> (Document, SessionSummary) {
    for rewrite in session.scan_existing() {
        let _ = rewrites.send(rewrite).await;
    }

    while let Some(event) = events.recv().await {
        match session.handle(event) {
            Ok(Some(batch)) => {
                for rewrite in batch {
                    let _ = rewrites.send(rewrite).await;
                }
            }
            Ok(None) => {
                tracing::debug!("page unloaded");
                break;
            }
            Err(err) => {
                session.summary.rejected_events += 1;
                tracing::warn!("page event skipped: {}", err);
            }
        }
    }

    let (doc, summary) = session.finish();
    tracing::info!(
        "observer detached after {} events, {} rewrites",
        summary.events,
        summary.rewrites
    );
    (doc, summary)
}
