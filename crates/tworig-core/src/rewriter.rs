//! In-page rewriting: patch `img[src]` and `a[href]` as elements show up.

use serde::{Deserialize, Serialize};

use crate::dom::{Document, MutationRecord, NodeId};
use crate::target::{target, TargetConfig};
use crate::url_model::normalize_with;

/// Which attributes the rewriter touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteOptions {
    pub rewrite_images: bool,
    pub rewrite_links: bool,
    /// Drop `srcset` after forcing `src`, so the browser cannot pick a smaller variant.
    pub strip_srcset: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            rewrite_images: true,
            rewrite_links: true,
            strip_srcset: true,
        }
    }
}

/// One attribute write performed by the rewriter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteEvent {
    pub node: NodeId,
    pub attribute: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub srcset_removed: bool,
}

#[derive(Debug, Clone)]
pub struct PageRewriter {
    target: TargetConfig,
    options: RewriteOptions,
}

impl PageRewriter {
    pub fn new(options: RewriteOptions) -> Self {
        Self::with_target(target().clone(), options)
    }

    pub fn with_target(target: TargetConfig, options: RewriteOptions) -> Self {
        Self { target, options }
    }

    pub fn options(&self) -> RewriteOptions {
        self.options
    }

    /// Normalizes an attribute value the way the page would see it, i.e.
    /// resolved against the document base.
    fn rewrite_value(&self, doc: &Document, raw: &str) -> Option<String> {
        if raw.trim().is_empty() {
            return None;
        }
        let resolved = doc.base().join(raw.trim()).ok()?;
        normalize_with(&self.target, resolved.as_str())
    }

    fn rewrite_attribute(
        &self,
        doc: &mut Document,
        id: NodeId,
        attribute: &str,
    ) -> Option<RewriteEvent> {
        let from = doc.attribute(id, attribute)?.to_string();
        let to = self.rewrite_value(doc, &from)?;
        doc.set_attribute(id, attribute, &to).ok()?;
        Some(RewriteEvent {
            node: id,
            attribute: attribute.to_string(),
            from,
            to,
            srcset_removed: false,
        })
    }

    /// Rewrites a single element if it is an `img` or an `a`.
    pub fn process_node(&self, doc: &mut Document, id: NodeId) -> Option<RewriteEvent> {
        let tag = doc.get(id)?.tag().to_string();
        match tag.as_str() {
            "img" if self.options.rewrite_images => {
                let mut event = self.rewrite_attribute(doc, id, "src")?;
                if self.options.strip_srcset {
                    event.srcset_removed = doc.remove_attribute(id, "srcset").unwrap_or(false);
                }
                tracing::debug!("rewrote img {} src -> {}", id, event.to);
                Some(event)
            }
            "a" if self.options.rewrite_links => {
                let event = self.rewrite_attribute(doc, id, "href")?;
                tracing::debug!("rewrote a {} href -> {}", id, event.to);
                Some(event)
            }
            _ => None,
        }
    }

    /// Processes `id`, then every `img` below it, then every `a` below it.
    pub fn process_subtree(&self, doc: &mut Document, id: NodeId) -> Vec<RewriteEvent> {
        let mut events: Vec<RewriteEvent> = self.process_node(doc, id).into_iter().collect();
        let images = doc.descendants_by_tag(id, "img");
        let anchors = doc.descendants_by_tag(id, "a");
        for node in images.into_iter().chain(anchors) {
            events.extend(self.process_node(doc, node));
        }
        events
    }

    /// Processes `id` and every `a` below it, leaving images alone.
    pub fn process_anchors(&self, doc: &mut Document, id: NodeId) -> Vec<RewriteEvent> {
        let mut nodes = vec![id];
        nodes.extend(doc.descendants_by_tag(id, "a"));
        let mut events = Vec::new();
        for node in nodes {
            if doc.get(node).map(|e| e.tag() == "a").unwrap_or(false) {
                events.extend(self.process_node(doc, node));
            }
        }
        events
    }

    /// Full pass over an already-built page.
    pub fn scan_document(&self, doc: &mut Document) -> Vec<RewriteEvent> {
        let root = doc.root();
        self.process_subtree(doc, root)
    }

    pub fn process_records(
        &self,
        doc: &mut Document,
        records: Vec<MutationRecord>,
    ) -> Vec<RewriteEvent> {
        let mut events = Vec::new();
        for record in records {
            match record {
                MutationRecord::ChildList { added, .. } => {
                    for node in added {
                        events.extend(self.process_subtree(doc, node));
                    }
                }
                MutationRecord::Attributes { target, .. } => {
                    events.extend(self.process_node(doc, target));
                }
            }
        }
        events
    }

    /// Delivers queued records until none are left.
    ///
    /// The rewriter's own `src`/`href` writes come back as records; the
    /// normalizer's idempotence guard makes the second visit a no-op, so this
    /// always settles.
    pub fn drain(&self, doc: &mut Document) -> Vec<RewriteEvent> {
        let mut events = Vec::new();
        loop {
            let records = doc.take_records();
            if records.is_empty() {
                return events;
            }
            events.extend(self.process_records(doc, records));
        }
    }

    /// Hover/click on `id`: rewrite the enclosing link, if any.
    pub fn on_interaction(&self, doc: &mut Document, id: NodeId) -> Option<RewriteEvent> {
        if !self.options.rewrite_links {
            return None;
        }
        let anchor = doc.closest(id, "a")?;
        self.rewrite_attribute(doc, anchor, "href")
    }
}

impl Default for PageRewriter {
    fn default() -> Self {
        Self::new(RewriteOptions::default())
    }
}
