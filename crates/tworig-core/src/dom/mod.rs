//! Minimal element tree standing in for the host page's DOM.
//!
//! Only what the in-page rewriter touches is modeled: tags, ordered
//! attributes, parent/child links, and mutation records for a single
//! observer attached at the root.

mod mutation;
mod snapshot;

pub use mutation::{MutationRecord, ObserverOptions};
pub use snapshot::{ElementSnapshot, PageSnapshot};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Index of an element inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("inserting node {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// A page: base URL, element arena rooted at `<html>`, and the observer state.
#[derive(Debug, Clone)]
pub struct Document {
    base: Url,
    nodes: Vec<Element>,
    root: NodeId,
    observer: Option<ObserverOptions>,
    records: Vec<MutationRecord>,
}

impl Document {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            nodes: vec![Element::new("html")],
            root: NodeId(0),
            observer: None,
            records: Vec::new(),
        }
    }

    /// URL relative attribute values resolve against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    fn element(&self, id: NodeId) -> Result<&Element, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Element::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    /// Appends a detached `child` under `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.element(parent)?;
        if self.element(child)?.parent.is_some() || child == self.root {
            return Err(DomError::AlreadyAttached(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        self.element_mut(child)?.parent = Some(parent);
        self.element_mut(parent)?.children.push(child);

        if self.wants_child_list(parent) {
            self.records.push(MutationRecord::ChildList {
                target: parent,
                added: vec![child],
            });
        }
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(|e| e.attribute(name))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Sets an attribute, queueing a record even when the value is unchanged.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let element = self.element_mut(id)?;
        match element
            .attributes
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(pos) => element.attributes[pos].1 = value.to_string(),
            None => element
                .attributes
                .push((name.to_ascii_lowercase(), value.to_string())),
        }
        self.record_attribute(id, name);
        Ok(())
    }

    /// Removes an attribute. Returns whether it existed; only then is a record queued.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, DomError> {
        let element = self.element_mut(id)?;
        let before = element.attributes.len();
        element.attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        let removed = element.attributes.len() != before;
        if removed {
            self.record_attribute(id, name);
        }
        Ok(removed)
    }

    /// Descendants of `id` (not `id` itself) with the given tag, in document order.
    pub fn descendants_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.get(id) {
            Some(e) => e.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            let Some(element) = self.get(next) else { continue };
            if element.tag.eq_ignore_ascii_case(tag) {
                out.push(next);
            }
            stack.extend(element.children.iter().rev().copied());
        }
        out
    }

    /// `id` itself or its nearest ancestor with the given tag.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let element = self.get(current)?;
            if element.tag.eq_ignore_ascii_case(tag) {
                return Some(current);
            }
            cursor = element.parent;
        }
        None
    }

    /// True if `id` hangs off the root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        id == self.root || self.is_ancestor(self.root, id)
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = self.get(id).and_then(|e| e.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(|e| e.parent);
        }
        false
    }

    /// Attaches the single observer at the root, replacing any previous options.
    pub fn observe(&mut self, options: ObserverOptions) {
        self.observer = Some(options);
    }

    /// Detaches the observer and drops undelivered records.
    pub fn disconnect(&mut self) {
        self.observer = None;
        self.records.clear();
    }

    pub fn is_observed(&self) -> bool {
        self.observer.is_some()
    }

    /// Drains queued mutation records.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    fn in_scope(&self, options: &ObserverOptions, target: NodeId) -> bool {
        if target == self.root {
            return true;
        }
        options.subtree && self.is_connected(target)
    }

    fn wants_child_list(&self, target: NodeId) -> bool {
        match &self.observer {
            Some(options) => options.child_list && self.in_scope(options, target),
            None => false,
        }
    }

    fn record_attribute(&mut self, target: NodeId, name: &str) {
        let wanted = match &self.observer {
            Some(options) => options.accepts_attribute(name) && self.in_scope(options, target),
            None => false,
        };
        if wanted {
            self.records.push(MutationRecord::Attributes {
                target,
                name: name.to_ascii_lowercase(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new(Url::parse("https://x.com/home").unwrap())
    }

    #[test]
    fn build_and_query_tree() {
        let mut d = doc();
        let div = d.create_element("DIV");
        let img = d.create_element("img");
        let a = d.create_element("a");
        let inner = d.create_element("img");
        d.append_child(d.root(), div).unwrap();
        d.append_child(div, img).unwrap();
        d.append_child(div, a).unwrap();
        d.append_child(a, inner).unwrap();

        assert_eq!(d.get(div).unwrap().tag(), "div");
        assert_eq!(d.descendants_by_tag(d.root(), "img"), vec![img, inner]);
        assert_eq!(d.descendants_by_tag(div, "a"), vec![a]);
        assert_eq!(d.closest(inner, "a"), Some(a));
        assert_eq!(d.closest(img, "a"), None);
        assert!(d.is_connected(inner));
    }

    #[test]
    fn append_rejects_attached_and_cycles() {
        let mut d = doc();
        let a = d.create_element("div");
        let b = d.create_element("div");
        d.append_child(a, b).unwrap();
        assert_eq!(d.append_child(d.root(), b), Err(DomError::AlreadyAttached(b)));
        assert_eq!(d.append_child(b, a), Err(DomError::Cycle { parent: b, child: a }));
        assert_eq!(
            d.append_child(NodeId(99), a),
            Err(DomError::UnknownNode(NodeId(99)))
        );
    }

    #[test]
    fn attributes_are_case_insensitive() {
        let mut d = doc();
        let img = d.create_element("img");
        d.set_attribute(img, "SRC", "a.jpg").unwrap();
        assert_eq!(d.attribute(img, "src"), Some("a.jpg"));
        d.set_attribute(img, "src", "b.jpg").unwrap();
        assert_eq!(d.get(img).unwrap().attributes().count(), 1);
        assert!(d.remove_attribute(img, "Src").unwrap());
        assert!(!d.remove_attribute(img, "src").unwrap());
    }

    #[test]
    fn records_only_when_observed_and_in_scope() {
        let mut d = doc();
        let detached = d.create_element("img");
        d.observe(ObserverOptions::page_rewriter());
        d.set_attribute(detached, "src", "a.jpg").unwrap();
        assert!(d.take_records().is_empty());

        d.append_child(d.root(), detached).unwrap();
        d.set_attribute(detached, "src", "b.jpg").unwrap();
        d.set_attribute(detached, "alt", "ignored by filter").unwrap();
        assert_eq!(
            d.take_records(),
            vec![
                MutationRecord::ChildList {
                    target: d.root(),
                    added: vec![detached]
                },
                MutationRecord::Attributes {
                    target: detached,
                    name: "src".into()
                },
            ]
        );

        d.disconnect();
        d.set_attribute(detached, "src", "c.jpg").unwrap();
        assert!(d.take_records().is_empty());
    }

    #[test]
    fn without_subtree_only_root_children_are_seen() {
        let mut d = doc();
        d.observe(ObserverOptions {
            subtree: false,
            ..ObserverOptions::page_rewriter()
        });
        let div = d.create_element("div");
        let img = d.create_element("img");
        d.append_child(d.root(), div).unwrap();
        d.append_child(div, img).unwrap();
        d.set_attribute(img, "src", "a.jpg").unwrap();
        assert_eq!(d.take_records().len(), 1);
    }
}
