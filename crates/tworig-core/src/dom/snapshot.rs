//! Serializable element trees, used to load pages and report results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{Document, DomError, NodeId};

/// An element and its subtree as plain data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSnapshot>,
}

impl ElementSnapshot {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, child: ElementSnapshot) -> Self {
        self.children.push(child);
        self
    }
}

/// A whole page: its address and the elements under the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub body: Vec<ElementSnapshot>,
}

impl PageSnapshot {
    /// Builds a document without queueing any records.
    pub fn to_document(&self) -> anyhow::Result<Document> {
        let base = Url::parse(&self.url)
            .map_err(|e| anyhow::anyhow!("invalid page url {:?}: {}", self.url, e))?;
        let mut doc = Document::new(base);
        let root = doc.root();
        for element in &self.body {
            doc.insert_snapshot(root, element)?;
        }
        Ok(doc)
    }

    /// Captures everything under the document root.
    pub fn from_document(doc: &Document) -> Self {
        let body = doc
            .get(doc.root())
            .map(|root| root.children().iter().map(|&c| doc.snapshot(c)).collect())
            .unwrap_or_default();
        Self {
            url: doc.base().to_string(),
            body,
        }
    }
}

impl Document {
    /// Builds `snapshot` detached, then appends it under `parent` as one insertion.
    ///
    /// On error the arena is left exactly as it was, so later ids are unaffected.
    pub fn insert_snapshot(
        &mut self,
        parent: NodeId,
        snapshot: &ElementSnapshot,
    ) -> Result<NodeId, DomError> {
        self.element(parent)?;
        let mark = self.nodes.len();
        let result = self
            .build_detached(snapshot)
            .and_then(|top| self.append_child(parent, top).map(|()| top));
        if result.is_err() {
            self.nodes.truncate(mark);
        }
        result
    }

    fn build_detached(&mut self, snapshot: &ElementSnapshot) -> Result<NodeId, DomError> {
        let id = self.create_element(&snapshot.tag);
        for (name, value) in &snapshot.attributes {
            // Detached nodes never produce records.
            self.set_attribute(id, name, value)?;
        }
        for child in &snapshot.children {
            let child_id = self.build_detached(child)?;
            self.append_child(id, child_id)?;
        }
        Ok(id)
    }

    pub fn snapshot(&self, id: NodeId) -> ElementSnapshot {
        let Some(element) = self.get(id) else {
            return ElementSnapshot::new("");
        };
        ElementSnapshot {
            tag: element.tag().to_string(),
            attributes: element
                .attributes()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children: element.children().iter().map(|&c| self.snapshot(c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MutationRecord, ObserverOptions};

    #[test]
    fn page_json_loads_and_dumps() {
        let json = r#"{
            "url": "https://x.com/home",
            "body": [
                { "tag": "div", "children": [
                    { "tag": "img", "attributes": { "src": "https://pbs.twimg.com/media/A.jpg" } }
                ]}
            ]
        }"#;
        let page: PageSnapshot = serde_json::from_str(json).unwrap();
        let doc = page.to_document().unwrap();
        assert_eq!(doc.descendants_by_tag(doc.root(), "img").len(), 1);
        assert_eq!(PageSnapshot::from_document(&doc), page);
    }

    #[test]
    fn invalid_page_url_is_an_error() {
        let page = PageSnapshot {
            url: "not a url".into(),
            body: vec![],
        };
        assert!(page.to_document().is_err());
    }

    #[test]
    fn failed_insert_leaves_no_nodes_behind() {
        let mut doc = Document::new(Url::parse("https://x.com/").unwrap());
        let tree = ElementSnapshot::new("div").child(ElementSnapshot::new("img"));
        assert_eq!(
            doc.insert_snapshot(NodeId(99), &tree),
            Err(DomError::UnknownNode(NodeId(99)))
        );
        assert_eq!(doc.len(), 1);
        let root = doc.root();
        assert_eq!(doc.insert_snapshot(root, &tree), Ok(NodeId(1)));
    }

    #[test]
    fn subtree_insert_is_a_single_record() {
        let mut doc = Document::new(Url::parse("https://x.com/").unwrap());
        doc.observe(ObserverOptions::page_rewriter());
        let tree = ElementSnapshot::new("article")
            .child(ElementSnapshot::new("img").attr("src", "a.jpg"))
            .child(ElementSnapshot::new("a").attr("href", "b"));
        let top = doc.insert_snapshot(doc.root(), &tree).unwrap();
        assert_eq!(
            doc.take_records(),
            vec![MutationRecord::ChildList {
                target: doc.root(),
                added: vec![top]
            }]
        );
    }
}
