//! Mutation records and observer options.

use super::NodeId;

/// What changed in the observed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// `added` were inserted under `target`.
    ChildList { target: NodeId, added: Vec<NodeId> },
    /// Attribute `name` on `target` was set or removed.
    Attributes { target: NodeId, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverOptions {
    pub child_list: bool,
    pub subtree: bool,
    pub attributes: bool,
    /// Lowercase attribute names to report; `None` reports all.
    pub attribute_filter: Option<Vec<String>>,
}

impl ObserverOptions {
    /// Insertions anywhere plus `src`/`href` changes.
    pub fn page_rewriter() -> Self {
        Self {
            child_list: true,
            subtree: true,
            attributes: true,
            attribute_filter: Some(vec!["src".to_string(), "href".to_string()]),
        }
    }

    pub(super) fn accepts_attribute(&self, name: &str) -> bool {
        if !self.attributes {
            return false;
        }
        match &self.attribute_filter {
            Some(filter) => filter.iter().any(|f| f.eq_ignore_ascii_case(name)),
            None => true,
        }
    }
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self::page_rewriter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_ignoring_case() {
        let opts = ObserverOptions::page_rewriter();
        assert!(opts.accepts_attribute("SRC"));
        assert!(opts.accepts_attribute("href"));
        assert!(!opts.accepts_attribute("srcset"));

        let all = ObserverOptions {
            attribute_filter: None,
            ..ObserverOptions::page_rewriter()
        };
        assert!(all.accepts_attribute("srcset"));

        let none = ObserverOptions {
            attributes: false,
            ..ObserverOptions::page_rewriter()
        };
        assert!(!none.accepts_attribute("src"));
    }
}
