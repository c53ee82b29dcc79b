//! Canonical table tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attributes compared by the node-equality predicate.
pub const SPAN_ATTRS: [&str; 2] = ["colspan", "rowspan"];

/// A node of a canonical table tree.
///
/// Tables from HTML, markdown and JSON rows all normalize to this shape:
/// `table` → `tr` → `td`/`th`, with nested tables as children of their cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTree {
    /// Element tag (`table`, `tr`, `td`, `th`, or `tables` for a synthetic root)
    pub tag: String,

    /// Span attributes (`colspan` / `rowspan`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,

    /// Cell text; empty for structural nodes and in structure-only mode
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    /// Ordered child nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TableTree>,
}

impl TableTree {
    /// Create a node with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the text and return self.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute and return self.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Append a child and return self.
    pub fn with_child(mut self, child: TableTree) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child.
    pub fn push(&mut self, child: TableTree) {
        self.children.push(child);
    }

    /// Span attribute value, `"1"` when absent.
    pub fn span(&self, attr: &str) -> &str {
        self.attrs.get(attr).map_or("1", |v| v.trim())
    }

    /// Number of nodes in this subtree (this node included).
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Node-equality predicate used by the edit distance.
    ///
    /// Tags and span attributes must match; text must match exactly unless
    /// `structure_only` is set. Children are not compared.
    pub fn matches(&self, other: &TableTree, structure_only: bool) -> bool {
        self.tag == other.tag
            && SPAN_ATTRS
                .iter()
                .all(|attr| self.span(attr) == other.span(attr))
            && (structure_only || self.text == other.text)
    }
}

/// `node_count` of an optional tree (0 for `None`).
pub fn node_count(tree: Option<&TableTree>) -> usize {
    tree.map_or(0, TableTree::node_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_count() {
        let tree = TableTree::new("table")
            .with_child(TableTree::new("tr").with_child(TableTree::new("td").with_text("a")));
        assert_eq!(tree.node_count(), 3);
        assert_eq!(node_count(Some(&tree)), 3);
        assert_eq!(node_count(None), 0);
    }

    #[test]
    fn test_implicit_span_matches_explicit_one() {
        let a = TableTree::new("td").with_attr("colspan", "1");
        let b = TableTree::new("td");
        assert!(a.matches(&b, false));
    }

    #[test]
    fn test_span_mismatch() {
        let a = TableTree::new("td").with_attr("rowspan", "2");
        let b = TableTree::new("td");
        assert!(!a.matches(&b, true));
    }

    #[test]
    fn test_text_ignored_in_structure_mode() {
        let a = TableTree::new("td").with_text("A");
        let b = TableTree::new("td").with_text("B");
        assert!(!a.matches(&b, false));
        assert!(a.matches(&b, true));
    }
}
