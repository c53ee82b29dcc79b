//! Ordered tree edit distance.
//!
//! Unit cost for relabeling a node, subtree size for deleting or inserting
//! a whole subtree. Children lists are aligned with the usual sequence
//! dynamic program.

use super::tree::TableTree;

/// A tree node with its subtree size precomputed.
struct SizedNode<'a> {
    node: &'a TableTree,
    size: usize,
    children: Vec<SizedNode<'a>>,
}

impl<'a> SizedNode<'a> {
    fn new(node: &'a TableTree) -> Self {
        let children: Vec<_> = node.children.iter().map(SizedNode::new).collect();
        let size = 1 + children.iter().map(|c| c.size).sum::<usize>();
        Self {
            node,
            size,
            children,
        }
    }
}

/// Edit distance between two trees.
///
/// Equal roots cost the alignment of their children. Different roots cost
/// the cheaper of relabeling the root (1 + children alignment) or deleting
/// one tree and inserting the other.
pub fn edit_distance(a: &TableTree, b: &TableTree, structure_only: bool) -> usize {
    tree_distance(&SizedNode::new(a), &SizedNode::new(b), structure_only)
}

/// Edit distance between two ordered lists of subtrees.
pub fn list_edit_distance(a: &[TableTree], b: &[TableTree], structure_only: bool) -> usize {
    let a: Vec<_> = a.iter().map(SizedNode::new).collect();
    let b: Vec<_> = b.iter().map(SizedNode::new).collect();
    list_distance(&a, &b, structure_only)
}

fn tree_distance(a: &SizedNode<'_>, b: &SizedNode<'_>, structure_only: bool) -> usize {
    let children = list_distance(&a.children, &b.children, structure_only);
    if a.node.matches(b.node, structure_only) {
        children
    } else {
        (1 + children).min(a.size + b.size)
    }
}

fn list_distance(a: &[SizedNode<'_>], b: &[SizedNode<'_>], structure_only: bool) -> usize {
    // Row 0: inserting every prefix of `b`.
    let mut prev: Vec<usize> = Vec::with_capacity(b.len() + 1);
    prev.push(0);
    for node in b {
        let last = prev[prev.len() - 1];
        prev.push(last + node.size);
    }

    for x in a {
        let mut row = Vec::with_capacity(b.len() + 1);
        row.push(prev[0] + x.size);
        for (j, y) in b.iter().enumerate() {
            let delete = prev[j + 1] + x.size;
            let insert = row[j] + y.size;
            let substitute = prev[j] + tree_distance(x, y, structure_only);
            row.push(delete.min(insert).min(substitute));
        }
        prev = row;
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(tag: &str, text: &str) -> TableTree {
        TableTree::new(tag).with_text(text)
    }

    fn row(cells: Vec<TableTree>) -> TableTree {
        cells.into_iter().fold(TableTree::new("tr"), TableTree::with_child)
    }

    #[test]
    fn test_identical_trees() {
        let t = TableTree::new("table").with_child(row(vec![cell("td", "a"), cell("td", "b")]));
        assert_eq!(edit_distance(&t, &t.clone(), false), 0);
    }

    #[test]
    fn test_relabel_cost() {
        let a = TableTree::new("table").with_child(row(vec![cell("td", "a")]));
        let b = TableTree::new("table").with_child(row(vec![cell("td", "b")]));
        assert_eq!(edit_distance(&a, &b, false), 1);
        assert_eq!(edit_distance(&a, &b, true), 0);
    }

    #[test]
    fn test_missing_column() {
        let pred = TableTree::new("table")
            .with_child(row(vec![cell("th", "a")]))
            .with_child(row(vec![cell("td", "1")]));
        let gt = TableTree::new("table")
            .with_child(row(vec![cell("th", "a"), cell("th", "b")]))
            .with_child(row(vec![cell("td", "1"), cell("td", "2")]));
        assert_eq!(edit_distance(&pred, &gt, false), 2);
    }

    #[test]
    fn test_list_distance_bases() {
        let items = vec![row(vec![cell("td", "x")]), cell("td", "y")];
        assert_eq!(list_edit_distance(&items, &[], false), 3);
        assert_eq!(list_edit_distance(&[], &items, false), 3);
        assert_eq!(list_edit_distance(&[], &[], false), 0);
    }

    #[test]
    fn test_whole_replacement_bound() {
        let a = TableTree::new("a");
        let b = TableTree::new("b");
        assert_eq!(edit_distance(&a, &b, false), 1);
    }
}
