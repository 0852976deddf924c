//! Nested categorical grouping
//!
//! Rows are grouped by the combination of their category values, one tree
//! level per category series. Keys appear in first-seen row order at every
//! level, never sorted, so the leaf walk is deterministic for a given input
//! and its ordering is part of the output contract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::DataSeries;

/// Key of the implicit single group when no categories are supplied
pub const ALL_GROUP_KEY: &str = "__all__";

/// One node of the grouping tree
///
/// Interior nodes carry children; leaves carry the row positions that share
/// the full key path down to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupNode {
    key: String,
    children: Vec<GroupNode>,
    rows: Vec<usize>,
    #[serde(skip)]
    child_index: HashMap<String, usize>,
}

impl GroupNode {
    fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            children: Vec::new(),
            rows: Vec::new(),
            child_index: HashMap::new(),
        }
    }

    /// The category value this node represents
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Child nodes in first-seen order
    pub fn children(&self) -> &[GroupNode] {
        &self.children
    }

    /// Row positions grouped under this node; empty unless a leaf
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Whether this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The child holding `key`, created at the back on first sight
    ///
    /// `children` keeps first-seen order; `child_index` keeps the lookup
    /// constant-time per level.
    fn child_mut(&mut self, key: &str) -> &mut GroupNode {
        let pos = match self.child_index.get(key) {
            Some(&pos) => pos,
            None => {
                let pos = self.children.len();
                self.children.push(GroupNode::new(key));
                self.child_index.insert(key.to_string(), pos);
                pos
            }
        };
        &mut self.children[pos]
    }
}

// `child_index` is derived from `children`, so equality is over the data
// fields only.
impl PartialEq for GroupNode {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.children == other.children && self.rows == other.rows
    }
}

/// A leaf of the grouping tree
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<'a> {
    /// Key path from the first category level to the last
    pub path: Vec<String>,
    /// Row positions under this path, ascending
    pub rows: &'a [usize],
}

/// The grouping of rows by category value combinations
///
/// # Example
///
/// ```rust
/// use timegrain::accumulate::CategoryTree;
/// use timegrain::types::DataSeries;
///
/// let outer = DataSeries::categorical(["a", "a", "b"]);
/// let inner = DataSeries::categorical(["x", "y", "x"]);
/// let tree = CategoryTree::build(&[outer, inner], 3);
///
/// let paths: Vec<Vec<String>> = tree.leaves().into_iter().map(|l| l.path).collect();
/// assert_eq!(paths, vec![
///     vec!["a".to_string(), "x".to_string()],
///     vec!["a".to_string(), "y".to_string()],
///     vec!["b".to_string(), "x".to_string()],
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTree {
    root: GroupNode,
    depth: usize,
}

impl CategoryTree {
    /// Group `row_count` rows by the given category series
    ///
    /// With no categories every row lands in a single leaf keyed
    /// [`ALL_GROUP_KEY`]. Rows past the end of any category series are
    /// ignored; the accumulation engine validates lengths before building.
    pub fn build(categories: &[DataSeries], row_count: usize) -> Self {
        let mut root = GroupNode::new("");

        if categories.is_empty() {
            let all = root.child_mut(ALL_GROUP_KEY);
            all.rows = (0..row_count).collect();
            return Self { root, depth: 1 };
        }

        'rows: for row in 0..row_count {
            let mut node = &mut root;
            for series in categories {
                let key = match series.get(row) {
                    Some(value) => value.to_string(),
                    None => continue 'rows,
                };
                node = node.child_mut(&key);
            }
            node.rows.push(row);
        }

        Self {
            root,
            depth: categories.len(),
        }
    }

    /// Number of key levels in every leaf path
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Top-level groups in first-seen order
    pub fn groups(&self) -> &[GroupNode] {
        self.root.children()
    }

    /// All leaves in depth-first, first-seen order
    pub fn leaves(&self) -> Vec<Leaf<'_>> {
        let mut leaves = Vec::new();
        if self.root.children.is_empty() {
            return leaves;
        }
        let mut path = Vec::new();
        collect_leaves(&self.root, &mut path, &mut leaves);
        leaves
    }
}

fn collect_leaves<'a>(node: &'a GroupNode, path: &mut Vec<String>, leaves: &mut Vec<Leaf<'a>>) {
    if node.is_leaf() {
        leaves.push(Leaf {
            path: path.clone(),
            rows: &node.rows,
        });
        return;
    }
    for child in &node.children {
        path.push(child.key.clone());
        collect_leaves(child, path, leaves);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_level_grouping() {
        let outer = DataSeries::categorical(["a", "a", "b"]);
        let inner = DataSeries::categorical(["x", "y", "x"]);
        let tree = CategoryTree::build(&[outer, inner], 3);

        let top: Vec<&str> = tree.groups().iter().map(|g| g.key()).collect();
        assert_eq!(top, vec!["a", "b"]);

        let a_children: Vec<&str> = tree.groups()[0].children().iter().map(|g| g.key()).collect();
        assert_eq!(a_children, vec!["x", "y"]);

        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0].path, vec!["a", "x"]);
        assert_eq!(leaves[0].rows, &[0]);
        assert_eq!(leaves[1].path, vec!["a", "y"]);
        assert_eq!(leaves[1].rows, &[1]);
        assert_eq!(leaves[2].path, vec!["b", "x"]);
        assert_eq!(leaves[2].rows, &[2]);
    }

    #[test]
    fn test_no_categories_single_group() {
        let tree = CategoryTree::build(&[], 4);
        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].path, vec![ALL_GROUP_KEY]);
        assert_eq!(leaves[0].rows, &[0, 1, 2, 3]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_first_seen_order_is_not_sorted() {
        let cats = DataSeries::categorical(["zebra", "apple", "zebra", "mango"]);
        let tree = CategoryTree::build(&[cats], 4);
        let top: Vec<&str> = tree.groups().iter().map(|g| g.key()).collect();
        assert_eq!(top, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_revisited_keys_reuse_existing_children() {
        let cats = DataSeries::categorical(["b", "a", "b", "c", "a", "b"]);
        let tree = CategoryTree::build(&[cats], 6);

        // Revisits land in the original child, never a duplicate
        let top: Vec<&str> = tree.groups().iter().map(|g| g.key()).collect();
        assert_eq!(top, vec!["b", "a", "c"]);

        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0].rows, &[0, 2, 5]);
        assert_eq!(leaves[1].rows, &[1, 4]);
        assert_eq!(leaves[2].rows, &[3]);
    }

    #[test]
    fn test_rows_partition_the_input() {
        let outer = DataSeries::categorical(["a", "b", "a", "b", "a"]);
        let tree = CategoryTree::build(&[outer], 5);

        let mut seen: Vec<usize> = tree
            .leaves()
            .iter()
            .flat_map(|l| l.rows.iter().copied())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_identical_inputs_identical_trees() {
        let outer = DataSeries::categorical(["b", "a", "b"]);
        let inner = DataSeries::categorical(["1", "2", "2"]);
        let first = CategoryTree::build(&[outer.clone(), inner.clone()], 3);
        let second = CategoryTree::build(&[outer, inner], 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_rows_no_leaves() {
        let cats = DataSeries::categorical(Vec::<String>::new());
        let tree = CategoryTree::build(&[cats], 0);
        assert!(tree.leaves().is_empty());
    }
}
