use std::collections::HashMap;

use crate::error::LoadError;
use crate::expansion::ExpansionSet;
use crate::hierarchy::{HierarchyItem, NodeId};

/// Load state of a node's children.
#[derive(Debug, Clone, PartialEq)]
pub enum Children {
    /// Never requested.
    Pending,
    /// Request in flight.
    Loading,
    Loaded(Vec<TreeNode>),
    Failed(LoadError),
}

/// One rendered line of an expanded subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum VisibleRow {
    Node {
        node_id: NodeId,
        label: String,
        depth: usize,
        expanded: bool,
        leaf: bool,
    },
    /// Placeholder under an expanded node whose children are in flight.
    Loading { node_id: NodeId, depth: usize },
    /// Placeholder under an expanded node whose children failed to load.
    Failed {
        node_id: NodeId,
        depth: usize,
        error: LoadError,
    },
}

impl VisibleRow {
    pub fn depth(&self) -> usize {
        match self {
            VisibleRow::Node { depth, .. }
            | VisibleRow::Loading { depth, .. }
            | VisibleRow::Failed { depth, .. } => *depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub item: HierarchyItem,
    pub children: Children,
}

impl TreeNode {
    pub fn pending(item: HierarchyItem) -> Self {
        Self {
            item,
            children: Children::Pending,
        }
    }

    pub fn id(&self) -> NodeId {
        self.item.id
    }

    pub fn label(&self) -> &str {
        &self.item.label
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.children, Children::Loading)
    }

    pub fn loaded_children(&self) -> Option<&[TreeNode]> {
        match &self.children {
            Children::Loaded(children) => Some(children),
            _ => None,
        }
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        match &self.children {
            Children::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Loaded with no children. Pending nodes may still turn out to have some.
    pub fn is_leaf(&self) -> bool {
        matches!(&self.children, Children::Loaded(children) if children.is_empty())
    }

    /// Rows this node occupies when rendered: itself plus every row of its
    /// loaded children while it is expanded. Loading and failed nodes show one
    /// extra status row when expanded.
    pub fn visible_row_count(&self, expansion: &ExpansionSet) -> usize {
        if !expansion.contains(self.id()) {
            return 1;
        }
        match &self.children {
            Children::Loaded(children) => {
                1 + children
                    .iter()
                    .map(|child| child.visible_row_count(expansion))
                    .sum::<usize>()
            }
            Children::Loading | Children::Failed(_) => 2,
            Children::Pending => 1,
        }
    }

    /// The rows [`TreeNode::visible_row_count`] counts, in display order.
    pub fn visible_rows(&self, expansion: &ExpansionSet) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        self.push_visible_rows(expansion, 0, &mut rows);
        rows
    }

    fn push_visible_rows(&self, expansion: &ExpansionSet, depth: usize, rows: &mut Vec<VisibleRow>) {
        let expanded = expansion.contains(self.id());
        rows.push(VisibleRow::Node {
            node_id: self.id(),
            label: self.item.label.clone(),
            depth,
            expanded,
            leaf: self.is_leaf(),
        });
        if !expanded {
            return;
        }
        match &self.children {
            Children::Loaded(children) => {
                for child in children {
                    child.push_visible_rows(expansion, depth + 1, rows);
                }
            }
            Children::Loading => rows.push(VisibleRow::Loading {
                node_id: self.id(),
                depth: depth + 1,
            }),
            Children::Failed(error) => rows.push(VisibleRow::Failed {
                node_id: self.id(),
                depth: depth + 1,
                error: error.clone(),
            }),
            Children::Pending => {}
        }
    }

    fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.id());
        if let Children::Loaded(children) = &self.children {
            for child in children {
                child.collect_ids(out);
            }
        }
    }

    fn find(&self, id: NodeId) -> Option<&TreeNode> {
        if self.id() == id {
            return Some(self);
        }
        self.loaded_children()?.iter().find_map(|child| child.find(id))
    }

    fn find_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        if self.id() == id {
            return Some(self);
        }
        match &mut self.children {
            Children::Loaded(children) => children.iter_mut().find_map(|child| child.find_mut(id)),
            _ => None,
        }
    }

    fn index_into<'a>(&'a self, index: &mut HashMap<NodeId, &'a TreeNode>) {
        index.insert(self.id(), self);
        if let Children::Loaded(children) = &self.children {
            for child in children {
                child.index_into(index);
            }
        }
    }
}

/// Ordered root nodes produced by one build pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forest {
    roots: Vec<TreeNode>,
}

impl Forest {
    pub fn new(roots: Vec<TreeNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TreeNode> {
        self.roots.get(index)
    }

    pub fn find(&self, id: NodeId) -> Option<&TreeNode> {
        self.roots.iter().find_map(|root| root.find(id))
    }

    /// Every node present in the forest, depth-first, pre-order.
    pub fn materialized_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for root in &self.roots {
            root.collect_ids(&mut ids);
        }
        ids
    }

    /// Lookup table from id to node, used to reuse children loaded by an
    /// earlier pass.
    pub fn index(&self) -> HashMap<NodeId, &TreeNode> {
        let mut index = HashMap::new();
        for root in &self.roots {
            root.index_into(&mut index);
        }
        index
    }

    /// Flag a node as loading in this snapshot. Returns false when the node is
    /// not part of the forest.
    pub fn mark_loading(&mut self, id: NodeId) -> bool {
        match self.roots.iter_mut().find_map(|root| root.find_mut(id)) {
            Some(node) => {
                if !matches!(node.children, Children::Loaded(_)) {
                    node.children = Children::Loading;
                }
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest() -> Forest {
        let grandchild = TreeNode::pending(HierarchyItem::child(3, 2, "C"));
        let child = TreeNode {
            item: HierarchyItem::child(2, 1, "B"),
            children: Children::Loaded(vec![grandchild]),
        };
        let failed = TreeNode {
            item: HierarchyItem::child(4, 1, "D"),
            children: Children::Failed(LoadError::child_load(NodeId(4), "boom")),
        };
        let root = TreeNode {
            item: HierarchyItem::root(1, "A"),
            children: Children::Loaded(vec![child, failed]),
        };
        let leaf = TreeNode {
            item: HierarchyItem::root(5, "E"),
            children: Children::Loaded(Vec::new()),
        };
        Forest::new(vec![root, leaf])
    }

    #[test]
    fn materialized_ids_are_depth_first() {
        assert_eq!(
            forest().materialized_ids(),
            vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4), NodeId(5)]
        );
    }

    #[test]
    fn leaves_and_failures() {
        let forest = forest();
        assert!(forest.get(1).unwrap().is_leaf());
        assert!(!forest.find(NodeId(3)).unwrap().is_leaf());
        assert!(forest.find(NodeId(4)).unwrap().load_error().is_some());
    }

    #[test]
    fn visible_rows_follow_expansion() {
        let forest = forest();
        let root = forest.get(0).unwrap();

        assert_eq!(root.visible_row_count(&ExpansionSet::new()), 1);

        let expansion: ExpansionSet = [NodeId(1)].into_iter().collect();
        assert_eq!(root.visible_row_count(&expansion), 3);

        // 2 open shows its pending child 3; 4 open shows its error row.
        let expansion: ExpansionSet = [NodeId(1), NodeId(2), NodeId(4)].into_iter().collect();
        assert_eq!(root.visible_row_count(&expansion), 5);

        // A collapsed ancestor hides everything below it.
        let expansion: ExpansionSet = [NodeId(2)].into_iter().collect();
        assert_eq!(root.visible_row_count(&expansion), 1);
    }

    #[test]
    fn visible_rows_match_the_row_count() {
        let forest = forest();
        let root = forest.get(0).unwrap();
        let expansion: ExpansionSet = [NodeId(1), NodeId(2), NodeId(4)].into_iter().collect();

        let rows = root.visible_rows(&expansion);
        assert_eq!(rows.len(), root.visible_row_count(&expansion));

        let depths: Vec<usize> = rows.iter().map(VisibleRow::depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1, 2]);
        assert!(matches!(rows[4], VisibleRow::Failed { node_id: NodeId(4), .. }));
        assert!(matches!(
            rows[2],
            VisibleRow::Node { node_id: NodeId(3), expanded: false, leaf: false, .. }
        ));
    }

    #[test]
    fn mark_loading_leaves_loaded_nodes_alone() {
        let mut forest = forest();
        assert!(forest.mark_loading(NodeId(3)));
        assert!(forest.find(NodeId(3)).unwrap().is_loading());

        assert!(forest.mark_loading(NodeId(1)));
        assert!(!forest.find(NodeId(1)).unwrap().is_loading());

        assert!(!forest.mark_loading(NodeId(42)));
    }
}
