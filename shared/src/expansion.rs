use indexmap::IndexSet;

use crate::hierarchy::NodeId;
use crate::tree::Forest;

/// Ids of the currently expanded nodes.
///
/// Membership is unique; insertion order is kept so the set reads back in the
/// order nodes were opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet {
    ids: IndexSet<NodeId>,
}

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<NodeId> {
        self.ids.iter().copied().collect()
    }

    /// Label click: expand `id` unless its children are still loading.
    ///
    /// Returns whether the set changed.
    pub fn toggle(&mut self, id: NodeId, loading: bool) -> bool {
        if loading {
            return false;
        }
        self.ids.insert(id)
    }

    /// Replace the whole set, as reported by the widget's own toggle.
    pub fn set_expanded(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.ids = ids.into_iter().collect();
    }

    /// Chevron click: open a closed node or close an open one.
    pub fn flip(&mut self, id: NodeId) {
        let mut next = self.ids.clone();
        if !next.shift_remove(&id) {
            next.insert(id);
        }
        self.set_expanded(next);
    }

    /// Expand every node materialized in `forest`. Branches that were never
    /// loaded stay undiscovered.
    ///
    /// Returns the number of newly expanded ids.
    pub fn expand_all(&mut self, forest: &Forest) -> usize {
        let before = self.ids.len();
        self.ids.extend(forest.materialized_ids());
        self.ids.len() - before
    }

    pub fn collapse_all(&mut self) {
        self.ids.clear();
    }
}

impl FromIterator<NodeId> for ExpansionSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
