use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::paging::PageWindow;

// ===== IDENTIFIERS =====

/// Identifier of a single item in the hierarchy.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

// ===== FLAT ITEMS =====

/// Flat hierarchy record as supplied by the host application or a page fetch.
///
/// Unknown fields are carried along untouched in `extra`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyItem {
    pub id: NodeId,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl HierarchyItem {
    pub fn new(id: impl Into<NodeId>, parent_id: Option<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id,
            label: label.into(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn root(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self::new(id, None, label)
    }

    pub fn child(id: impl Into<NodeId>, parent_id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self::new(id, Some(parent_id.into()), label)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Items whose parent matches `parent_id`, in source order.
pub fn children_of(items: &[HierarchyItem], parent_id: Option<NodeId>) -> Vec<HierarchyItem> {
    items
        .iter()
        .filter(|item| item.parent_id == parent_id)
        .cloned()
        .collect()
}

// ===== HIERARCHY SOURCE =====

/// Result of appending a batch of items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendSummary {
    pub added: usize,
    pub roots_added: usize,
    pub skipped: usize,
}

/// Ordered flat collection describing an implicit tree.
///
/// Ids are unique: a later item with an id that is already present is skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    items: Vec<HierarchyItem>,
    ids: HashSet<NodeId>,
}

impl Hierarchy {
    pub fn new(items: Vec<HierarchyItem>) -> Self {
        let mut hierarchy = Self::default();
        hierarchy.append(items);
        hierarchy
    }

    pub fn items(&self) -> &[HierarchyItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn roots(&self) -> Vec<HierarchyItem> {
        children_of(&self.items, None)
    }

    pub fn root_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_root()).count()
    }

    pub fn children_of(&self, parent_id: NodeId) -> Vec<HierarchyItem> {
        children_of(&self.items, Some(parent_id))
    }

    /// Append items in order, skipping ids that are already known.
    pub fn append(&mut self, items: Vec<HierarchyItem>) -> AppendSummary {
        let mut summary = AppendSummary::default();
        for item in items {
            if !self.ids.insert(item.id) {
                summary.skipped += 1;
                continue;
            }
            if item.is_root() {
                summary.roots_added += 1;
            }
            summary.added += 1;
            self.items.push(item);
        }
        summary
    }

    /// Root items whose root-row index lies in `window` (inclusive on both
    /// ends), each followed by all of its descendants in depth-first order.
    pub fn page(&self, window: PageWindow) -> Vec<HierarchyItem> {
        let by_parent = self.children_by_parent();
        let mut page = Vec::new();

        let roots = self
            .items
            .iter()
            .filter(|item| item.is_root())
            .enumerate()
            .filter(|(index, _)| window.contains(*index))
            .map(|(_, item)| item);

        for root in roots {
            page.push(root.clone());
            collect_descendants(root.id, &by_parent, &mut page);
        }
        page
    }

    fn children_by_parent(&self) -> HashMap<NodeId, Vec<&HierarchyItem>> {
        let mut by_parent: HashMap<NodeId, Vec<&HierarchyItem>> = HashMap::new();
        for item in &self.items {
            if let Some(parent_id) = item.parent_id {
                by_parent.entry(parent_id).or_default().push(item);
            }
        }
        by_parent
    }
}

fn collect_descendants(
    id: NodeId,
    by_parent: &HashMap<NodeId, Vec<&HierarchyItem>>,
    out: &mut Vec<HierarchyItem>,
) {
    // Guards against parent cycles in malformed input.
    let mut visited = HashSet::new();
    collect_descendants_inner(id, by_parent, out, &mut visited);
}

fn collect_descendants_inner(
    id: NodeId,
    by_parent: &HashMap<NodeId, Vec<&HierarchyItem>>,
    out: &mut Vec<HierarchyItem>,
    visited: &mut HashSet<NodeId>,
) {
    if !visited.insert(id) {
        return;
    }
    if let Some(children) = by_parent.get(&id) {
        for child in children {
            out.push((*child).clone());
            collect_descendants_inner(child.id, by_parent, out, visited);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Hierarchy {
        Hierarchy::new(vec![
            HierarchyItem::root(1, "A"),
            HierarchyItem::child(2, 1, "B"),
            HierarchyItem::root(3, "C"),
            HierarchyItem::child(4, 2, "D"),
            HierarchyItem::child(5, 1, "E"),
        ])
    }

    #[test]
    fn children_preserve_source_order() {
        let hierarchy = sample();
        let ids: Vec<NodeId> = hierarchy.children_of(NodeId(1)).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![NodeId(2), NodeId(5)]);

        let roots: Vec<NodeId> = hierarchy.roots().iter().map(|i| i.id).collect();
        assert_eq!(roots, vec![NodeId(1), NodeId(3)]);
    }

    #[test]
    fn append_skips_known_ids() {
        let mut hierarchy = sample();
        let summary = hierarchy.append(vec![
            HierarchyItem::root(3, "C again"),
            HierarchyItem::root(6, "F"),
            HierarchyItem::child(7, 6, "G"),
        ]);

        assert_eq!(summary, AppendSummary { added: 2, roots_added: 1, skipped: 1 });
        assert_eq!(hierarchy.len(), 7);
        assert_eq!(hierarchy.root_count(), 3);
        assert!(hierarchy.contains(NodeId(7)));
    }

    #[test]
    fn page_returns_roots_in_window_with_descendants() {
        let hierarchy = sample();
        let page = hierarchy.page(PageWindow::new(0, 0));
        let ids: Vec<NodeId> = page.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(4), NodeId(5)]);

        let page = hierarchy.page(PageWindow::new(1, 10));
        let ids: Vec<NodeId> = page.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![NodeId(3)]);

        assert!(hierarchy.page(PageWindow::new(2, 10)).is_empty());
    }

    #[test]
    fn deserializes_camel_case_items_with_extra_fields() {
        let json = r#"[
            {"id": 1, "parentId": null, "label": "A", "color": "red"},
            {"id": 2, "parentId": 1, "label": "B"}
        ]"#;
        let items: Vec<HierarchyItem> = serde_json::from_str(json).unwrap();

        assert_eq!(items[0].parent_id, None);
        assert_eq!(items[1].parent_id, Some(NodeId(1)));
        assert_eq!(items[0].extra.get("color"), Some(&serde_json::json!("red")));
        assert!(items[1].extra.is_empty());
    }
}
