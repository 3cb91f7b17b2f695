use shared::{DatasetConfig, Hierarchy, HierarchyItem, LoadError, NodeId, PageWindow};
use std::fs;

/// Demo items served to the tree view.
#[derive(Debug, Clone)]
pub struct Dataset {
    hierarchy: Hierarchy,
    initial_roots: usize,
}

impl Dataset {
    /// Load the configured dataset: the JSON file when `path` is set,
    /// generated items otherwise.
    pub fn from_config(config: &DatasetConfig) -> Result<Self, LoadError> {
        match &config.path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|error| {
                    LoadError::Config(format!("Failed to read dataset '{path}': {error}"))
                })?;
                Self::from_json(&content, config.initial_roots)
            }
            None => Ok(Self::generate(config)),
        }
    }

    pub fn from_json(content: &str, initial_roots: usize) -> Result<Self, LoadError> {
        let items: Vec<HierarchyItem> = serde_json::from_str(content)?;
        Ok(Self {
            hierarchy: Hierarchy::new(items),
            initial_roots,
        })
    }

    /// `total_roots` roots, each carrying a full subtree `depth` levels deep
    /// (roots included) with `fanout` children per node. Ids are assigned
    /// depth-first starting at 1.
    pub fn generate(config: &DatasetConfig) -> Self {
        let mut items = Vec::with_capacity(config.generated_item_count());
        let mut next_id = 1;
        for root in 1..=config.total_roots {
            let label = format!("Item {root}");
            generate_subtree(&mut items, &mut next_id, None, label, config.depth, config.fanout);
        }
        Self {
            hierarchy: Hierarchy::new(items),
            initial_roots: config.initial_roots,
        }
    }

    pub fn len(&self) -> usize {
        self.hierarchy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hierarchy.is_empty()
    }

    pub fn root_count(&self) -> usize {
        self.hierarchy.root_count()
    }

    /// First `initial_roots` roots with all of their descendants.
    pub fn initial_items(&self) -> Vec<HierarchyItem> {
        if self.initial_roots == 0 {
            return Vec::new();
        }
        self.hierarchy
            .page(PageWindow::new(0, self.initial_roots - 1))
    }

    pub fn page(&self, window: PageWindow) -> Result<Vec<HierarchyItem>, LoadError> {
        if window.start_index > window.stop_index {
            return Err(LoadError::page_fetch(window, "start index is past stop index"));
        }
        Ok(self.hierarchy.page(window))
    }
}

fn generate_subtree(
    items: &mut Vec<HierarchyItem>,
    next_id: &mut u64,
    parent_id: Option<NodeId>,
    label: String,
    levels: usize,
    fanout: usize,
) {
    if levels == 0 {
        return;
    }
    let id = NodeId(*next_id);
    *next_id += 1;
    items.push(HierarchyItem::new(id, parent_id, label.clone()));
    for child in 1..=fanout {
        generate_subtree(
            items,
            next_id,
            Some(id),
            format!("{label}.{child}"),
            levels - 1,
            fanout,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(initial_roots: usize, total_roots: usize, depth: usize, fanout: usize) -> DatasetConfig {
        DatasetConfig {
            initial_roots,
            total_roots,
            depth,
            fanout,
            path: None,
        }
    }

    #[test]
    fn generates_full_subtrees_depth_first() {
        let dataset = Dataset::generate(&config(1, 2, 3, 2));
        // 1 + 2 + 4 items per root
        assert_eq!(dataset.len(), 14);
        assert_eq!(dataset.root_count(), 2);

        let first = dataset.initial_items();
        assert_eq!(first.len(), 7);
        assert_eq!(first[0].label, "Item 1");
        assert_eq!(first[1].label, "Item 1.1");
        assert_eq!(first[2].label, "Item 1.1.1");
        assert_eq!(first[2].parent_id, Some(first[1].id));
        assert_eq!(first[4].label, "Item 1.2");
    }

    #[test]
    fn pages_slice_roots_and_stop_at_the_end() {
        let dataset = Dataset::generate(&config(5, 8, 1, 0));
        assert_eq!(dataset.initial_items().len(), 5);

        let page = dataset.page(PageWindow::new(3, 13)).unwrap();
        let labels: Vec<&str> = page.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["Item 4", "Item 5", "Item 6", "Item 7", "Item 8"]);

        assert!(dataset.page(PageWindow::new(8, 18)).unwrap().is_empty());
        assert!(dataset.page(PageWindow::new(4, 2)).is_err());
    }

    #[test]
    fn loads_items_from_json() {
        let json = r#"[
            {"id": 10, "parentId": null, "label": "Root"},
            {"id": 11, "parentId": 10, "label": "Leaf"}
        ]"#;
        let dataset = Dataset::from_json(json, 1).unwrap();
        assert_eq!(dataset.initial_items().len(), 2);

        assert!(matches!(Dataset::from_json("{}", 1), Err(LoadError::Parse(_))));
    }

    #[test]
    fn missing_dataset_file_is_a_config_error() {
        let mut config = config(1, 1, 1, 0);
        config.path = Some("definitely/missing/items.json".to_string());
        assert!(matches!(Dataset::from_config(&config), Err(LoadError::Config(_))));
    }
}
