//! Tree view domain: one Actor owns the [`TreeModel`] and publishes an
//! immutable [`TreeSnapshot`] after every change.

mod loader;
mod page_source;
mod view;

pub use loader::DelayedChildLoader;
pub use page_source::PageSource;
pub use view::tree_view_panel;

use futures::{StreamExt, select};
use shared::{
    BuildObserver, ChildLoader, ExpansionSet, Forest, HierarchyChildLoader, HierarchyItem,
    LoadError, NodeId, PageOutcome, PageRequest, RowLayout, ScrollTracker, TreeBuilder,
    TreeModel, TreeViewConfig, VisibleRange,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use zoon::{Mutable, Task, Timer};

use crate::dataflow::{Actor, Relay, relay};
use crate::debug_utils::{debug_critical, debug_throttled};
use crate::error_display::{ErrorAlert, ErrorDisplay};

/// What the view renders. Replaced as a whole after every event.
#[derive(Clone, Debug, Default)]
pub struct TreeSnapshot {
    pub forest: Arc<Forest>,
    pub expansion: Arc<ExpansionSet>,
    pub layout: Arc<RowLayout>,
    /// Nodes whose children are being fetched right now.
    pub loading_nodes: BTreeSet<NodeId>,
    pub page_loading: bool,
    pub last_outcome: Option<PageOutcome>,
}

impl TreeSnapshot {
    pub fn is_node_loading(&self, node_id: NodeId) -> bool {
        self.loading_nodes.contains(&node_id)
    }

    /// Flag a node whose children load now. Nodes already shown get the
    /// `Loading` state, so an expanded one renders a loading row.
    pub fn start_loading(&mut self, node_id: NodeId) {
        self.loading_nodes.insert(node_id);
        if self.forest.find(node_id).is_some() {
            Arc::make_mut(&mut self.forest).mark_loading(node_id);
        }
    }

    /// Clear the in-flight flag; returns the node's label when it is shown.
    /// The `Loading` state itself goes away with the next published forest.
    pub fn finish_loading(&mut self, node_id: NodeId) -> Option<String> {
        self.loading_nodes.remove(&node_id);
        self.forest
            .find(node_id)
            .map(|node| node.label().to_string())
    }

    pub fn status_text(&self) -> String {
        let rows = self.forest.len();
        if self.page_loading {
            return format!("{rows} items · loading more…");
        }
        match &self.last_outcome {
            Some(PageOutcome::Appended { added }) => format!("{rows} items · {added} just added"),
            Some(PageOutcome::Exhausted) => format!("{rows} items · no more items"),
            Some(PageOutcome::Failed(_)) => format!("{rows} items · loading more failed"),
            None => format!("{rows} items"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollPosition {
    pub offset: f64,
    pub viewport_height: f64,
}

type PageResult = (u64, Result<Vec<HierarchyItem>, LoadError>);

#[derive(Clone)]
pub struct TreeView {
    pub snapshot: Actor<TreeSnapshot>,
    pub config: TreeViewConfig,

    // === USER EVENTS ===
    pub label_clicked_relay: Relay<NodeId>,
    pub chevron_clicked_relay: Relay<NodeId>,
    pub expand_all_clicked_relay: Relay,
    pub collapse_all_clicked_relay: Relay,
    pub scrolled_relay: Relay<ScrollPosition>,

    // === DATA EVENTS ===
    /// Replaces the whole item list, e.g. with the initial items.
    pub items_received_relay: Relay<Vec<HierarchyItem>>,
}

impl TreeView {
    pub fn new(config: TreeViewConfig, page_source: PageSource, errors: ErrorDisplay) -> Self {
        let (label_clicked_relay, mut label_clicked_stream) = relay::<NodeId>();
        let (chevron_clicked_relay, mut chevron_clicked_stream) = relay::<NodeId>();
        let (expand_all_clicked_relay, mut expand_all_clicked_stream) = relay::<()>();
        let (collapse_all_clicked_relay, mut collapse_all_clicked_stream) = relay::<()>();
        let (scrolled_relay, mut scrolled_stream) = relay::<ScrollPosition>();
        let (items_received_relay, mut items_received_stream) = relay::<Vec<HierarchyItem>>();

        let snapshot = Actor::new(TreeSnapshot::default(), {
            let config = config.clone();
            async move |state| {
                let (page_loaded_relay, mut page_loaded_stream) = relay::<PageResult>();
                let loader = DelayedChildLoader::new(HierarchyChildLoader, config.child_load_delay_ms);
                let builder = TreeBuilder::new(loader).with_sibling_loading(config.sibling_loading);
                let mut model = TreeModel::new(builder, config.page_size);
                let mut scroll_tracker = ScrollTracker::default();
                let mut viewport = ScrollPosition {
                    offset: 0.0,
                    viewport_height: config.viewport_height,
                };
                let observer = SnapshotObserver {
                    state: state.clone(),
                    errors: errors.clone(),
                };
                let start_fetch = |request: PageRequest| {
                    zoon::println!("Requesting items {}", request.window);
                    state.lock_mut().page_loading = true;
                    fetch_page(
                        page_source.clone(),
                        request,
                        config.page_load_delay_ms,
                        page_loaded_relay.clone(),
                    );
                };

                loop {
                    select! {
                        items = items_received_stream.next() => {
                            if let Some(items) = items {
                                zoon::println!("Tree view received {} items", items.len());
                                model.replace_source(items);
                                rebuild_and_publish(&state, &mut model, &config, &observer).await;
                                let visible = visible_range(&state, viewport);
                                if let Some(request) = model.fill_viewport(visible) {
                                    start_fetch(request);
                                }
                            }
                        }
                        node_id = label_clicked_stream.next() => {
                            if let Some(node_id) = node_id {
                                if model.toggle(node_id) {
                                    rebuild_and_publish(&state, &mut model, &config, &observer).await;
                                }
                            }
                        }
                        node_id = chevron_clicked_stream.next() => {
                            if let Some(node_id) = node_id {
                                model.flip(node_id);
                                rebuild_and_publish(&state, &mut model, &config, &observer).await;
                            }
                        }
                        clicked = expand_all_clicked_stream.next() => {
                            if clicked.is_some() {
                                let expanded = model.expand_all();
                                zoon::println!("Expanded {expanded} nodes");
                                rebuild_and_publish(&state, &mut model, &config, &observer).await;
                            }
                        }
                        clicked = collapse_all_clicked_stream.next() => {
                            if clicked.is_some() && model.collapse_all() {
                                rebuild_and_publish(&state, &mut model, &config, &observer).await;
                            }
                        }
                        position = scrolled_stream.next() => {
                            if let Some(position) = position {
                                viewport = position;
                                let direction = scroll_tracker.direction(position.offset);
                                let visible = visible_range(&state, position);
                                debug_throttled(|| format!(
                                    "Scrolled to {:.0}px {direction:?}, visible {visible:?}",
                                    position.offset
                                ));
                                if let Some(request) = model.on_scroll(direction, visible) {
                                    start_fetch(request);
                                }
                            }
                        }
                        page = page_loaded_stream.next() => {
                            if let Some((request_id, result)) = page {
                                match model.finish_page(request_id, result, &observer).await {
                                    Some(outcome) => {
                                        if let PageOutcome::Failed(error) = &outcome {
                                            errors.report(ErrorAlert::new_page_load_error(error));
                                        } else {
                                            zoon::println!("Page #{request_id} finished: {outcome:?}");
                                        }
                                        publish(&state, &model, &config);
                                        let visible = visible_range(&state, viewport);
                                        if let Some(request) = model.fill_viewport(visible) {
                                            start_fetch(request);
                                        }
                                    }
                                    None => debug_critical(&format!(
                                        "Ignoring response for stale page request #{request_id}"
                                    )),
                                }
                            }
                        }
                    }
                }
            }
        });

        Self {
            snapshot,
            config,
            label_clicked_relay,
            chevron_clicked_relay,
            expand_all_clicked_relay,
            collapse_all_clicked_relay,
            scrolled_relay,
            items_received_relay,
        }
    }
}

/// Mirrors per-node loads into the snapshot while a build pass runs.
struct SnapshotObserver {
    state: Mutable<TreeSnapshot>,
    errors: ErrorDisplay,
}

impl BuildObserver for SnapshotObserver {
    fn load_started(&self, node_id: NodeId) {
        self.state.lock_mut().start_loading(node_id);
    }

    fn load_finished(&self, node_id: NodeId, error: Option<&LoadError>) {
        let label = self.state.lock_mut().finish_loading(node_id);
        if let Some(error) = error {
            let label = label.unwrap_or_else(|| format!("Item {node_id}"));
            self.errors
                .report(ErrorAlert::new_child_load_error(node_id, &label, error));
        }
    }
}

/// Show the new expansion right away, so nodes waiting for children are on
/// screen with their loading state, then publish the rebuilt forest.
async fn rebuild_and_publish<L: ChildLoader>(
    state: &Mutable<TreeSnapshot>,
    model: &mut TreeModel<L>,
    config: &TreeViewConfig,
    observer: &SnapshotObserver,
) {
    publish(state, model, config);
    model.rebuild(observer).await;
    publish(state, model, config);
}

fn visible_range(state: &Mutable<TreeSnapshot>, viewport: ScrollPosition) -> Option<VisibleRange> {
    state
        .lock_ref()
        .layout
        .visible_range(viewport.offset, viewport.viewport_height)
}

fn publish<L: ChildLoader>(
    state: &Mutable<TreeSnapshot>,
    model: &TreeModel<L>,
    config: &TreeViewConfig,
) {
    let layout = RowLayout::for_sizing(
        config.row_sizing,
        model.forest(),
        model.expansion(),
        config.row_height,
    );
    let mut snapshot = state.lock_mut();
    snapshot.forest = Arc::new(model.forest().clone());
    snapshot.expansion = Arc::new(model.expansion().clone());
    snapshot.layout = Arc::new(layout);
    snapshot.page_loading = model.pager().is_loading();
    snapshot.last_outcome = model.pager().last_outcome().cloned();
}

fn fetch_page(
    source: PageSource,
    request: PageRequest,
    delay_ms: u32,
    page_loaded_relay: Relay<PageResult>,
) {
    Task::start(async move {
        if delay_ms > 0 {
            Timer::sleep(delay_ms).await;
        }
        let result = source.fetch(request).await;
        page_loaded_relay.send((request.request_id, result));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{PageWindow, TreeNode, VisibleRow};

    fn snapshot_with_rows(count: u64) -> TreeSnapshot {
        let roots = (1..=count)
            .map(|id| TreeNode::pending(HierarchyItem::root(id, format!("Item {id}"))))
            .collect();
        TreeSnapshot {
            forest: Arc::new(Forest::new(roots)),
            ..TreeSnapshot::default()
        }
    }

    #[test]
    fn status_text_tells_empty_and_failed_pages_apart() {
        let mut snapshot = snapshot_with_rows(8);
        assert_eq!(snapshot.status_text(), "8 items");

        snapshot.page_loading = true;
        assert_eq!(snapshot.status_text(), "8 items · loading more…");

        snapshot.page_loading = false;
        snapshot.last_outcome = Some(PageOutcome::Exhausted);
        assert_eq!(snapshot.status_text(), "8 items · no more items");

        snapshot.last_outcome = Some(PageOutcome::Failed(LoadError::page_fetch(
            PageWindow::new(0, 17),
            "HTTP 500",
        )));
        assert_eq!(snapshot.status_text(), "8 items · loading more failed");

        snapshot.last_outcome = Some(PageOutcome::Appended { added: 3 });
        assert_eq!(snapshot.status_text(), "8 items · 3 just added");
    }

    #[test]
    fn loading_nodes_are_looked_up_by_id() {
        let mut snapshot = snapshot_with_rows(2);
        snapshot.loading_nodes.insert(NodeId(2));
        assert!(snapshot.is_node_loading(NodeId(2)));
        assert!(!snapshot.is_node_loading(NodeId(1)));
    }

    #[test]
    fn expanded_node_shows_a_loading_row_while_its_children_load() {
        let mut snapshot = snapshot_with_rows(2);
        snapshot.expansion = Arc::new([NodeId(1)].into_iter().collect());

        snapshot.start_loading(NodeId(1));
        assert!(snapshot.is_node_loading(NodeId(1)));
        assert!(snapshot.forest.find(NodeId(1)).unwrap().is_loading());
        let rows = snapshot.forest.get(0).unwrap().visible_rows(&snapshot.expansion);
        assert!(matches!(rows[1], VisibleRow::Loading { node_id: NodeId(1), depth: 1 }));

        assert_eq!(snapshot.finish_loading(NodeId(1)), Some("Item 1".to_string()));
        assert!(!snapshot.is_node_loading(NodeId(1)));
    }

    #[test]
    fn nodes_not_on_screen_are_only_tracked_by_id() {
        let mut snapshot = snapshot_with_rows(1);
        snapshot.start_loading(NodeId(42));
        assert!(snapshot.is_node_loading(NodeId(42)));
        assert_eq!(snapshot.finish_loading(NodeId(42)), None);
        assert!(snapshot.loading_nodes.is_empty());
    }
}
