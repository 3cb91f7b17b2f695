use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::builder::{BuildObserver, ChildLoader, TreeBuilder};
use crate::error::LoadError;
use crate::expansion::ExpansionSet;
use crate::hierarchy::{Hierarchy, HierarchyItem, NodeId};
use crate::layout::VisibleRange;
use crate::paging::{PageOutcome, PageRequest, Pager, ScrollDirection};
use crate::tree::Forest;

/// Ids whose children are being fetched right now.
///
/// Clones share the same set, so a handle taken before [`TreeModel::rebuild`]
/// can be read while the pass is still awaiting its loads.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Rc<RefCell<BTreeSet<NodeId>>>);

impl InFlight {
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.0.borrow().contains(&node_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn insert(&self, node_id: NodeId) {
        self.0.borrow_mut().insert(node_id);
    }

    fn remove(&self, node_id: NodeId) {
        self.0.borrow_mut().remove(&node_id);
    }
}

/// Keeps [`InFlight`] current, then forwards to the caller's observer.
struct TrackingObserver<'a> {
    in_flight: &'a InFlight,
    inner: &'a dyn BuildObserver,
}

impl BuildObserver for TrackingObserver<'_> {
    fn load_started(&self, node_id: NodeId) {
        self.in_flight.insert(node_id);
        self.inner.load_started(node_id);
    }

    fn load_finished(&self, node_id: NodeId, error: Option<&LoadError>) {
        self.in_flight.remove(node_id);
        self.inner.load_finished(node_id, error);
    }
}

/// Everything the tree view knows, updated in one place.
///
/// Mutating methods never rebuild on their own; the owner calls
/// [`TreeModel::rebuild`] after any change that reports `true`.
pub struct TreeModel<L> {
    hierarchy: Hierarchy,
    expansion: ExpansionSet,
    forest: Forest,
    pager: Pager,
    in_flight: InFlight,
    builder: TreeBuilder<L>,
}

impl<L: ChildLoader> TreeModel<L> {
    pub fn new(builder: TreeBuilder<L>, page_size: usize) -> Self {
        Self {
            hierarchy: Hierarchy::default(),
            expansion: ExpansionSet::new(),
            forest: Forest::default(),
            pager: Pager::new(page_size),
            in_flight: InFlight::default(),
            builder,
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn expansion(&self) -> &ExpansionSet {
        &self.expansion
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Number of top-level virtual rows.
    pub fn row_count(&self) -> usize {
        self.forest.len()
    }

    /// Swap in a new item list. The previous snapshot is dropped so nothing
    /// loaded from the old items is reused.
    pub fn replace_source(&mut self, items: Vec<HierarchyItem>) {
        self.hierarchy = Hierarchy::new(items);
        self.forest = Forest::default();
    }

    pub async fn rebuild(&mut self, observer: &dyn BuildObserver) -> &Forest {
        let tracking = TrackingObserver {
            in_flight: &self.in_flight,
            inner: observer,
        };
        let forest = self
            .builder
            .build(&self.hierarchy, &self.expansion, Some(&self.forest), &tracking)
            .await;
        self.forest = forest;
        &self.forest
    }

    /// Label click. Ignored while the node's children are in flight.
    pub fn toggle(&mut self, node_id: NodeId) -> bool {
        let loading = self.in_flight.contains(node_id)
            || self.forest.find(node_id).is_some_and(|node| node.is_loading());
        self.expansion.toggle(node_id, loading)
    }

    pub fn set_expanded(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.expansion.set_expanded(ids);
    }

    pub fn flip(&mut self, node_id: NodeId) {
        self.expansion.flip(node_id);
    }

    pub fn expand_all(&mut self) -> usize {
        self.expansion.expand_all(&self.forest)
    }

    pub fn collapse_all(&mut self) -> bool {
        let changed = !self.expansion.is_empty();
        self.expansion.collapse_all();
        changed
    }

    pub fn on_scroll(
        &mut self,
        direction: ScrollDirection,
        visible: Option<VisibleRange>,
    ) -> Option<PageRequest> {
        let rows = self.row_count();
        self.pager.on_scroll(direction, visible, rows)
    }

    /// Ask for the next page when the last loaded row is already on screen,
    /// which scrolling alone can never trigger while the rows fit the
    /// viewport. Stops after a page that added nothing or failed; a user
    /// scroll retries those.
    pub fn fill_viewport(&mut self, visible: Option<VisibleRange>) -> Option<PageRequest> {
        if matches!(
            self.pager.last_outcome(),
            Some(PageOutcome::Exhausted | PageOutcome::Failed(_))
        ) {
            return None;
        }
        self.on_scroll(ScrollDirection::Forward, visible)
    }

    /// Apply the result of a page fetch: append, rebuild, clear loading.
    ///
    /// Returns `None` for completions that do not match the pending request.
    pub async fn finish_page(
        &mut self,
        request_id: u64,
        result: Result<Vec<HierarchyItem>, LoadError>,
        observer: &dyn BuildObserver,
    ) -> Option<PageOutcome> {
        if self.pager.pending_request() != Some(request_id) {
            return None;
        }
        let added = match result {
            Ok(items) => {
                let summary = self.hierarchy.append(items);
                if summary.added > 0 {
                    self.rebuild(observer).await;
                }
                Ok(summary.roots_added)
            }
            Err(error) => Err(error),
        };
        self.pager.complete(request_id, added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HierarchyChildLoader;
    use crate::layout::RowLayout;
    use crate::paging::PageWindow;
    use futures::FutureExt;
    use futures::future::LocalBoxFuture;
    use std::time::Duration;

    fn model_with_roots(count: u64) -> TreeModel<HierarchyChildLoader> {
        let mut model = TreeModel::new(TreeBuilder::new(HierarchyChildLoader), 10);
        let mut items = Vec::new();
        for id in 1..=count {
            items.push(HierarchyItem::root(id, format!("Item {id}")));
            items.push(HierarchyItem::child(id * 100, id, format!("Child of {id}")));
        }
        model.replace_source(items);
        model
    }

    #[tokio::test]
    async fn scrolling_to_the_end_appends_a_page() {
        let mut model = model_with_roots(5);
        model.rebuild(&()).await;
        assert_eq!(model.row_count(), 5);

        let request = model
            .on_scroll(ScrollDirection::Forward, Some(VisibleRange::new(0, 4)))
            .unwrap();
        assert_eq!(request.window, PageWindow::new(0, 14));
        assert!(model.pager().is_loading());

        let page = vec![
            HierarchyItem::root(6, "Item 6"),
            HierarchyItem::root(7, "Item 7"),
            HierarchyItem::root(8, "Item 8"),
        ];
        let outcome = model.finish_page(request.request_id, Ok(page), &()).await;

        assert_eq!(outcome, Some(PageOutcome::Appended { added: 3 }));
        assert_eq!(model.row_count(), 8);
        assert!(!model.pager().is_loading());
    }

    #[tokio::test]
    async fn duplicate_and_failed_pages_leave_rows_untouched() {
        let mut model = model_with_roots(5);
        model.rebuild(&()).await;
        let at_end = Some(VisibleRange::new(0, 4));

        let request = model.on_scroll(ScrollDirection::Forward, at_end).unwrap();
        let outcome = model
            .finish_page(request.request_id, Ok(vec![HierarchyItem::root(1, "Item 1")]), &())
            .await;
        assert_eq!(outcome, Some(PageOutcome::Exhausted));

        let request = model.on_scroll(ScrollDirection::Forward, at_end).unwrap();
        let error = LoadError::page_fetch(request.window, "HTTP 500");
        let outcome = model.finish_page(request.request_id, Err(error), &()).await;
        assert!(outcome.unwrap().is_failure());
        assert_eq!(model.row_count(), 5);
        assert!(!model.pager().is_loading());
    }

    #[tokio::test]
    async fn expand_all_then_rebuild_reveals_loaded_children() {
        let mut model = model_with_roots(2);
        model.rebuild(&()).await;

        assert_eq!(model.expand_all(), 4);
        model.rebuild(&()).await;
        assert!(model.forest().find(NodeId(200)).unwrap().is_leaf());

        assert!(model.collapse_all());
        assert!(!model.collapse_all());
        assert!(model.expansion().is_empty());
    }

    /// Waits before every load and fails the listed nodes.
    struct SlowLoader {
        failing: Vec<NodeId>,
    }

    impl ChildLoader for SlowLoader {
        fn load_children<'a>(
            &'a self,
            node_id: NodeId,
            source: &'a Hierarchy,
        ) -> LocalBoxFuture<'a, Result<Vec<HierarchyItem>, LoadError>> {
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                if self.failing.contains(&node_id) {
                    Err(LoadError::child_load(node_id, "unavailable"))
                } else {
                    Ok(source.children_of(node_id))
                }
            }
            .boxed_local()
        }
    }

    #[tokio::test]
    async fn in_flight_is_set_during_a_load_and_cleared_after_failure() {
        let loader = SlowLoader {
            failing: vec![NodeId(1)],
        };
        let mut model = TreeModel::new(TreeBuilder::new(loader), 10);
        model.replace_source(vec![
            HierarchyItem::root(1, "A"),
            HierarchyItem::child(2, 1, "B"),
        ]);
        let in_flight = model.in_flight();

        let check = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            in_flight.contains(NodeId(1))
        };
        let (_, seen_during_load) = futures::join!(model.rebuild(&()), check);

        assert!(seen_during_load);
        assert!(in_flight.is_empty());
        assert!(model.forest().find(NodeId(1)).unwrap().load_error().is_some());
    }

    #[tokio::test]
    async fn toggle_is_ignored_while_children_load() {
        let mut model = model_with_roots(1);
        model.rebuild(&()).await;

        model.in_flight.insert(NodeId(1));
        assert!(!model.toggle(NodeId(1)));
        assert!(model.expansion().is_empty());

        model.in_flight.remove(NodeId(1));
        assert!(model.toggle(NodeId(1)));
    }

    #[tokio::test]
    async fn rows_that_fit_the_viewport_request_pages_without_scrolling() {
        let mut model = model_with_roots(5);
        model.rebuild(&()).await;
        // 5 rows of 20px inside a 400px viewport: everything is visible.
        let visible = RowLayout::fixed(model.row_count(), 20.0).visible_range(0.0, 400.0);

        let request = model.fill_viewport(visible).unwrap();
        assert_eq!(request.window, PageWindow::new(0, 14));
        assert!(model.fill_viewport(visible).is_none());

        let page = vec![HierarchyItem::root(6, "Item 6"), HierarchyItem::root(7, "Item 7")];
        model.finish_page(request.request_id, Ok(page), &()).await;
        let visible = RowLayout::fixed(model.row_count(), 20.0).visible_range(0.0, 400.0);
        let request = model.fill_viewport(visible).unwrap();
        assert_eq!(request.window, PageWindow::new(0, 16));

        model.finish_page(request.request_id, Ok(vec![]), &()).await;
        assert!(model.fill_viewport(visible).is_none());
    }

    #[tokio::test]
    async fn label_clicks_and_chevron_flips() {
        let mut model = model_with_roots(1);
        model.rebuild(&()).await;

        assert!(model.toggle(NodeId(1)));
        assert!(!model.toggle(NodeId(1)));
        model.flip(NodeId(1));
        assert!(model.expansion().is_empty());

        model.set_expanded([NodeId(1), NodeId(100)]);
        model.rebuild(&()).await;
        assert_eq!(model.forest().get(0).unwrap().visible_row_count(model.expansion()), 2);
    }
}
