use futures::FutureExt;
use futures::future::LocalBoxFuture;
use shared::{ChildLoader, Hierarchy, HierarchyChildLoader, HierarchyItem, LoadError, NodeId};
use zoon::Timer;

/// Waits before every child load, so loading indicators are visible the way
/// they would be against a remote source.
pub struct DelayedChildLoader<L = HierarchyChildLoader> {
    inner: L,
    delay_ms: u32,
}

impl<L: ChildLoader> DelayedChildLoader<L> {
    pub fn new(inner: L, delay_ms: u32) -> Self {
        Self { inner, delay_ms }
    }
}

impl<L: ChildLoader> ChildLoader for DelayedChildLoader<L> {
    fn load_children<'a>(
        &'a self,
        node_id: NodeId,
        source: &'a Hierarchy,
    ) -> LocalBoxFuture<'a, Result<Vec<HierarchyItem>, LoadError>> {
        async move {
            if self.delay_ms > 0 {
                Timer::sleep(self.delay_ms).await;
            }
            self.inner.load_children(node_id, source).await
        }
        .boxed_local()
    }
}
