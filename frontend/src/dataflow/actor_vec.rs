//! Collection counterpart of [`Actor`](super::Actor).

use std::future::Future;
use std::sync::Arc;
use zoon::{MutableVec, SignalVec, Task, TaskHandle};

/// Reactive list mutated only by its own processor.
///
/// The UI binds to [`ActorVec::signal_vec`], which emits `VecDiff`s, so
/// adding or removing one item does not rebuild the others.
#[derive(Clone, Debug)]
pub struct ActorVec<T>
where
    T: Clone + 'static,
{
    vec: MutableVec<T>,
    #[allow(dead_code)]
    task_handle: Arc<TaskHandle>,
}

impl<T> ActorVec<T>
where
    T: Clone + 'static,
{
    pub fn new<F, Fut>(initial_items: Vec<T>, processor: F) -> Self
    where
        F: FnOnce(ActorVecHandle<T>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let vec = MutableVec::new_with_values(initial_items);
        let handle = ActorVecHandle {
            mutable_vec: vec.clone(),
        };
        let task_handle = Arc::new(Task::start_droppable(processor(handle)));
        Self { vec, task_handle }
    }

    pub fn signal_vec(&self) -> impl SignalVec<Item = T> + use<T> {
        self.vec.signal_vec_cloned()
    }
}

/// Write access to an [`ActorVec`], only handed to its processor.
pub struct ActorVecHandle<T>
where
    T: Clone + 'static,
{
    mutable_vec: MutableVec<T>,
}

impl<T> ActorVecHandle<T>
where
    T: Clone + 'static,
{
    pub fn push_cloned(&self, item: T) {
        self.mutable_vec.lock_mut().push_cloned(item);
    }

    /// Keep the items matching `f`; returns how many were removed.
    pub fn retain<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut items = self.mutable_vec.lock_mut();
        let initial_len = items.len();
        items.retain(|item| f(item));
        initial_len - items.len()
    }
}
