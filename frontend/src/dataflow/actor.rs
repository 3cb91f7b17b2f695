//! Single-value state owned by one sequential event loop.

use std::future::Future;
use std::sync::Arc;
use zoon::{Mutable, Signal, Task, TaskHandle};

/// Reactive state mutated only by its own processor.
///
/// The processor receives the underlying `Mutable` and usually loops over
/// one or more relay streams with `select!`, handling one event at a time.
/// The UI reads the state through [`Actor::signal`] and [`Actor::signal_ref`].
///
/// The processor runs on the browser's single thread, so neither the state
/// nor the futures it awaits need to be `Send`.
#[derive(Clone, Debug)]
pub struct Actor<T>
where
    T: Clone + 'static,
{
    state: Mutable<T>,
    #[allow(dead_code)]
    task_handle: Arc<TaskHandle>,
    #[cfg(debug_assertions)]
    #[allow(dead_code)]
    creation_location: &'static std::panic::Location<'static>,
}

impl<T> Actor<T>
where
    T: Clone + 'static,
{
    /// Start the processor. It is dropped together with the last clone of
    /// the Actor.
    #[track_caller]
    pub fn new<F, Fut>(initial_state: T, processor: F) -> Self
    where
        F: FnOnce(Mutable<T>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let state = Mutable::new(initial_state);
        let task_handle = Arc::new(Task::start_droppable(processor(state.clone())));

        Self {
            state,
            task_handle,
            #[cfg(debug_assertions)]
            creation_location: std::panic::Location::caller(),
        }
    }

    pub fn signal(&self) -> impl Signal<Item = T> + use<T> {
        self.state.signal_cloned()
    }

    pub fn signal_ref<U, F>(&self, f: F) -> impl Signal<Item = U> + use<T, U, F>
    where
        F: FnMut(&T) -> U + 'static,
        U: 'static,
    {
        self.state.signal_ref(f)
    }
}
