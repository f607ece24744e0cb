mod comparator;
mod error;
mod gate;
mod heap;
mod queue;
mod signal;
#[cfg(any(test, feature = "test-suite"))]
pub mod test;
mod worker;

// region:    --- Exports
pub use comparator::{Ascending, Comparator, Descending};
pub use error::{QueueError, Result};
pub use heap::HeapStore;
pub use queue::{Cfg, PipelinedQueue};
// endregion: --- Exports

/// Operations shared by every priority queue implementation in this workspace.
///
/// The top element is the one for which the queue's [`Comparator`] reports no other element
/// as "greater", so an [`Ascending`] queue behaves as a max-heap.
pub trait PriorityQueue<T>: Send + Sync + 'static
where
    T: Clone + Send + 'static,
{
    /// Inserts `value`. Implementations may return before the heap property is restored, but
    /// every later call must observe a fully ordered queue.
    fn push(&self, value: T) -> Result<()>;

    /// Inserts the element produced by `make`. The element is created while the queue is
    /// exclusively held.
    fn emplace<F>(&self, make: F) -> Result<()>
    where
        F: FnOnce() -> T;

    /// Removes the top element without returning it.
    /// # Error
    /// Returns [`QueueError::Empty`] if there is nothing to remove.
    fn pop(&self) -> Result<()>;

    /// Returns a copy of the top element.
    /// # Error
    /// Returns [`QueueError::Empty`] if the queue holds no elements.
    fn top(&self) -> Result<T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool;

    /// Reads the top element and removes it.
    /// # Note
    /// The two steps are separate queue operations. Another thread may push or pop in between,
    /// so the removed element is not necessarily the one returned.
    fn pop_top(&self) -> Result<T> {
        let top = self.top()?;
        self.pop()?;
        Ok(top)
    }
}
