use std::sync::{Mutex, MutexGuard, PoisonError};

use ppqueue::{Ascending, Comparator, HeapStore, PriorityQueue, QueueError, Result};

/// Priority queue behind a single [`Mutex`]. Every operation, including heap restoration, runs
/// on the calling thread while the lock is held.
#[derive(Debug)]
pub struct LockedQueue<T, C = Ascending> {
    storage: Mutex<HeapStore<T, C>>,
}

impl<T: Ord> LockedQueue<T, Ascending> {
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_comparator(capacity, Ascending)
    }
}

impl<T, C: Comparator<T>> LockedQueue<T, C> {
    pub fn with_comparator(capacity: usize, cmp: C) -> Result<Self> {
        let mut storage = HeapStore::from_vec(Vec::new(), cmp);
        storage.reserve(capacity)?;
        Ok(Self {
            storage: Mutex::new(storage),
        })
    }

    fn storage(&self) -> Result<MutexGuard<'_, HeapStore<T, C>>> {
        self.storage.lock().map_err(|_| QueueError::Poisoned)
    }
}

impl<T, C> PriorityQueue<T> for LockedQueue<T, C>
where
    T: Clone + Send + 'static,
    C: Comparator<T> + Send + 'static,
{
    fn push(&self, value: T) -> Result<()> {
        let mut storage = self.storage()?;
        storage.append_raw(value)?;
        storage.sift_up_last();
        Ok(())
    }

    fn emplace<F>(&self, make: F) -> Result<()>
    where
        F: FnOnce() -> T,
    {
        let value = make();
        self.push(value)
    }

    fn pop(&self) -> Result<()> {
        let mut storage = self.storage()?;
        storage.remove_root_raw()?;
        storage.sift_down_root();
        Ok(())
    }

    fn top(&self) -> Result<T> {
        self.storage()?.peek_root().cloned().ok_or(QueueError::Empty)
    }

    fn len(&self) -> usize {
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn is_empty(&self) -> bool {
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

#[cfg(test)]
mod test_suite {
    use ppqueue::test::suite;

    use super::LockedQueue;

    struct LockedTester;

    impl suite::Tester<LockedQueue<u64>> for LockedTester {
        fn create_queue(&self) -> LockedQueue<u64> {
            LockedQueue::new(1_000).unwrap()
        }
    }

    #[test]
    fn push_pop_scenario() {
        suite::test_push_pop_scenario(LockedTester);
    }

    #[test]
    fn empty_queue() {
        suite::test_empty_queue(LockedTester);
    }

    #[test]
    fn len_tracks_operations() {
        suite::test_len_tracks_operations(LockedTester);
    }

    #[test]
    fn top_is_maximum() {
        suite::test_top_is_maximum(LockedTester);
    }

    #[test]
    fn emplace() {
        suite::test_emplace(LockedTester);
    }

    #[test]
    fn drain_order() {
        suite::test_drain_order(LockedTester);
    }

    #[test]
    fn interleaved_push_pop() {
        suite::test_interleaved_push_pop(LockedTester);
    }

    #[test]
    fn concurrent_push() {
        suite::test_concurrent_push(LockedTester);
    }

    #[test]
    fn concurrent_top_observers() {
        suite::test_concurrent_top_observers(LockedTester);
    }

    #[test]
    fn concurrent_push_and_pop() {
        suite::test_concurrent_push_and_pop(LockedTester);
    }
}
