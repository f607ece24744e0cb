use crate::{Comparator, QueueError, Result};

/// Elements laid out as an implicit binary heap over a [`Vec`].
///
/// The raw mutations ([`HeapStore::append_raw`], [`HeapStore::remove_root_raw`]) leave the heap
/// property broken on purpose; the matching restoration ([`HeapStore::sift_up_last`],
/// [`HeapStore::sift_down_root`]) has to run before the store is observed again.
#[derive(Debug, Clone)]
pub struct HeapStore<T, C> {
    data: Vec<T>,
    cmp: C,
}

impl<T, C: Comparator<T>> HeapStore<T, C> {
    /// Takes ownership of `data` and establishes the heap property over it.
    pub fn from_vec(data: Vec<T>, cmp: C) -> Self {
        let mut store = Self { data, cmp };
        store.heapify();
        store
    }

    /// Reserves room for `additional` more elements.
    /// # Error
    /// Returns [`QueueError::Alloc`] if the sequence cannot grow.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.data
            .try_reserve(additional)
            .map_err(|_| QueueError::Alloc {
                requested: additional,
            })
    }

    /// Appends `value` at the end without restoring the heap property.
    pub fn append_raw(&mut self, value: T) -> Result<()> {
        self.reserve(1)?;
        self.data.push(value);
        Ok(())
    }

    /// Moves the last element into the root slot and shrinks by one, returning the old root.
    /// The heap property is not restored.
    pub fn remove_root_raw(&mut self) -> Result<T> {
        if self.data.is_empty() {
            return Err(QueueError::Empty);
        }
        Ok(self.data.swap_remove(0))
    }

    /// Moves the last element up until its parent is not less than it. O(log n).
    pub fn sift_up_last(&mut self) {
        let Some(mut pos) = self.data.len().checked_sub(1) else {
            return;
        };
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.cmp.less(&self.data[parent], &self.data[pos]) {
                break;
            }
            self.data.swap(parent, pos);
            pos = parent;
        }
    }

    /// Moves the root down, swapping with its higher priority child, until it is not less than
    /// either child or reaches a leaf. O(log n).
    pub fn sift_down_root(&mut self) {
        self.sift_down(0);
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.data.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.cmp.less(&self.data[left], &self.data[right]) {
                right
            } else {
                left
            };
            if !self.cmp.less(&self.data[pos], &self.data[child]) {
                break;
            }
            self.data.swap(pos, child);
            pos = child;
        }
    }

    /// Bottom-up heap construction. O(n).
    pub fn heapify(&mut self) {
        for pos in (0..self.data.len() / 2).rev() {
            self.sift_down(pos);
        }
    }

    /// Checks the heap property over the whole store.
    pub fn is_heap(&self) -> bool {
        (1..self.data.len()).all(|pos| {
            let parent = (pos - 1) / 2;
            !self.cmp.less(&self.data[parent], &self.data[pos])
        })
    }

    pub fn peek_root(&self) -> Option<&T> {
        self.data.first()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Empties the store, returning the elements in their heap layout.
    pub fn take_vec(&mut self) -> Vec<T> {
        std::mem::take(&mut self.data)
    }

    /// Empties the store, returning the elements ordered by priority, top first.
    pub fn drain_sorted(&mut self) -> Vec<T> {
        let mut sorted = Vec::with_capacity(self.data.len());
        while let Ok(top) = self.remove_root_raw() {
            self.sift_down_root();
            sorted.push(top);
        }
        sorted
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::HeapStore;
    use crate::{Ascending, Descending, QueueError};

    #[test]
    fn from_vec_builds_heap() {
        let store = HeapStore::from_vec(vec![3, 1, 4, 1, 5, 9, 2, 6], Ascending);
        assert!(store.is_heap());
        assert_eq!(store.peek_root(), Some(&9));
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn append_then_sift_up() {
        let mut store = HeapStore::from_vec(vec![5, 1], Ascending);
        store.append_raw(9).unwrap();
        // -- raw append leaves the new maximum at the back
        assert_eq!(store.peek_root(), Some(&5));
        store.sift_up_last();
        assert!(store.is_heap());
        assert_eq!(store.peek_root(), Some(&9));
    }

    #[test]
    fn remove_root_then_sift_down() {
        let mut store = HeapStore::from_vec(vec![5, 1, 9], Ascending);
        assert_eq!(store.remove_root_raw(), Ok(9));
        store.sift_down_root();
        assert!(store.is_heap());
        assert_eq!(store.peek_root(), Some(&5));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_root_on_empty_is_reported() {
        let mut store = HeapStore::<u32, _>::from_vec(vec![], Ascending);
        assert_eq!(store.remove_root_raw(), Err(QueueError::Empty));
        assert!(store.is_empty());
    }

    /// A failed reservation reports the request and leaves the store as it was.
    #[test]
    fn impossible_reserve_leaves_store_untouched() {
        let mut store = HeapStore::from_vec(vec![3, 1, 2], Ascending);
        assert_eq!(
            store.reserve(usize::MAX),
            Err(QueueError::Alloc {
                requested: usize::MAX
            })
        );
        assert_eq!(store.len(), 3);
        assert!(store.is_heap());
        assert_eq!(store.peek_root(), Some(&3));

        store.append_raw(4).unwrap();
        store.sift_up_last();
        assert_eq!(store.peek_root(), Some(&4));
    }

    #[test]
    fn sift_on_empty_is_noop() {
        let mut store = HeapStore::<u32, _>::from_vec(vec![], Ascending);
        store.sift_up_last();
        store.sift_down_root();
        assert!(store.is_empty());
    }

    #[test]
    fn descending_is_min_heap() {
        let mut store = HeapStore::from_vec(vec![7, 3, 8, 2], Descending);
        assert_eq!(store.drain_sorted(), vec![2, 3, 7, 8]);
        assert!(store.is_empty());
    }

    proptest! {
        #[test]
        fn appends_keep_heap_property(values in proptest::collection::vec(any::<i32>(), 0..200)) {
            let mut store = HeapStore::from_vec(vec![], Ascending);
            for v in values {
                store.append_raw(v).unwrap();
                store.sift_up_last();
                prop_assert!(store.is_heap());
            }
        }

        #[test]
        fn drain_is_sorted(values in proptest::collection::vec(any::<i32>(), 0..200)) {
            let mut expected = values.clone();
            expected.sort_unstable_by(|a, b| b.cmp(a));

            let mut store = HeapStore::from_vec(values, Ascending);
            prop_assert!(store.is_heap());
            prop_assert_eq!(store.drain_sorted(), expected);
        }

        #[test]
        fn removals_keep_heap_property(values in proptest::collection::vec(any::<u8>(), 1..100)) {
            let mut store = HeapStore::from_vec(values, Descending);
            while !store.is_empty() {
                store.remove_root_raw().unwrap();
                store.sift_down_root();
                prop_assert!(store.is_heap());
            }
        }
    }
}
