use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use crate::{
    Ascending, Comparator, HeapStore, PriorityQueue, QueueError, Result,
    gate::{Gate, GatePass},
    signal::{Signal, signal},
    worker::{Restoration, Worker},
};

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(0);

/// Construction options of a [`PipelinedQueue`].
#[derive(Debug, Clone)]
pub struct Cfg {
    /// Number of elements to reserve room for on top of the initial container.
    pub capacity: usize,
    /// Thread name prefix of both workers. They are named `<prefix>-push` and `<prefix>-pop`.
    pub worker_name: String,
}

impl Default for Cfg {
    fn default() -> Self {
        Self {
            capacity: 0,
            worker_name: "ppqueue".to_string(),
        }
    }
}

/// State reachable from the queue and both of its workers.
#[derive(Debug)]
pub(crate) struct Shared<T, C> {
    pub(crate) gate: Gate,
    /// Only locked by the current gate holder, so the lock itself is never contended.
    pub(crate) store: Mutex<HeapStore<T, C>>,
    pub(crate) shutdown: AtomicBool,
}

/// A priority queue that hands heap restoration off to two background threads.
///
/// `push` and `pop` perform the cheap raw mutation and return right away. The matching worker
/// restores the heap property and only then reopens the queue, so the next operation (from any
/// thread) waits for it and never observes a partially restored heap.
///
/// Operations are strictly serialized. What is gained is overlap: the caller continues with its
/// own work while the O(log n) restoration runs.
///
/// Dropping the queue stops and joins both workers.
#[derive(Debug)]
pub struct PipelinedQueue<T, C = Ascending> {
    id: u64,
    shared: Arc<Shared<T, C>>,
    push_signal: Signal,
    pop_signal: Signal,
    inserter: Worker,
    remover: Worker,
}

impl<T> PipelinedQueue<T, Ascending>
where
    T: Ord + Send + 'static,
{
    /// Creates an empty max-heap queue.
    pub fn new() -> Result<Self> {
        Self::with_comparator(Ascending)
    }
}

impl<T, C> PipelinedQueue<T, C>
where
    T: Send + 'static,
    C: Comparator<T> + Send + 'static,
{
    pub fn with_comparator(cmp: C) -> Result<Self> {
        Self::from_container(cmp, Vec::new())
    }

    /// Takes over `container` and orders it according to `cmp`.
    pub fn from_container(cmp: C, container: Vec<T>) -> Result<Self> {
        Self::start(Cfg::default(), cmp, container)
    }

    /// Appends everything `iter` yields to `container`, then orders the result.
    pub fn from_iter_with<I>(iter: I, cmp: C, mut container: Vec<T>) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        container
            .try_reserve(lower)
            .map_err(|_| QueueError::Alloc { requested: lower })?;
        container.extend(iter);
        Self::start(Cfg::default(), cmp, container)
    }

    /// Builds the heap synchronously, starts both workers and opens the queue.
    /// # Error
    /// Fails with [`QueueError::Alloc`] if `cfg.capacity` cannot be reserved and with
    /// [`QueueError::Spawn`] if a worker thread cannot be started.
    pub fn start(cfg: Cfg, cmp: C, container: Vec<T>) -> Result<Self> {
        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);

        let mut store = HeapStore::from_vec(container, cmp);
        store.reserve(cfg.capacity)?;
        let len = store.len();

        let shared = Arc::new(Shared {
            gate: Gate::closed(),
            store: Mutex::new(store),
            shutdown: AtomicBool::new(false),
        });

        let (push_signal, push_waiter) = signal(Restoration::SiftUp.name());
        let (pop_signal, pop_waiter) = signal(Restoration::SiftDown.name());

        let mut inserter = Worker::spawn(
            Restoration::SiftUp,
            &cfg.worker_name,
            id,
            Arc::clone(&shared),
            push_waiter,
        )?;
        let remover = match Worker::spawn(
            Restoration::SiftDown,
            &cfg.worker_name,
            id,
            Arc::clone(&shared),
            pop_waiter,
        ) {
            Ok(remover) => remover,
            Err(e) => {
                // -- a disconnected signal stops the inserter
                drop(push_signal);
                inserter.join();
                return Err(e);
            }
        };

        shared.gate.release();
        tracing::debug!(queue = id, len, "queue started");

        Ok(Self {
            id,
            shared,
            push_signal,
            pop_signal,
            inserter,
            remover,
        })
    }

    /// Process-unique identity of this queue. [`PipelinedQueue::swap`] locks queues in
    /// ascending id order.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Exchanges the elements and comparators of `self` and `other`.
    ///
    /// Both queues are held for the duration of the swap. They are always acquired lowest id
    /// first, so concurrent `a.swap(&b)` and `b.swap(&a)` cannot deadlock.
    pub fn swap(&self, other: &Self) -> Result<()> {
        if self.id == other.id {
            return Ok(());
        }
        let (first, second) = if self.id < other.id {
            (self, other)
        } else {
            (other, self)
        };

        let first_pass = first.shared.gate.acquire();
        let second_pass = second.shared.gate.acquire();
        let mut first_store = first.store(&first_pass)?;
        let mut second_store = second.store(&second_pass)?;
        std::mem::swap(&mut *first_store, &mut *second_store);

        tracing::trace!(first = first.id, second = second.id, "queues swapped");
        Ok(())
    }

    /// Shuts the queue down and returns the remaining elements in heap layout.
    pub fn into_vec(mut self) -> Vec<T> {
        self.shut_down();
        let mut store = self
            .shared
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        store.take_vec()
    }

    /// Shuts the queue down and returns the remaining elements ordered by priority, top first.
    /// # Error
    /// Returns [`QueueError::Poisoned`] if a comparator panicked earlier.
    pub fn into_sorted_vec(mut self) -> Result<Vec<T>> {
        self.shut_down();
        let mut store = self.shared.store.lock().map_err(|_| QueueError::Poisoned)?;
        Ok(store.drain_sorted())
    }

    /// Locks the store. Requiring a pass ensures the lock is only taken by the gate holder.
    fn store<'a>(&'a self, _pass: &GatePass<'_>) -> Result<MutexGuard<'a, HeapStore<T, C>>> {
        self.shared.store.lock().map_err(|_| QueueError::Poisoned)
    }

    /// Like [`PipelinedQueue::store`], for reads that stay meaningful after a comparator panic.
    fn store_for_read<'a>(&'a self, _pass: &GatePass<'_>) -> MutexGuard<'a, HeapStore<T, C>> {
        self.shared
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Wakes the worker behind `signal` and transfers the obligation to release the gate to it.
    fn hand_off(pass: GatePass<'_>, signal: &Signal) -> Result<()> {
        signal.raise()?;
        pass.hand_off();
        Ok(())
    }
}

impl<T, C> PipelinedQueue<T, C> {
    /// Waits for in-flight restoration, then stops and joins both workers. Idempotent.
    fn shut_down(&mut self) {
        if self.shared.shutdown.load(Ordering::Acquire) {
            return;
        }
        let _pass = self.shared.gate.acquire();
        self.shared.shutdown.store(true, Ordering::Release);

        // Both workers are parked in `wait`. Wake them even without pending work; a worker that
        // is already gone needs no wake.
        self.push_signal.raise().ok();
        self.pop_signal.raise().ok();
        self.inserter.join();
        self.remover.join();

        tracing::debug!(queue = self.id, "queue shut down");
    }
}

impl<T, C> Drop for PipelinedQueue<T, C> {
    fn drop(&mut self) {
        self.shut_down();
    }
}

impl<T, C> PriorityQueue<T> for PipelinedQueue<T, C>
where
    T: Clone + Send + 'static,
    C: Comparator<T> + Send + 'static,
{
    fn push(&self, value: T) -> Result<()> {
        let pass = self.shared.gate.acquire();
        self.store(&pass)?.append_raw(value)?;
        Self::hand_off(pass, &self.push_signal)
    }

    fn emplace<F>(&self, make: F) -> Result<()>
    where
        F: FnOnce() -> T,
    {
        let pass = self.shared.gate.acquire();
        // Built before locking the store, so a panicking `make` only releases the gate.
        let value = make();
        self.store(&pass)?.append_raw(value)?;
        Self::hand_off(pass, &self.push_signal)
    }

    fn pop(&self) -> Result<()> {
        let pass = self.shared.gate.acquire();
        let removed = self.store(&pass)?.remove_root_raw()?;
        drop(removed);
        Self::hand_off(pass, &self.pop_signal)
    }

    fn top(&self) -> Result<T> {
        let pass = self.shared.gate.acquire();
        let top = self
            .store(&pass)?
            .peek_root()
            .cloned()
            .ok_or(QueueError::Empty);
        drop(pass);
        top
    }

    fn len(&self) -> usize {
        let pass = self.shared.gate.acquire();
        let len = self.store_for_read(&pass).len();
        drop(pass);
        len
    }

    fn is_empty(&self) -> bool {
        let pass = self.shared.gate.acquire();
        let empty = self.store_for_read(&pass).is_empty();
        drop(pass);
        empty
    }
}
