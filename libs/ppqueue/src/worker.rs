use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use crate::{
    Comparator, HeapStore, QueueError, Result,
    queue::Shared,
    signal::{SignalWaiter, Wake},
};

/// The heap restoration a worker is dedicated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Restoration {
    /// Runs after an append.
    SiftUp,
    /// Runs after a root removal.
    SiftDown,
}

impl Restoration {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Restoration::SiftUp => "push",
            Restoration::SiftDown => "pop",
        }
    }

    fn apply<T, C: Comparator<T>>(self, store: &mut HeapStore<T, C>) {
        match self {
            Restoration::SiftUp => store.sift_up_last(),
            Restoration::SiftDown => store.sift_down_root(),
        }
    }
}

/// A long-lived thread bound to one queue that restores the heap whenever its signal is raised
/// and then releases the gate it was handed.
#[derive(Debug)]
pub(crate) struct Worker {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn spawn<T, C>(
        kind: Restoration,
        prefix: &str,
        queue_id: u64,
        shared: Arc<Shared<T, C>>,
        waiter: SignalWaiter,
    ) -> Result<Self>
    where
        T: Send + 'static,
        C: Comparator<T> + Send + 'static,
    {
        let name = kind.name();
        let handle = thread::Builder::new()
            .name(format!("{prefix}-{name}"))
            .spawn(move || run(kind, queue_id, &shared, &waiter))
            .map_err(|e| QueueError::Spawn {
                name,
                reason: e.to_string(),
            })?;

        Ok(Self {
            name,
            handle: Some(handle),
        })
    }

    /// Waits for the thread to finish. The worker must have been told to shut down before.
    /// A worker that died from a panicking comparator is logged, not propagated.
    pub(crate) fn join(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            tracing::error!(worker = self.name, "worker terminated by a panic");
        }
    }
}

fn run<T, C: Comparator<T>>(
    kind: Restoration,
    queue_id: u64,
    shared: &Shared<T, C>,
    waiter: &SignalWaiter,
) {
    tracing::debug!(queue = queue_id, worker = kind.name(), "worker started");

    while waiter.wait(&shared.shutdown) == Wake::Restore {
        // The caller that raised the signal handed its pass over to us.
        let _pass = shared.gate.take_over();
        // A signal is only raised after the caller locked the store successfully, and nothing
        // panics between that lock and this one, so the store is never poisoned here.
        if let Ok(mut store) = shared.store.lock() {
            kind.apply(&mut store);
            tracing::trace!(
                queue = queue_id,
                worker = kind.name(),
                len = store.len(),
                "heap restored"
            );
        }
    }

    tracing::debug!(queue = queue_id, worker = kind.name(), "worker stopped");
}
