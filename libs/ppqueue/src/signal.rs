use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{Receiver, Sender, TrySendError};

use crate::{QueueError, Result};

/// Creates a single-slot wake primitive for the worker called `name`.
pub(crate) fn signal(name: &'static str) -> (Signal, SignalWaiter) {
    let (source, sink) = crossbeam::channel::bounded(1);
    (Signal { name, source }, SignalWaiter { sink })
}

/// Raising side of a signal, owned by the queue.
#[derive(Debug)]
pub(crate) struct Signal {
    name: &'static str,
    source: Sender<()>,
}

impl Signal {
    /// Wakes the worker. A slot that is already full counts as raised.
    /// # Error
    /// Returns [`QueueError::WorkerGone`] if the worker has dropped its end.
    pub(crate) fn raise(&self) -> Result<()> {
        match self.source.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => Ok(()),
            Err(TrySendError::Disconnected(())) => Err(QueueError::WorkerGone(self.name)),
        }
    }
}

/// What a woken worker has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    Restore,
    Shutdown,
}

/// Waiting side of a signal, owned by exactly one worker.
#[derive(Debug)]
pub(crate) struct SignalWaiter {
    sink: Receiver<()>,
}

impl SignalWaiter {
    /// Blocks until the signal is raised. A set `shutdown` flag or a dropped [`Signal`] both
    /// end the wait with [`Wake::Shutdown`].
    pub(crate) fn wait(&self, shutdown: &AtomicBool) -> Wake {
        match self.sink.recv() {
            Ok(()) if !shutdown.load(Ordering::Acquire) => Wake::Restore,
            _ => Wake::Shutdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::{Wake, signal};
    use crate::QueueError;

    #[test]
    fn raise_is_binary() {
        let (signal, waiter) = signal("test");
        let shutdown = AtomicBool::new(false);

        signal.raise().unwrap();
        signal.raise().unwrap();
        assert_eq!(waiter.wait(&shutdown), Wake::Restore);
        // -- the second raise collapsed into the first
        assert!(waiter.sink.is_empty());
    }

    #[test]
    fn shutdown_flag_wins() {
        let (signal, waiter) = signal("test");
        let shutdown = AtomicBool::new(false);

        shutdown.store(true, Ordering::Release);
        signal.raise().unwrap();
        assert_eq!(waiter.wait(&shutdown), Wake::Shutdown);
    }

    #[test]
    fn dropped_signal_ends_wait() {
        let (signal, waiter) = signal("test");
        drop(signal);
        assert_eq!(waiter.wait(&AtomicBool::new(false)), Wake::Shutdown);
    }

    #[test]
    fn raise_without_worker_is_reported() {
        let (signal, waiter) = signal("push");
        drop(waiter);
        assert_eq!(signal.raise(), Err(QueueError::WorkerGone("push")));
    }
}
