/// Failures reported by queue operations. Nothing is retried internally: an operation either
/// completes with the heap intact or fails before any mutation is observable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// `pop` or `top` was called on a queue without elements.
    #[error("the queue is empty")]
    Empty,
    /// The worker behind this operation has terminated, so the queue is shutting down or gone.
    #[error("the {0} worker is no longer running")]
    WorkerGone(&'static str),
    /// A comparator panicked while the heap was being restored.
    #[error("the heap store was poisoned by a panicking comparator")]
    Poisoned,
    /// The underlying sequence could not grow.
    #[error("could not reserve room for {requested} more elements")]
    Alloc { requested: usize },
    /// A worker thread could not be started while constructing the queue.
    #[error("failed to spawn the {name} worker: {reason}")]
    Spawn { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, QueueError>;
