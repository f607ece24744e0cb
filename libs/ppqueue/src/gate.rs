use std::sync::{Condvar, Mutex, PoisonError};

/// Binary exclusive-access token.
///
/// Unlike a [`Mutex`] guard, the token may be released by a different thread than the one
/// that acquired it. Callers hand the release obligation to a worker thread, which gives the
/// token back once the heap is restored.
#[derive(Debug)]
pub(crate) struct Gate {
    held: Mutex<bool>,
    cvar: Condvar,
}

impl Gate {
    /// Creates a gate that is already held. The constructing thread opens it with
    /// [`Gate::release`] once the queue is ready.
    pub(crate) fn closed() -> Self {
        Self {
            held: Mutex::new(true),
            cvar: Condvar::new(),
        }
    }

    /// Blocks until the token is available, then takes it.
    pub(crate) fn acquire(&self) -> GatePass<'_> {
        // The inner lock never runs foreign code, so a poisoned flag is still accurate.
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            held = self.cvar.wait(held).unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
        GatePass { gate: self }
    }

    /// Takes over a pass that another thread [handed off](GatePass::hand_off), without waiting.
    /// The returned pass releases the gate when dropped, even while unwinding.
    pub(crate) fn take_over(&self) -> GatePass<'_> {
        GatePass { gate: self }
    }

    /// Gives the token back and wakes one waiter. Valid from any thread.
    pub(crate) fn release(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(*held, "released a gate that was not held");
        *held = false;
        drop(held);
        self.cvar.notify_one();
    }
}

/// Proof of holding a [`Gate`]. Dropping it releases the gate.
#[must_use = "dropping the pass releases the gate immediately"]
#[derive(Debug)]
pub(crate) struct GatePass<'a> {
    gate: &'a Gate,
}

impl GatePass<'_> {
    /// Consumes the pass without releasing the gate. Whoever receives the obligation must call
    /// [`Gate::release`] exactly once.
    pub(crate) fn hand_off(self) {
        std::mem::forget(self);
    }
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use super::Gate;

    #[test]
    fn pass_drop_releases() {
        let gate = Gate::closed();
        gate.release();

        drop(gate.acquire());
        // -- would block forever if the first pass had not released
        drop(gate.acquire());
    }

    /// A pass handed off on one thread is released on another.
    #[test]
    fn release_from_other_thread() {
        let gate = Arc::new(Gate::closed());
        gate.release();

        gate.acquire().hand_off();

        let releaser = Arc::clone(&gate);
        let handle = thread::spawn(move || {
            let pass = releaser.take_over();
            thread::sleep(Duration::from_millis(10));
            drop(pass);
        });

        drop(gate.acquire());
        handle.join().unwrap();
    }

    #[test]
    fn single_holder_at_a_time() {
        let gate = Arc::new(Gate::closed());
        gate.release();
        let inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let _pass = gate.acquire();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
