//! Node-level worker pool
//!
//! Fans the per-node work of one parallel region out over a fixed
//! number of threads. The calling thread acts as worker 0, helpers are
//! scoped threads, and work is claimed from a shared atomic counter so
//! cheap nodes do not stall expensive ones. Each worker receives
//! exclusive access to its own resource slot (the evaluator clones),
//! which removes all aliasing on evaluator scratch state. Results come
//! back in worker order, keeping reductions bit-reproducible for a
//! fixed thread count.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Shared claim counter over node indices.
#[derive(Debug, Default)]
pub struct IndexQueue {
    next: AtomicUsize,
}

impl IndexQueue {
    /// Fresh queue starting at index zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next index. Every call returns a distinct value.
    pub fn claim(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Fixed-size pool executing one task closure per worker.
#[derive(Debug)]
pub struct WorkerPool {
    n_threads: usize,
}

impl WorkerPool {
    /// Create a pool of `n_threads` workers (the caller counts as one).
    ///
    /// # Panics
    /// Panics if `n_threads` is zero.
    pub fn new(n_threads: usize) -> Self {
        assert!(n_threads >= 1, "pool needs at least the calling thread");
        Self { n_threads }
    }

    /// Number of workers, including the calling thread.
    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    /// Run `task` once per worker and collect the results in worker order.
    ///
    /// Worker `w` gets exclusive access to `resources[w]`. Worker 0 runs
    /// on the calling thread after the helpers have been launched;
    /// returning joins all helpers.
    ///
    /// # Panics
    /// Panics if `resources.len() != n_threads` or a worker panics.
    pub fn run<T, R, F>(&self, resources: &mut [T], task: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(usize, &mut T) -> R + Sync,
    {
        assert_eq!(
            resources.len(),
            self.n_threads,
            "one resource slot per worker required"
        );

        if self.n_threads == 1 {
            return vec![task(0, &mut resources[0])];
        }

        let task = &task;
        thread::scope(|scope| {
            let mut slots = resources.iter_mut();
            let first = slots.next().expect("worker 0 slot");
            let handles: Vec<_> = slots
                .enumerate()
                .map(|(k, slot)| scope.spawn(move || task(k + 1, slot)))
                .collect();

            let mut results = Vec::with_capacity(self.n_threads);
            results.push(task(0, first));
            for handle in handles {
                results.push(handle.join().expect("worker thread panicked"));
            }
            results
        })
    }
}
