//! Parallel commitment of a buffer.
//!
//! The subtrees below an internal node are independent, so a commit can hash each present
//! child on a worker thread and join the results with the same fold the sequential commitment
//! uses. Absent children are never sent to workers: their packed value is known without any
//! hashing.
//!
//! Sparse buffers often have a single present child at the top few levels. In that case there is
//! nothing to fan out, and the commit descends into the child until there is.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use memcommit_core::{
    buffer::{capacity, Buffer, FANOUT},
    combine::fold_children,
    Packed,
};
use threadpool::ThreadPool;

use crate::{
    metrics::{Metric, Metrics},
    zero_cache::ZeroHashCache,
    HashAlgorithm,
};

type TaskResult<R> = std::thread::Result<R>;

/// The commit worker pool.
pub struct CommitPool {
    worker_tp: ThreadPool,
    parallel_level: u32,
    metrics: Metrics,
}

impl CommitPool {
    /// Create a new `CommitPool`.
    ///
    /// # Panics
    ///
    /// Panics if `num_workers` is zero.
    pub fn new(num_workers: usize, parallel_level: u32, metrics: Metrics) -> Self {
        CommitPool {
            worker_tp: threadpool::Builder::new()
                .num_threads(num_workers)
                .thread_name("memcommit-commit".to_string())
                .build(),
            parallel_level,
            metrics,
        }
    }

    /// Compute the packed commitment of `buffer`, fanning out to workers where worthwhile.
    ///
    /// The result is identical to `buffer.hash_aux(zeros)`.
    pub fn commit<H: HashAlgorithm>(
        &self,
        buffer: &Buffer,
        zeros: &Arc<ZeroHashCache<H>>,
    ) -> Packed {
        let level = buffer.level();
        let children = match buffer.children() {
            Some(children) if level >= self.parallel_level && self.worker_tp.max_count() > 1 => {
                children
            }
            _ => return buffer.hash_aux(&**zeros),
        };

        let present = children
            .iter()
            .enumerate()
            .filter(|(_, child)| !child.is_absent())
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        let mut packed = vec![None; FANOUT];
        if let &[only] = &present[..] {
            tracing::trace!(level, child = only, "descending into single present child");
            packed[only] = Some(self.commit(&children[only], zeros));
        } else {
            tracing::debug!(level, present = present.len(), "fanning out commit");
            self.metrics
                .count_n(Metric::ParallelSubtrees, present.len() as u64);

            let (tx, rx) = crossbeam_channel::unbounded();
            for &index in &present {
                let child = children[index].clone();
                let zeros = zeros.clone();
                spawn_task(
                    &self.worker_tp,
                    move || (index, child.hash_aux(&*zeros)),
                    tx.clone(),
                );
            }

            for _ in 0..present.len() {
                let (index, child_packed) = join_task(&rx);
                packed[index] = Some(child_packed);
            }
        }

        let child_capacity = capacity(level - 1);
        fold_children(&**zeros, 0, FANOUT, capacity(level), &mut |i| {
            packed[i].unwrap_or_else(|| Packed::zero(&**zeros, child_capacity))
        })
    }
}

// Spawn the given task within the given ThreadPool, sending its result or the payload of its
// panic over `tx`.
fn spawn_task<F, R>(thread_pool: &ThreadPool, task: F, tx: Sender<TaskResult<R>>)
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    thread_pool.execute(move || {
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(task));
        let _ = tx.send(res);
    });
}

// Block on the next task completion, resuming its panic on this thread if it had one.
fn join_task<R>(receiver: &Receiver<TaskResult<R>>) -> R
where
    R: Send + 'static,
{
    match receiver.recv() {
        Ok(Ok(res)) => res,
        Ok(Err(err_payload)) => std::panic::resume_unwind(err_payload),
        // tasks always send before dropping their sender, and the caller holds one more.
        Err(_) => unreachable!("commit task result channel closed"),
    }
}
