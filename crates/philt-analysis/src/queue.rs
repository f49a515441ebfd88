//! Shared work queue for the closure builders.
//!
//! The entry-driven and component builders are BFS traversals where the
//! consumers are also the producers, so the usual close-the-channel-when-
//! the-producer-finishes protocol cannot work. Instead the queue tracks an
//! inflight count: every enqueue increments it, finishing an item decrements
//! it exactly once, and whichever worker drives it to zero drops the sender,
//! which closes the stream for everyone. The visited set guarantees each
//! path is enqueued at most once, which makes the traversal finite and
//! cycle-safe.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

pub(crate) struct WorkQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<PathBuf>>>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<PathBuf>>,
    visited: Mutex<FxHashSet<PathBuf>>,
    /// Items enqueued but not yet fully processed. The last decrement to
    /// zero closes the queue.
    inflight: AtomicI64,
    enqueued: AtomicUsize,
}

impl WorkQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: tokio::sync::Mutex::new(receiver),
            visited: Mutex::new(FxHashSet::default()),
            inflight: AtomicI64::new(0),
            enqueued: AtomicUsize::new(0),
        }
    }

    /// Enqueue `path` unless it has been enqueued before.
    ///
    /// The visited check, counter bump, and sender clone happen under the
    /// visited lock; the send itself does not (unbounded sends never block,
    /// but the lock is not for the channel's benefit).
    pub fn enqueue(&self, path: PathBuf) {
        let sender = {
            let mut visited = self.visited.lock();
            if !visited.insert(path.clone()) {
                return;
            }
            self.inflight.fetch_add(1, Ordering::SeqCst);
            self.enqueued.fetch_add(1, Ordering::Relaxed);
            self.sender.lock().clone()
        };
        if let Some(sender) = sender {
            // Receiver outlives all senders; an Err here means the queue
            // already terminated, which the visited set makes impossible
            // while any item is still inflight.
            let _ = sender.send(path);
        }
    }

    /// Pull the next item. `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<PathBuf> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await
    }

    /// Mark one pulled item as fully processed.
    ///
    /// MUST be called exactly once per item returned by [`next`], including
    /// on cancellation paths; the termination protocol breaks otherwise.
    pub fn complete_one(&self) {
        if self.inflight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.sender.lock().take();
        }
    }

    /// Close an empty queue so workers see end-of-stream immediately.
    /// Used when seeding produced no items at all.
    pub fn close_if_idle(&self) {
        if self.inflight.load(Ordering::SeqCst) == 0 {
            self.sender.lock().take();
        }
    }

    /// Total number of items ever enqueued.
    pub fn enqueued_count(&self) -> usize {
        self.enqueued.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn duplicate_enqueues_are_ignored() {
        let queue = WorkQueue::new();
        queue.enqueue(PathBuf::from("/a"));
        queue.enqueue(PathBuf::from("/a"));
        queue.enqueue(PathBuf::from("/b"));
        assert_eq!(queue.enqueued_count(), 2);

        assert!(queue.next().await.is_some());
        queue.complete_one();
        assert!(queue.next().await.is_some());
        queue.complete_one();
        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn last_completion_closes_the_queue() {
        let queue = WorkQueue::new();
        queue.enqueue(PathBuf::from("/seed"));

        let item = queue.next().await.unwrap();
        assert_eq!(item, PathBuf::from("/seed"));
        // Producing from within processing keeps the queue open.
        queue.enqueue(PathBuf::from("/child"));
        queue.complete_one();

        assert!(queue.next().await.is_some());
        queue.complete_one();
        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn close_if_idle_terminates_empty_queue() {
        let queue = WorkQueue::new();
        queue.close_if_idle();
        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn concurrent_workers_drain_a_cyclic_frontier() {
        let queue = Arc::new(WorkQueue::new());
        queue.enqueue(PathBuf::from("/0"));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let mut processed = 0usize;
                while let Some(path) = queue.next().await {
                    let n: usize = path
                        .to_string_lossy()
                        .trim_start_matches('/')
                        .parse()
                        .unwrap();
                    if n < 100 {
                        // Each item re-enqueues itself (ignored) and its successor.
                        queue.enqueue(path.clone());
                        queue.enqueue(PathBuf::from(format!("/{}", n + 1)));
                    }
                    processed += 1;
                    queue.complete_one();
                }
                processed
            }));
        }

        let mut total = 0usize;
        for handle in handles {
            total += handle.await.unwrap();
        }
        assert_eq!(total, 101);
    }
}
