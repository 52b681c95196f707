//! Pending resolution tasks and the FIFO work queue.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::bitmap::Bitmap;
use crate::reference::{CacheKey, IconReference};

/// Callback delivering the outcome of one icon request.
///
/// Fires at most once, with `Some(bitmap)` on success or `None` when
/// resolution failed. There is no error payload; callers wanting a fallback
/// icon substitute their own. Rejected requests and cancelled tasks never
/// fire.
pub type LoadCallback = Box<dyn FnOnce(&IconReference, u32, Option<Bitmap>) + Send + 'static>;

/// Handle identifying one icon request, usable with
/// [`IconLoader::cancel`](crate::IconLoader::cancel).
///
/// Handles for requests that were rejected at entry or satisfied
/// synchronously from the cache are inert: cancelling them is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadHandle(u64);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

impl LoadHandle {
    pub(crate) fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw identifier value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// One pending or in-flight resolution attempt.
///
/// Owned by the work queue until dequeued, then by the loader for the
/// duration of its processing step; a URI task moves into the pending fetch
/// until the fetcher completes.
pub(crate) struct Task {
    pub reference: IconReference,
    pub size: u32,
    pub key: CacheKey,
    pub handle: LoadHandle,
    cancelled: Arc<AtomicBool>,
    callback: Option<LoadCallback>,
}

impl Task {
    pub fn new(reference: IconReference, size: u32, key: CacheKey, callback: LoadCallback) -> Self {
        Self {
            reference,
            size,
            key,
            handle: LoadHandle::next(),
            cancelled: Arc::new(AtomicBool::new(false)),
            callback: Some(callback),
        }
    }

    /// Shared token the loader flips on cancellation.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Fire the callback and consume the task. Cancelled tasks are dropped
    /// without firing.
    pub fn finish(mut self, bitmap: Option<Bitmap>) {
        if self.is_cancelled() {
            return;
        }
        if let Some(callback) = self.callback.take() {
            callback(&self.reference, self.size, bitmap);
        }
    }
}

/// FIFO queue of tasks awaiting resolution.
///
/// Insertion order is preserved and there is no intra-queue de-duplication:
/// two tasks for the same cache key may coexist if two callers race before
/// either resolves. Both converge on the same stored bitmap.
#[derive(Default)]
pub(crate) struct WorkQueue {
    tasks: VecDeque<Task>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    pub fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Remove a queued task by handle. Returns `true` when found.
    pub fn remove(&mut self, handle: LoadHandle) -> bool {
        match self.tasks.iter().position(|t| t.handle == handle) {
            Some(pos) => {
                self.tasks.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str) -> Task {
        let reference = IconReference::Name(name.to_string());
        let key = CacheKey::derive(&reference, 32);
        Task::new(reference, 32, key, Box::new(|_, _, _| {}))
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = WorkQueue::new();
        queue.push(task("a"));
        queue.push(task("b"));
        queue.push(task("c"));

        assert_eq!(queue.pop().unwrap().key.value(), "a");
        assert_eq!(queue.pop().unwrap().key.value(), "b");
        assert_eq!(queue.pop().unwrap().key.value(), "c");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_remove_by_handle() {
        let mut queue = WorkQueue::new();
        queue.push(task("a"));
        let target = task("b");
        let handle = target.handle;
        queue.push(target);
        queue.push(task("c"));

        assert!(queue.remove(handle));
        assert!(!queue.remove(handle));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().key.value(), "a");
        assert_eq!(queue.pop().unwrap().key.value(), "c");
    }

    #[test]
    fn test_cancelled_task_does_not_fire() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);

        let reference = IconReference::Name("x".to_string());
        let key = CacheKey::derive(&reference, 32);
        let task = Task::new(
            reference,
            32,
            key,
            Box::new(move |_, _, _| {
                fired_clone.store(true, Ordering::SeqCst);
            }),
        );

        task.cancel_token().store(true, Ordering::SeqCst);
        task.finish(None);
        assert!(!fired.load(Ordering::SeqCst));
    }
}
