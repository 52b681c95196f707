//! The icon loader: request entry point, cooperative scheduler, and
//! resolution strategies.
//!
//! [`IconLoader`] turns `(reference, size)` pairs into decoded bitmaps,
//! reusing previous work through its result cache and never blocking the
//! caller. Cache misses become FIFO-queued tasks; the host event loop
//! drives them by calling [`IconLoader::process`], which drains the queue
//! under a fixed wall-clock budget per cycle and yields in between so icon
//! work cannot starve input handling or painting.
//!
//! # Integration
//!
//! The loader is a passive component: it never spins up a thread of its
//! own for scheduling. Install a wake hook so the loader can ask the host
//! for a low-priority `process` call whenever it has work:
//!
//! ```ignore
//! use borealis_icons::{IconLoader, IconReference, ImageStreamDecoder, ThreadFetcher};
//!
//! let mut loader = IconLoader::new(
//!     Box::new(my_theme_resolver),
//!     Box::new(ThreadFetcher::new()),
//!     Box::new(ImageStreamDecoder::new()),
//! );
//! loader.set_wake_hook(std::sync::Arc::new(move || event_loop.request_idle()));
//!
//! loader.request_icon(IconReference::for_string("edit-find"), 32, |_, _, bitmap| {
//!     // ...
//! });
//!
//! // In the host's idle handler:
//! loader.process();
//! ```
//!
//! # Delivery timing
//!
//! On a cache hit the callback runs synchronously, on the caller's own
//! stack, before `request_icon` returns. Everything else is delivered from
//! a later `process` call. Callers must tolerate both timings. (The `&mut
//! self` receiver means a callback cannot re-enter the loader it was handed
//! to, but it can still surprise code that assumed uniformly deferred
//! delivery.)

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use url::Url;

use crate::bitmap::Bitmap;
use crate::cache::{IconCache, IconCacheConfig};
use crate::provider::{ContentFetcher, StreamDecoder, ThemeResolver};
use crate::queue::{LoadHandle, Task, WorkQueue};
use crate::reference::{CacheKey, IconReference};

/// Raster-image suffixes stripped by the descriptor retry fallback. Some
/// themes ship icon names with a file extension mistakenly embedded.
const RASTER_SUFFIXES: [&str; 4] = [".png", ".xpm", ".gif", ".jpg"];

/// Smallest pixel size the loader will resolve. Requests below this are
/// refused at entry.
const MIN_ICON_SIZE: u32 = 2;

/// Hook the host event loop installs to learn that the loader wants a
/// [`IconLoader::process`] call. Fired from the loader's thread when it
/// arms itself, and from a fetch worker when an in-flight fetch completes.
pub type WakeHook = Arc<dyn Fn() + Send + Sync>;

/// Configuration for [`IconLoader`].
#[derive(Debug, Clone)]
pub struct IconLoaderConfig {
    /// Wall-clock budget for one `process` cycle.
    /// Default: 10 ms.
    pub time_budget: Duration,
    /// Result cache configuration.
    pub cache: IconCacheConfig,
}

impl Default for IconLoaderConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_millis(10),
            cache: IconCacheConfig::default(),
        }
    }
}

impl IconLoaderConfig {
    /// Set the per-cycle time budget.
    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Set the result cache configuration.
    #[must_use]
    pub fn with_cache(mut self, cache: IconCacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Completed fetch handed back to the loader thread by a fetch worker.
struct FetchDone {
    task: Task,
    result: crate::error::Result<Vec<u8>>,
}

/// Icon resolution and asynchronous load cache.
///
/// Construct one instance at startup and pass it by `&mut` reference to
/// whatever needs icons; all cache, queue, and task state is owned here and
/// touched only from the host loop's thread. Tasks still pending when the
/// loader is dropped are discarded without firing their callbacks.
pub struct IconLoader {
    cache: IconCache,
    queue: WorkQueue,
    theme: Box<dyn ThemeResolver>,
    fetcher: Box<dyn ContentFetcher>,
    decoder: Box<dyn StreamDecoder>,
    config: IconLoaderConfig,
    /// Whether a processing cycle has been requested and not yet run to an
    /// empty queue. Arming is idempotent.
    armed: bool,
    wake: Option<WakeHook>,
    completed_tx: Sender<FetchDone>,
    completed_rx: Receiver<FetchDone>,
    in_flight: usize,
    /// Cancellation tokens for queued and in-flight tasks, by handle.
    tokens: HashMap<LoadHandle, Arc<AtomicBool>>,
}

impl IconLoader {
    /// Create a loader with the default configuration.
    pub fn new(
        theme: Box<dyn ThemeResolver>,
        fetcher: Box<dyn ContentFetcher>,
        decoder: Box<dyn StreamDecoder>,
    ) -> Self {
        Self::with_config(theme, fetcher, decoder, IconLoaderConfig::default())
    }

    /// Create a loader with a custom configuration.
    pub fn with_config(
        theme: Box<dyn ThemeResolver>,
        fetcher: Box<dyn ContentFetcher>,
        decoder: Box<dyn StreamDecoder>,
        config: IconLoaderConfig,
    ) -> Self {
        let (completed_tx, completed_rx) = unbounded();
        Self {
            cache: IconCache::new(config.cache.clone()),
            queue: WorkQueue::new(),
            theme,
            fetcher,
            decoder,
            config,
            armed: false,
            wake: None,
            completed_tx,
            completed_rx,
            in_flight: 0,
            tokens: HashMap::new(),
        }
    }

    /// Install the hook used to request `process` calls from the host.
    pub fn set_wake_hook(&mut self, hook: WakeHook) {
        self.wake = Some(hook);
    }

    /// Request an icon at a pixel size.
    ///
    /// On a cache hit the callback fires synchronously before this returns.
    /// Degenerate requests — an empty reference value, a size below 2
    /// pixels, or a relative path — are refused silently: no task is
    /// created and the callback never fires. Callers that need to tell
    /// "rejected" from "still pending" must validate their own input.
    ///
    /// Returns a handle for [`cancel`](Self::cancel); handles for rejected
    /// or synchronously satisfied requests are inert.
    pub fn request_icon<F>(&mut self, reference: IconReference, size: u32, callback: F) -> LoadHandle
    where
        F: FnOnce(&IconReference, u32, Option<Bitmap>) + Send + 'static,
    {
        if size < MIN_ICON_SIZE || reference.value().is_empty() {
            tracing::trace!(
                target: "borealis_icons::loader",
                size,
                "refusing degenerate icon request"
            );
            return LoadHandle::next();
        }

        // Local paths funnel through the URI strategy.
        let Some(reference) = reference.normalize() else {
            tracing::trace!(
                target: "borealis_icons::loader",
                "refusing path reference with no file URI form"
            );
            return LoadHandle::next();
        };

        let key = CacheKey::derive(&reference, size);
        if let Some(bitmap) = self.cache.get(&key) {
            // Same-stack delivery: the caller receives its own callback
            // before request_icon returns.
            callback(&reference, size, Some(bitmap));
            return LoadHandle::next();
        }

        let task = Task::new(reference, size, key, Box::new(callback));
        let handle = task.handle;
        self.tokens.insert(handle, task.cancel_token());
        self.queue.push(task);
        self.arm();
        handle
    }

    /// Cancel an outstanding request.
    ///
    /// A queued task is removed outright; an in-flight fetch keeps running
    /// but its result is discarded without firing the callback. Returns
    /// `true` if the handle referred to an outstanding request.
    pub fn cancel(&mut self, handle: LoadHandle) -> bool {
        let Some(token) = self.tokens.remove(&handle) else {
            return false;
        };
        token.store(true, Ordering::Relaxed);
        self.queue.remove(handle);
        true
    }

    /// Run one scheduling cycle.
    ///
    /// Completed fetches are drained first; their decode work is driven by
    /// the fetcher's completion signal, not the queue budget, so a slow
    /// remote never stalls queued tasks. Queued tasks are then processed in
    /// FIFO order until the time budget runs out or the queue is empty. If
    /// the budget runs out with tasks left the loader stays armed and fires
    /// the wake hook again, bounding per-cycle latency instead of
    /// throughput. Returns the number of tasks that made progress.
    pub fn process(&mut self) -> usize {
        let mut progressed = self.drain_completed();

        let started = Instant::now();
        while !self.queue.is_empty() && started.elapsed() < self.config.time_budget {
            let Some(task) = self.queue.pop() else {
                break;
            };
            self.process_task(task);
            progressed += 1;
        }

        if self.queue.is_empty() {
            self.armed = false;
        } else {
            tracing::trace!(
                target: "borealis_icons::loader",
                pending = self.queue.len(),
                "time budget exhausted, rescheduling"
            );
            if let Some(wake) = &self.wake {
                wake();
            }
        }
        progressed
    }

    /// Whether queued or in-flight work remains.
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty() || self.in_flight > 0 || !self.completed_rx.is_empty()
    }

    /// Number of tasks waiting in the queue.
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// Number of tasks handed to the fetcher and not yet completed.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
    }

    /// The result cache, for statistics.
    pub fn cache(&self) -> &IconCache {
        &self.cache
    }

    fn arm(&mut self) {
        if self.armed {
            return;
        }
        self.armed = true;
        if let Some(wake) = &self.wake {
            wake();
        }
    }

    fn drain_completed(&mut self) -> usize {
        let mut finished = 0;
        while let Ok(done) = self.completed_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.complete_fetch(done.task, done.result);
            finished += 1;
        }
        finished
    }

    fn process_task(&mut self, mut task: Task) {
        // Another task for the same key may have completed since this one
        // was enqueued.
        if let Some(bitmap) = self.cache.get(&task.key) {
            self.tokens.remove(&task.handle);
            task.finish(Some(bitmap));
            return;
        }
        if task.is_cancelled() {
            self.tokens.remove(&task.handle);
            return;
        }

        match task.reference.clone() {
            IconReference::Name(name) => {
                let resolved = self.theme.resolve_name(&name, task.size);
                self.finish_task(task, resolved);
            }
            IconReference::Descriptor(descriptor) => {
                if let Some(target) = descriptor.file_target() {
                    // File-wrapped descriptor: reinterpret the same task as
                    // a file URI fetch. The key stays as derived at entry.
                    match Url::from_file_path(target) {
                        Ok(uri) => {
                            task.reference = IconReference::Uri(String::from(uri));
                            self.start_fetch(task);
                        }
                        Err(()) => {
                            tracing::debug!(
                                target: "borealis_icons::loader",
                                value = descriptor.value(),
                                "file-wrapped descriptor target has no URI form"
                            );
                            self.finish_task(task, None);
                        }
                    }
                    return;
                }

                let resolved = self
                    .theme
                    .resolve_descriptor(&descriptor, task.size)
                    .or_else(|| self.retry_stripped(descriptor.value(), task.size));
                self.finish_task(task, resolved);
            }
            IconReference::Uri(_) => self.start_fetch(task),
            // Paths are normalized away at the entry point.
            IconReference::Path(_) => self.finish_task(task, None),
        }
    }

    /// Suffix-stripping retry: if a descriptor value ends in a common
    /// raster-image extension, drop the last four characters and look the
    /// remainder up as a plain name.
    fn retry_stripped(&self, value: &str, size: u32) -> Option<Bitmap> {
        let has_suffix = RASTER_SUFFIXES
            .iter()
            .any(|s| value.len() > s.len() && value.ends_with(s));
        if !has_suffix {
            return None;
        }
        let stripped = &value[..value.len() - 4];
        tracing::debug!(
            target: "borealis_icons::loader",
            name = stripped,
            "retrying descriptor lookup with stripped suffix"
        );
        self.theme.resolve_name(stripped, size)
    }

    fn finish_task(&mut self, task: Task, bitmap: Option<Bitmap>) {
        self.tokens.remove(&task.handle);
        match bitmap {
            Some(bitmap) => {
                self.cache.store(task.key.clone(), bitmap.clone());
                task.finish(Some(bitmap));
            }
            None => {
                tracing::debug!(
                    target: "borealis_icons::loader",
                    key = %task.key.value(),
                    size = task.key.size(),
                    "icon resolution missed"
                );
                task.finish(None);
            }
        }
    }

    /// Hand a URI task to the fetcher. The task leaves the queue and counts
    /// as in flight; ownership rides along with the pending fetch until its
    /// completion message comes back over the channel.
    fn start_fetch(&mut self, task: Task) {
        let IconReference::Uri(uri) = &task.reference else {
            self.finish_task(task, None);
            return;
        };
        let uri = uri.clone();

        self.in_flight += 1;
        let tx = self.completed_tx.clone();
        let wake = self.wake.clone();
        self.fetcher.fetch(
            &uri,
            Box::new(move |result| {
                // Runs on the fetcher's thread: hand the task back to the
                // loader and nudge the host loop.
                let _ = tx.send(FetchDone { task, result });
                if let Some(wake) = wake {
                    wake();
                }
            }),
        );
    }

    fn complete_fetch(&mut self, task: Task, result: crate::error::Result<Vec<u8>>) {
        self.tokens.remove(&task.handle);
        if task.is_cancelled() {
            return;
        }

        match result {
            Ok(bytes) => match self.decoder.decode_scaled(&bytes, task.size) {
                Ok(bitmap) => {
                    self.cache.store(task.key.clone(), bitmap.clone());
                    task.finish(Some(bitmap));
                }
                Err(err) => {
                    tracing::warn!(
                        target: "borealis_icons::loader",
                        key = %task.key.value(),
                        %err,
                        "icon stream could not be decoded"
                    );
                    task.finish(None);
                }
            },
            Err(err) => {
                tracing::warn!(
                    target: "borealis_icons::loader",
                    key = %task.key.value(),
                    %err,
                    "icon fetch failed"
                );
                task.finish(None);
            }
        }
    }
}

impl std::fmt::Debug for IconLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconLoader")
            .field("queued", &self.queue.len())
            .field("in_flight", &self.in_flight)
            .field("armed", &self.armed)
            .field("cache", &self.cache)
            .finish()
    }
}
