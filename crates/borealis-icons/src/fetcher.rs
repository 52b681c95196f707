//! Default content fetcher running on a small worker-thread pool.
//!
//! Fetching happens entirely off the loader's thread: jobs go over a
//! channel to the workers, and each job's completion callback fires on the
//! worker that handled it. The loader rebinds completions onto its own
//! thread through its completion channel, so the single-threaded ownership
//! model of the cache and queue is preserved.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use url::Url;

use crate::error::{IconError, Result};
use crate::provider::{ContentFetcher, FetchCallback};

enum FetchJob {
    Fetch {
        uri: String,
        on_complete: FetchCallback,
    },
    Shutdown,
}

/// Fetcher that retrieves `file://` URIs (and `http(s)://` with the
/// `networking` feature) on background worker threads.
pub struct ThreadFetcher {
    job_tx: Sender<FetchJob>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadFetcher {
    /// Create a fetcher with one worker per CPU core, capped at 4.
    pub fn new() -> Self {
        let cores = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(2);
        Self::with_workers(cores.min(4))
    }

    /// Create a fetcher with an explicit worker count (minimum 1).
    pub fn with_workers(count: usize) -> Self {
        let (job_tx, job_rx) = unbounded::<FetchJob>();

        let count = count.max(1);
        let mut workers = Vec::with_capacity(count);
        for i in 0..count {
            let rx = job_rx.clone();
            let handle = thread::Builder::new()
                .name(format!("icon-fetch-{i}"))
                .spawn(move || Self::worker(rx))
                .expect("failed to spawn fetch worker");
            workers.push(handle);
        }

        Self { job_tx, workers }
    }

    fn worker(rx: Receiver<FetchJob>) {
        while let Ok(job) = rx.recv() {
            match job {
                FetchJob::Fetch { uri, on_complete } => {
                    let result = Self::fetch_bytes(&uri);
                    if let Err(err) = &result {
                        tracing::debug!(target: "borealis_icons::fetch", %uri, %err, "fetch failed");
                    }
                    on_complete(result);
                }
                FetchJob::Shutdown => break,
            }
        }
    }

    fn fetch_bytes(uri: &str) -> Result<Vec<u8>> {
        let parsed = Url::parse(uri).map_err(|_| IconError::unsupported_uri(uri))?;
        match parsed.scheme() {
            "file" => {
                let path: PathBuf = parsed
                    .to_file_path()
                    .map_err(|()| IconError::unsupported_uri(uri))?;
                std::fs::read(&path).map_err(|source| IconError::io(path, source))
            }
            #[cfg(feature = "networking")]
            "http" | "https" => Self::fetch_http(uri),
            _ => Err(IconError::unsupported_uri(uri)),
        }
    }

    /// Blocking HTTP GET on the worker thread, driven by a current-thread
    /// runtime so the pool needs no shared executor.
    #[cfg(feature = "networking")]
    fn fetch_http(uri: &str) -> Result<Vec<u8>> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| IconError::fetch(uri, e.to_string()))?;

        rt.block_on(async {
            let response = reqwest::get(uri)
                .await
                .map_err(|e| IconError::fetch(uri, e.to_string()))?;

            if !response.status().is_success() {
                return Err(IconError::fetch(
                    uri,
                    format!("HTTP status {}", response.status()),
                ));
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| IconError::fetch(uri, e.to_string()))
        })
    }
}

impl ContentFetcher for ThreadFetcher {
    fn fetch(&self, uri: &str, on_complete: FetchCallback) {
        let job = FetchJob::Fetch {
            uri: uri.to_string(),
            on_complete,
        };
        if let Err(returned) = self.job_tx.send(job)
            && let FetchJob::Fetch { uri, on_complete } = returned.into_inner()
        {
            // Workers already shut down; complete with a failure so the
            // request still resolves.
            on_complete(Err(IconError::fetch(uri, "fetch workers have shut down")));
        }
    }
}

impl Default for ThreadFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThreadFetcher {
    fn drop(&mut self) {
        for _ in 0..self.workers.len() {
            let _ = self.job_tx.send(FetchJob::Shutdown);
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
