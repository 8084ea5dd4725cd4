//! Bounded parsing pipeline
//!
//! One producer task feeds file paths into a work queue sized to the worker count.
//! `workers` tasks pull paths, parse each file on the blocking pool (parsing is
//! CPU-bound and synchronous) and push the logical root of every parsed document onto
//! a single output channel of fixed capacity:
//!
//! ```text
//! producer ──paths──▶ [queue: workers] ──▶ worker × N ──nodes──▶ [output: buffer_capacity] ──▶ consumer
//! ```
//!
//! - **Back-pressure**: workers block on a full output channel, so at most
//!   `buffer_capacity` parsed trees are in flight regardless of corpus size.
//! - **Completion**: the output channel closes when the last worker drops its sender;
//!   consumers stop on closure, never on a count.
//! - **Failures**: a file that cannot be read or parsed is recorded as a
//!   [`FileOutcome`] and skipped. Under [`FailurePolicy::FailFast`] the first failure
//!   stops the producer; workers finish the file in hand and exit.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::dom::Node;
use crate::error::{Result, ShapeError};
use crate::parser::parse_file;

/// Default per-worker output capacity
pub const DEFAULT_PIPE_SIZE: usize = 100;

/// What to do when a file cannot be read or parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Record the failure, log it and keep going
    #[default]
    SkipAndContinue,
    /// Stop feeding new files after the first failure
    FailFast,
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Number of parallel parsing workers
    pub workers: usize,
    /// Capacity of the output channel
    pub buffer_capacity: usize,
    /// Emit the first element with this name instead of the document root
    pub root_tag: Option<String>,
    /// Per-file failure handling
    pub failure_policy: FailurePolicy,
}

impl PipelineConfig {
    /// Size the output channel as `workers * (pipe_size + 1)`
    pub fn with_pipe_size(workers: usize, pipe_size: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            buffer_capacity: workers.saturating_mul(pipe_size.saturating_add(1)),
            ..Self::default()
        }
    }

    pub fn with_root_tag(mut self, root_tag: Option<String>) -> Self {
        self.root_tag = root_tag;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let workers = num_cpus::get();
        Self {
            workers,
            buffer_capacity: workers * (DEFAULT_PIPE_SIZE + 1),
            root_tag: None,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Result of processing a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    /// Parsed and emitted downstream
    Parsed,
    /// Well-formed but without any element
    Empty,
    /// No element matched the root-tag filter
    Unmatched { root_tag: String },
    /// Unreadable or malformed
    Failed { message: String },
}

impl FileStatus {
    pub fn is_parsed(&self) -> bool {
        matches!(self, FileStatus::Parsed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileStatus::Failed { .. })
    }

    /// Human-readable reason for a skip, `None` for parsed files
    pub fn reason(&self) -> Option<String> {
        match self {
            FileStatus::Parsed => None,
            FileStatus::Empty => Some("document has no root element".to_string()),
            FileStatus::Unmatched { root_tag } => {
                Some(format!("no <{}> element in document", root_tag))
            }
            FileStatus::Failed { message } => Some(message.clone()),
        }
    }
}

/// Outcome of one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
    pub duration: Duration,
}

impl FileOutcome {
    pub fn new(path: PathBuf, status: FileStatus, duration: Duration) -> Self {
        Self {
            path,
            status,
            duration,
        }
    }
}

/// Progress notification fired once per finished file
#[derive(Debug, Clone)]
pub struct PipelineEvent {
    pub outcome: FileOutcome,
    /// Files finished so far, including this one
    pub completed: usize,
    /// Files handed to the pipeline
    pub total: usize,
}

/// Callback type for pipeline progress
pub type EventCallback = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Aggregated outcome of a pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Files handed to the pipeline
    pub total_files: usize,
    pub parsed_files: usize,
    pub empty_files: usize,
    pub unmatched_files: usize,
    pub failed_files: usize,
    /// Files never picked up because the run was aborted
    pub unprocessed_files: usize,
    /// Every file that did not produce a document, in completion order
    pub skipped: Vec<FileOutcome>,
    /// Wall-clock time from start to the last worker exiting
    pub total_duration: Duration,
    /// Set when fail-fast stopped the run early
    pub aborted: bool,
}

impl PipelineReport {
    /// Aggregate per-file outcomes into a summary
    pub fn aggregate(
        total_files: usize,
        outcomes: Vec<FileOutcome>,
        total_duration: Duration,
        aborted: bool,
    ) -> Self {
        let mut report = Self {
            total_files,
            unprocessed_files: total_files.saturating_sub(outcomes.len()),
            total_duration,
            aborted,
            ..Self::default()
        };

        for outcome in outcomes {
            match outcome.status {
                FileStatus::Parsed => {
                    report.parsed_files += 1;
                    continue;
                }
                FileStatus::Empty => report.empty_files += 1,
                FileStatus::Unmatched { .. } => report.unmatched_files += 1,
                FileStatus::Failed { .. } => report.failed_files += 1,
            }
            report.skipped.push(outcome);
        }

        report
    }

    /// Files that did not yield a document
    pub fn skipped_files(&self) -> usize {
        self.empty_files + self.unmatched_files + self.failed_files
    }

    /// Failed files only
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.skipped.iter().filter(|outcome| outcome.status.is_failed())
    }

    /// Turn an aborted run into [`ShapeError::Aborted`]
    pub fn ensure_complete(&self) -> Result<()> {
        if !self.aborted {
            return Ok(());
        }
        let (file, reason) = self
            .failures()
            .next()
            .map(|outcome| {
                (
                    outcome.path.clone(),
                    outcome.status.reason().unwrap_or_default(),
                )
            })
            .unwrap_or_default();
        Err(ShapeError::Aborted { file, reason })
    }
}

/// Handle to a running pipeline
pub struct PipelineHandle {
    receiver: mpsc::Receiver<Node>,
    completion: JoinHandle<Result<PipelineReport>>,
}

impl PipelineHandle {
    /// Next parsed root; `None` once every worker has finished
    pub async fn recv(&mut self) -> Option<Node> {
        self.receiver.recv().await
    }

    /// Drain every parsed root into `consume`, then wait for the report
    pub async fn for_each<F>(mut self, mut consume: F) -> Result<PipelineReport>
    where
        F: FnMut(Node),
    {
        while let Some(node) = self.receiver.recv().await {
            consume(node);
        }
        self.finish().await
    }

    /// Wait for the run report.
    ///
    /// Undrained roots are dropped, which stops workers at their next send.
    pub async fn finish(self) -> Result<PipelineReport> {
        drop(self.receiver);
        self.completion
            .await
            .map_err(|e| ShapeError::Concurrency {
                details: format!("Pipeline join error: {}", e),
            })?
    }

    /// Split into the raw output channel and the completion task
    pub fn into_parts(self) -> (mpsc::Receiver<Node>, JoinHandle<Result<PipelineReport>>) {
        (self.receiver, self.completion)
    }
}

/// Bounded worker pool that parses files into element trees
pub struct Pipeline {
    config: PipelineConfig,
    callback: Option<EventCallback>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            callback: None,
        }
    }

    /// Register a per-file progress callback
    pub fn with_callback(mut self, callback: EventCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Start the pipeline over `filenames`. Must be called inside a tokio runtime.
    pub fn run(&self, filenames: Vec<PathBuf>) -> PipelineHandle {
        let workers = self.config.workers.max(1);
        let total = filenames.len();
        let started = Instant::now();

        let (path_tx, path_rx) = mpsc::channel::<PathBuf>(workers);
        let (node_tx, node_rx) = mpsc::channel::<Node>(self.config.buffer_capacity.max(1));
        let path_rx = Arc::new(Mutex::new(path_rx));
        let cancelled = Arc::new(AtomicBool::new(false));
        let completed = Arc::new(AtomicUsize::new(0));

        let producer = tokio::spawn(produce(filenames, path_tx, Arc::clone(&cancelled)));

        let worker_tasks: Vec<_> = (0..workers)
            .map(|_| {
                let worker = Worker {
                    paths: Arc::clone(&path_rx),
                    nodes: node_tx.clone(),
                    root_tag: self.config.root_tag.clone(),
                    failure_policy: self.config.failure_policy,
                    cancelled: Arc::clone(&cancelled),
                    completed: Arc::clone(&completed),
                    total,
                    callback: self.callback.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        // Only workers hold senders: the channel closes when the last one exits.
        drop(node_tx);
        drop(path_rx);

        let completion = tokio::spawn(async move {
            producer.await.map_err(|e| ShapeError::Concurrency {
                details: format!("Producer join error: {}", e),
            })?;

            let per_worker =
                try_join_all(worker_tasks)
                    .await
                    .map_err(|e| ShapeError::Concurrency {
                        details: format!("Worker join error: {}", e),
                    })?;

            let outcomes: Vec<FileOutcome> = per_worker.into_iter().flatten().collect();
            Ok(PipelineReport::aggregate(
                total,
                outcomes,
                started.elapsed(),
                cancelled.load(Ordering::SeqCst),
            ))
        });

        PipelineHandle {
            receiver: node_rx,
            completion,
        }
    }
}

async fn produce(filenames: Vec<PathBuf>, paths: mpsc::Sender<PathBuf>, cancelled: Arc<AtomicBool>) {
    for path in filenames {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }
        // Every worker is gone: nothing left to feed.
        if paths.send(path).await.is_err() {
            break;
        }
    }
}

struct Worker {
    paths: Arc<Mutex<mpsc::Receiver<PathBuf>>>,
    nodes: mpsc::Sender<Node>,
    root_tag: Option<String>,
    failure_policy: FailurePolicy,
    cancelled: Arc<AtomicBool>,
    completed: Arc<AtomicUsize>,
    total: usize,
    callback: Option<EventCallback>,
}

impl Worker {
    async fn run(self) -> Vec<FileOutcome> {
        let mut outcomes = Vec::new();

        loop {
            let next = {
                let mut paths = self.paths.lock().await;
                paths.recv().await
            };
            let Some(path) = next else { break };
            if self.cancelled.load(Ordering::SeqCst) {
                break;
            }

            let started = Instant::now();
            let parse_path = path.clone();
            let root_tag = self.root_tag.clone();
            let extracted = tokio::task::spawn_blocking(move || {
                extract_root(&parse_path, root_tag.as_deref())
            })
            .await;

            let (status, node) = match extracted {
                Ok(Ok(node)) => (FileStatus::Parsed, Some(node)),
                Ok(Err(status)) => (status, None),
                Err(e) => (
                    FileStatus::Failed {
                        message: format!("Parser task failed: {}", e),
                    },
                    None,
                ),
            };

            if status.is_failed() && self.failure_policy == FailurePolicy::FailFast {
                self.cancelled.store(true, Ordering::SeqCst);
            }

            let outcome = FileOutcome::new(path, status, started.elapsed());
            self.notify(&outcome);
            outcomes.push(outcome);

            if let Some(node) = node {
                // Consumer dropped the receiver; stop quietly.
                if self.nodes.send(node).await.is_err() {
                    break;
                }
            }
        }

        outcomes
    }

    fn notify(&self, outcome: &FileOutcome) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(callback) = &self.callback {
            callback(&PipelineEvent {
                outcome: outcome.clone(),
                completed,
                total: self.total,
            });
        }
    }
}

/// Parse one file and pick its logical root, or explain why there is none
fn extract_root(path: &Path, root_tag: Option<&str>) -> std::result::Result<Node, FileStatus> {
    let document = parse_file(path).map_err(|e| FileStatus::Failed {
        message: e.to_string(),
    })?;

    if document.root.is_none() {
        return Err(FileStatus::Empty);
    }

    document
        .into_logical_root(root_tag)
        .ok_or_else(|| FileStatus::Unmatched {
            root_tag: root_tag.unwrap_or_default().to_string(),
        })
}
