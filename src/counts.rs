//! Message counts for saved searches
//!
//! Every query row shows two counts: all matching messages, and matching
//! unread messages (`(<query>) AND tag:unread`). Both honour the same set of
//! excluded tags.
//!
//! Counting can run inline (`CountClient::count_for`) or on a small pool of
//! worker threads (`CountPool`). Pool results carry the store generation they
//! were requested for so the owner can drop results that arrive after a
//! rebuild.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use async_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::entry::{Counts, MessageCounts};
use crate::error::BackendQueryError;

/// Poll interval while waiting on a count process
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Opaque message-count service.
///
/// Implementations must not hold a long-lived index handle across calls: the
/// index is updated concurrently by other processes.
pub trait CountBackend: Send + Sync {
    /// Number of messages matching `query`, omitting messages carrying any of
    /// `excluded_tags`.
    fn count(&self, query: &str, excluded_tags: &[String]) -> Result<u64, BackendQueryError>;
}

/// Query for the unread subset of `query`
pub fn unread_query(query: &str) -> String {
    if query.trim().is_empty() {
        "tag:unread".to_string()
    } else {
        format!("({}) AND tag:unread", query)
    }
}

/// Issues the total/unread count pair for a query
#[derive(Clone)]
pub struct CountClient {
    backend: Arc<dyn CountBackend>,
    excluded_tags: Arc<[String]>,
}

impl CountClient {
    pub fn new(backend: Arc<dyn CountBackend>, excluded_tags: Vec<String>) -> Self {
        Self {
            backend,
            excluded_tags: excluded_tags.into(),
        }
    }

    pub fn excluded_tags(&self) -> &[String] {
        &self.excluded_tags
    }

    pub fn count_for(&self, query: &str) -> Result<MessageCounts, BackendQueryError> {
        let total = self.backend.count(query, &self.excluded_tags)?;
        let unread = self.backend.count(&unread_query(query), &self.excluded_tags)?;
        Ok(MessageCounts { total, unread })
    }

    /// Like [`count_for`](Self::count_for), folding failure into `Counts::Unavailable`
    pub fn counts_or_unavailable(&self, query: &str) -> Counts {
        match self.count_for(query) {
            Ok(counts) => Counts::Ready(counts),
            Err(e) => {
                warn!(
                    event_type = "saved_searches",
                    query,
                    error = %e,
                    "Count query failed, marking counts unavailable"
                );
                Counts::Unavailable
            }
        }
    }
}

// =============================================================================
// NOTMUCH CLI BACKEND
// =============================================================================

/// Counts messages by running `notmuch count`, one process per call
#[derive(Debug, Clone)]
pub struct NotmuchCli {
    program: String,
    config: Option<PathBuf>,
    timeout: Duration,
}

impl NotmuchCli {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            config: None,
            timeout,
        }
    }

    /// Pass `--config=<path>` to every invocation
    pub fn with_config(mut self, config: Option<PathBuf>) -> Self {
        self.config = config;
        self
    }

    fn command(&self, query: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(config) = &self.config {
            cmd.arg(format!("--config={}", config.display()));
        }
        cmd.arg("count")
            .arg("--output=messages")
            .arg("--exclude=false")
            .arg("--")
            .arg(query)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

/// Apply tag exclusion to `query`.
///
/// As in notmuch, a tag the query names explicitly (`tag:spam`) is not
/// excluded.
pub fn with_exclusions(query: &str, excluded_tags: &[String]) -> String {
    let named = named_tags(query);
    let clauses: Vec<String> = excluded_tags
        .iter()
        .filter(|tag| !named.contains(&tag.to_lowercase()))
        .map(|tag| format!("NOT tag:{}", quote_term(tag)))
        .collect();

    if clauses.is_empty() {
        return query.to_string();
    }
    let exclusion = clauses.join(" AND ");
    if query.trim().is_empty() {
        exclusion
    } else {
        format!("({}) AND {}", query, exclusion)
    }
}

/// Lowercased tags of every whole `tag:<t>` term in `query`
fn named_tags(query: &str) -> Vec<String> {
    query
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter_map(|term| {
            let lowered = term.to_lowercase();
            lowered
                .strip_prefix("tag:")
                .map(|tag| tag.trim_matches('"').to_string())
        })
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Xapian phrase quoting; embedded quotes are doubled
fn quote_term(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}

impl CountBackend for NotmuchCli {
    fn count(&self, query: &str, excluded_tags: &[String]) -> Result<u64, BackendQueryError> {
        let effective = with_exclusions(query, excluded_tags);
        let mut child = self
            .command(&effective)
            .spawn()
            .map_err(|source| BackendQueryError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BackendQueryError::Timeout {
                        query: query.to_string(),
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(BackendQueryError::Spawn {
                        program: self.program.clone(),
                        source: e,
                    })
                }
            }
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        if let Some(mut out) = child.stdout.take() {
            let _ = out.read_to_string(&mut stdout);
        }
        if let Some(mut err) = child.stderr.take() {
            let _ = err.read_to_string(&mut stderr);
        }

        if !status.success() {
            return Err(BackendQueryError::Failed {
                query: query.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        stdout
            .trim()
            .parse::<u64>()
            .map_err(|_| BackendQueryError::InvalidOutput {
                query: query.to_string(),
                output: stdout.trim().to_string(),
            })
    }
}

// =============================================================================
// WORKER POOL
// =============================================================================

/// A count request for one row of a given store generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountJob {
    pub generation: u64,
    pub position: usize,
    pub query: String,
}

/// Result of a [`CountJob`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountResult {
    pub generation: u64,
    pub position: usize,
    pub query: String,
    pub counts: Counts,
}

/// Worker threads that run count queries off the owning context.
///
/// Results are only collected by the owner (`drain_results`); workers never
/// touch the entry store.
pub struct CountPool {
    jobs: Sender<CountJob>,
    /// Owner-side handle on the job queue, used to drop work not yet started
    queued: Receiver<CountJob>,
    results: Receiver<CountResult>,
    workers: Vec<JoinHandle<()>>,
}

impl CountPool {
    pub fn start(client: CountClient, worker_count: usize) -> Self {
        let (jobs_tx, jobs_rx) = async_channel::unbounded::<CountJob>();
        let (results_tx, results_rx) = async_channel::unbounded::<CountResult>();

        let mut workers = Vec::with_capacity(worker_count.max(1));
        for i in 0..worker_count.max(1) {
            let client = client.clone();
            let jobs = jobs_rx.clone();
            let results = results_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("count-worker-{}", i))
                .spawn(move || worker_loop(client, jobs, results));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => error!(error = %e, worker = i, "Failed to spawn count worker"),
            }
        }

        info!(workers = workers.len(), "Count worker pool started");
        Self {
            jobs: jobs_tx,
            queued: jobs_rx,
            results: results_rx,
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn submit(&self, job: CountJob) -> Result<(), BackendQueryError> {
        if self.workers.is_empty() {
            return Err(BackendQueryError::WorkerGone);
        }
        self.jobs
            .try_send(job)
            .map_err(|_| BackendQueryError::WorkerGone)
    }

    /// Collect every finished result without blocking
    pub fn drain_results(&self) -> Vec<CountResult> {
        let mut out = Vec::new();
        while let Ok(result) = self.results.try_recv() {
            out.push(result);
        }
        out
    }

    /// Block until the next result arrives or `timeout` elapses
    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<CountResult> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(result) = self.results.try_recv() {
                return Some(result);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Drop every job no worker has started yet.
    ///
    /// Jobs already running finish and still report a result.
    pub fn discard_queued(&self) -> usize {
        let mut discarded = 0;
        while self.queued.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "Discarded queued count jobs");
        }
        discarded
    }
}

impl Drop for CountPool {
    fn drop(&mut self) {
        self.discard_queued();
        self.jobs.close();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        debug!("Count worker pool stopped");
    }
}

fn worker_loop(client: CountClient, jobs: Receiver<CountJob>, results: Sender<CountResult>) {
    while let Ok(job) = jobs.recv_blocking() {
        let counts = client.counts_or_unavailable(&job.query);
        let result = CountResult {
            generation: job.generation,
            position: job.position,
            query: job.query,
            counts,
        };
        if results.send_blocking(result).is_err() {
            break;
        }
    }
}
