//! Test doubles for embedding and testing the saved-searches list

use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::activation::OpenQuery;
use crate::counts::CountBackend;
use crate::error::BackendQueryError;

/// One recorded `CountBackend::count` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountCall {
    pub query: String,
    pub excluded_tags: Vec<String>,
}

/// Count backend with canned answers.
///
/// Queries without a canned count return 0; queries registered with
/// `with_failure` fail like a syntax error would.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    counts: HashMap<String, u64>,
    failures: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<CountCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, query: impl Into<String>, count: u64) -> Self {
        self.counts.insert(query.into(), count);
        self
    }

    /// Fail `query` and its unread variant
    pub fn with_failure(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.failures.insert(crate::counts::unread_query(&query));
        self.failures.insert(query);
        self
    }

    /// Sleep this long in every call, like a slow index
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<CountCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl CountBackend for ScriptedBackend {
    fn count(&self, query: &str, excluded_tags: &[String]) -> Result<u64, BackendQueryError> {
        self.calls.lock().push(CountCall {
            query: query.to_string(),
            excluded_tags: excluded_tags.to_vec(),
        });
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if self.failures.contains(query) {
            return Err(BackendQueryError::Failed {
                query: query.to_string(),
                stderr: "A Xapian exception occurred: syntax error".to_string(),
            });
        }
        Ok(self.counts.get(query).copied().unwrap_or(0))
    }
}

/// Open-query collaborator that remembers what it was asked to open
#[derive(Debug, Default)]
pub struct RecordingOpener {
    pub opened: Vec<(String, String)>,
}

impl OpenQuery for RecordingOpener {
    fn open_query(&mut self, name: &str, query: &str) {
        self.opened.push((name.to_string(), query.to_string()));
    }
}
