//! Assembles the two-section list
//!
//! Layout after a rebuild:
//!
//! ```text
//! <b>Startup queries</b>      header
//! inbox   tag:inbox           one row per configured startup query
//! <b>Saved searches</b>       header
//!         tag:todo            one row per document entry ("none" => "")
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::counts::{CountClient, CountJob};
use crate::entry::{
    Counts, NamedQuery, SearchEntry, SAVED_SECTION, STARTUP_SECTION, UNNAMED_SENTINEL,
};
use crate::logging;
use crate::persistence::SavedSearchFile;
use crate::store::EntryStore;

/// Rebuilds slower than this are logged as slow
const REBUILD_SLOW_THRESHOLD_MS: u64 = 250;

/// Read-only supplier of configured startup queries, read once per rebuild
pub trait StartupQuerySource: Send + Sync {
    fn startup_queries(&self) -> Vec<NamedQuery>;
}

impl StartupQuerySource for Vec<NamedQuery> {
    fn startup_queries(&self) -> Vec<NamedQuery> {
        self.clone()
    }
}

/// How counts are filled in during a rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountMode {
    /// Query the backend for every row before returning
    #[default]
    Inline,
    /// Leave rows `Pending`; the caller dispatches [`CountJob`]s
    Deferred,
}

/// What a rebuild produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub startup: usize,
    pub saved: usize,
    /// Rows whose counts failed
    pub unavailable: usize,
    /// Set when the saved-search document could not be read
    pub persistence_error: Option<String>,
}

pub struct ListBuilder {
    startup: Arc<dyn StartupQuerySource>,
    file: SavedSearchFile,
    counts: CountClient,
}

impl ListBuilder {
    pub fn new(
        startup: Arc<dyn StartupQuerySource>,
        file: SavedSearchFile,
        counts: CountClient,
    ) -> Self {
        Self {
            startup,
            file,
            counts,
        }
    }

    pub fn saved_search_file(&self) -> &SavedSearchFile {
        &self.file
    }

    pub fn count_client(&self) -> &CountClient {
        &self.counts
    }

    /// Clear `store` and repopulate it from both sources.
    ///
    /// A failed count marks that row unavailable; an unreadable document drops
    /// only the saved-search rows. The two headers are always present.
    #[instrument(name = "saved_searches_rebuild", skip_all, fields(mode = ?mode))]
    pub fn rebuild(&self, store: &mut EntryStore, mode: CountMode) -> RebuildSummary {
        let started = Instant::now();
        let mut summary = RebuildSummary::default();

        store.clear();

        store.append(SearchEntry::header(STARTUP_SECTION));
        for NamedQuery { name, query } in self.startup.startup_queries() {
            info!(name = %name, query = %query, "saved searches: got query");
            let counts = self.initial_counts(&query, mode, &mut summary);
            store.append(SearchEntry::query(name, query, counts));
            summary.startup += 1;
        }

        store.append(SearchEntry::header(SAVED_SECTION));
        match self.file.load() {
            Ok(doc) => {
                for NamedQuery { name, query } in doc.iter().cloned() {
                    let name = if name == UNNAMED_SENTINEL {
                        String::new()
                    } else {
                        name
                    };
                    info!(name = %name, query = %query, "saved searches: got query");
                    let counts = self.initial_counts(&query, mode, &mut summary);
                    store.append(SearchEntry::query(name, query, counts));
                    summary.saved += 1;
                }
            }
            Err(e) => {
                warn!(
                    event_type = "saved_searches",
                    path = %self.file.path().display(),
                    error = %e,
                    "Saved searches unreadable, showing startup queries only"
                );
                summary.persistence_error = Some(e.to_string());
            }
        }

        logging::log_perf(
            "saved_searches_rebuild",
            started.elapsed().as_millis() as u64,
            REBUILD_SLOW_THRESHOLD_MS,
        );
        summary
    }

    /// Recompute counts of every query row in place.
    ///
    /// Row order and the persisted document are untouched. Returns the number
    /// of rows whose counts are unavailable.
    #[instrument(name = "saved_searches_refresh_counts", skip_all)]
    pub fn refresh_counts_only(&self, store: &mut EntryStore) -> usize {
        let mut unavailable = 0;
        for position in 0..store.len() {
            if let Some(SearchEntry::Query { query, counts, .. }) = store.at_mut(position) {
                *counts = self.counts.counts_or_unavailable(query);
                if *counts == Counts::Unavailable {
                    unavailable += 1;
                }
            }
        }
        unavailable
    }

    /// One job per query row of the current generation
    pub fn count_jobs(store: &EntryStore) -> Vec<CountJob> {
        store
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                entry.query_str().map(|query| CountJob {
                    generation: store.generation(),
                    position,
                    query: query.to_string(),
                })
            })
            .collect()
    }

    fn initial_counts(
        &self,
        query: &str,
        mode: CountMode,
        summary: &mut RebuildSummary,
    ) -> Counts {
        match mode {
            CountMode::Deferred => Counts::Pending,
            CountMode::Inline => {
                let counts = self.counts.counts_or_unavailable(query);
                if counts == Counts::Unavailable {
                    summary.unavailable += 1;
                }
                counts
            }
        }
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
