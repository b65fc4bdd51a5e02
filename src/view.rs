//! The saved-searches list as seen by its hosting view
//!
//! `SavedSearches` owns the entry store, the cursor and the count pool. All of
//! them are mutated only through `&mut self`, so a rebuild is never observed
//! half done. Other threads interact only through the cloneable
//! [`ReloadSignal`]; the owner drains it with
//! [`process_pending_reload`](SavedSearches::process_pending_reload).

use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, trace};

use crate::activation::{activate, OpenQuery};
use crate::builder::{CountMode, ListBuilder, RebuildSummary, StartupQuerySource};
use crate::config::Config;
use crate::counts::{CountBackend, CountClient, CountPool, CountResult};
use crate::entry::{Counts, SearchEntry};
use crate::error::{Result, ResultExt, SearchListError};
use crate::navigation::{Navigator, Viewport};
use crate::persistence::SavedSearchFile;
use crate::reload::{reload_channel, ReloadListener, ReloadSignal};
use crate::store::EntryStore;

pub struct SavedSearches {
    store: EntryStore,
    navigator: Navigator,
    builder: ListBuilder,
    listener: ReloadListener,
    signal: ReloadSignal,
    pool: Option<CountPool>,
    mode: CountMode,
    last_summary: RebuildSummary,
    reloads: u64,
}

impl SavedSearches {
    /// Build the list and load it once.
    ///
    /// With `background_workers` set, counts are computed on that many worker
    /// threads and rows start out `Pending`; otherwise every rebuild counts
    /// inline.
    pub fn new(
        startup: Arc<dyn StartupQuerySource>,
        searches_file: impl Into<PathBuf>,
        counts: CountClient,
        viewport: Viewport,
        background_workers: Option<usize>,
    ) -> Self {
        let (signal, listener) = reload_channel();
        let file = SavedSearchFile::new(searches_file).with_reload_signal(signal.clone());

        let (pool, mode) = match background_workers {
            Some(workers) => (
                Some(CountPool::start(counts.clone(), workers)),
                CountMode::Deferred,
            ),
            None => (None, CountMode::Inline),
        };

        let mut list = Self {
            store: EntryStore::new(),
            navigator: Navigator::new(viewport),
            builder: ListBuilder::new(startup, file, counts),
            listener,
            signal,
            pool,
            mode,
            last_summary: RebuildSummary::default(),
            reloads: 0,
        };
        list.reload();
        list
    }

    /// Wire the list up from configuration and a count backend
    pub fn from_config(config: &Config, backend: Arc<dyn CountBackend>) -> Self {
        let client = CountClient::new(backend, config.excluded_tags.clone());
        let viewport = Viewport {
            step: config.get_page_step(),
            ..Viewport::default()
        };
        let workers = config
            .counts
            .background
            .then(|| config.counts.get_workers());
        Self::new(
            Arc::new(config.clone()),
            config.get_searches_file(),
            client,
            viewport,
            workers,
        )
    }

    /// Handle for requesting a reload from any thread
    pub fn reload_signal(&self) -> ReloadSignal {
        self.signal.clone()
    }

    pub fn reload_listener(&self) -> &ReloadListener {
        &self.listener
    }

    /// Run the reload requested through the signal, if one is pending.
    ///
    /// However many triggers arrived since the last call, at most one rebuild
    /// runs.
    pub fn process_pending_reload(&mut self) -> bool {
        if !self.listener.take() {
            return false;
        }
        self.reload();
        true
    }

    /// Rebuild now, keeping the cursor on the same row where possible
    #[instrument(name = "saved_searches_reload", skip(self), fields(generation = self.store.generation()))]
    pub fn reload(&mut self) -> &RebuildSummary {
        let previous = self.navigator.selected();
        self.last_summary = self.builder.rebuild(&mut self.store, self.mode);
        self.navigator.restore(&self.store, previous);
        self.reloads += 1;

        if self.pool.is_some() {
            self.dispatch_count_jobs();
        }

        info!(
            event_type = "saved_searches",
            rows = self.store.len(),
            startup = self.last_summary.startup,
            saved = self.last_summary.saved,
            selected = ?self.navigator.selected(),
            "Saved searches reloaded"
        );
        &self.last_summary
    }

    /// Append `query` to the saved-search file.
    ///
    /// The list itself is refreshed by the reload this raises, on the next
    /// [`process_pending_reload`](Self::process_pending_reload).
    pub fn save_query(&mut self, query: &str) -> Result<()> {
        self.builder.saved_search_file().append_saved_search(query)?;
        Ok(())
    }

    /// Recompute counts without touching rows or the file
    pub fn refresh_counts(&mut self) {
        match self.mode {
            CountMode::Inline => {
                let unavailable = self.builder.refresh_counts_only(&mut self.store);
                debug!(unavailable, "Counts refreshed");
            }
            CountMode::Deferred => self.dispatch_count_jobs(),
        }
    }

    /// Apply finished background counts for the current generation.
    ///
    /// Returns the number of rows updated.
    pub fn apply_count_results(&mut self) -> usize {
        let Some(pool) = &self.pool else {
            return 0;
        };
        let results = pool.drain_results();
        results
            .into_iter()
            .filter(|result| apply_count_result(&mut self.store, result))
            .count()
    }

    /// Block until no row is `Pending` or `timeout` elapses, applying results
    /// as they arrive
    pub fn settle_counts(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut applied = 0;
        while self.pending_counts() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let Some(pool) = &self.pool else {
                break;
            };
            match pool.recv_result_timeout(remaining) {
                Some(result) => {
                    if apply_count_result(&mut self.store, &result) {
                        applied += 1;
                    }
                }
                None => break,
            }
        }
        applied
    }

    /// Rows still waiting for counts
    pub fn pending_counts(&self) -> usize {
        self.store
            .iter()
            .filter(|entry| entry.counts() == Some(Counts::Pending))
            .count()
    }

    pub fn move_down(&mut self) {
        self.navigator.move_down(&self.store);
    }

    pub fn move_up(&mut self) {
        self.navigator.move_up(&self.store);
    }

    pub fn page_down(&mut self) {
        self.navigator.page_down(&self.store);
    }

    pub fn page_up(&mut self) {
        self.navigator.page_up();
    }

    pub fn home(&mut self) {
        self.navigator.home(&self.store);
    }

    pub fn end(&mut self) {
        self.navigator.end(&self.store);
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.navigator.set_viewport_height(&self.store, height);
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.navigator.visible_range(&self.store)
    }

    pub fn viewport(&self) -> Viewport {
        self.navigator.viewport()
    }

    pub fn selected(&self) -> Option<usize> {
        self.navigator.selected()
    }

    pub fn selected_entry(&self) -> Option<&SearchEntry> {
        self.navigator.selected().and_then(|p| self.store.at(p))
    }

    /// Select `position` if it holds a query
    pub fn select(&mut self, position: usize) -> Result<()> {
        if !self.store.is_selectable(position) {
            return Err(SearchListError::InvalidSelection { position });
        }
        self.navigator.restore(&self.store, Some(position));
        Ok(())
    }

    /// Hand the query at `position` to `opener`
    pub fn activate_at(&self, position: usize, opener: &mut dyn OpenQuery) -> Result<()> {
        let (name, query) = activate(&self.store, position)?;
        info!(event_type = "saved_searches", name, query, "Opening saved search");
        opener.open_query(name, query);
        Ok(())
    }

    /// Hand the selected query to `opener`
    pub fn activate_selected(&self, opener: &mut dyn OpenQuery) -> Result<()> {
        // No selection reports the one-past-end row
        let position = self.navigator.selected().unwrap_or(self.store.len());
        self.activate_at(position, opener)
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn last_summary(&self) -> &RebuildSummary {
        &self.last_summary
    }

    /// Rebuilds run so far, including the initial load
    pub fn reload_count(&self) -> u64 {
        self.reloads
    }

    pub fn count_mode(&self) -> CountMode {
        self.mode
    }

    fn dispatch_count_jobs(&mut self) {
        let Some(pool) = &self.pool else {
            return;
        };
        // Queued jobs are either superseded or about to be resubmitted
        pool.discard_queued();
        let jobs = ListBuilder::count_jobs(&self.store);
        debug!(jobs = jobs.len(), generation = self.store.generation(), "Dispatching count jobs");
        for job in jobs {
            let position = job.position;
            if pool.submit(job).warn_on_err().is_none() {
                if let Some(SearchEntry::Query { counts, .. }) = self.store.at_mut(position) {
                    *counts = Counts::Unavailable;
                }
            }
        }
    }
}

/// Write `result` into `store` if it still describes the current rows.
///
/// Results from an older generation, or for a row that no longer holds the
/// same query, are dropped.
pub(crate) fn apply_count_result(store: &mut EntryStore, result: &CountResult) -> bool {
    if result.generation != store.generation() {
        trace!(
            position = result.position,
            result_generation = result.generation,
            generation = store.generation(),
            "Discarding stale count result"
        );
        return false;
    }
    match store.at_mut(result.position) {
        Some(SearchEntry::Query { query, counts, .. }) if *query == result.query => {
            *counts = result.counts;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
