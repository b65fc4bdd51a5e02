//! Opening the selected query

use tracing::debug;

use crate::entry::SearchEntry;
use crate::error::{Result, SearchListError};
use crate::store::EntryStore;

/// Downstream view that shows the results of a query
pub trait OpenQuery {
    fn open_query(&mut self, name: &str, query: &str);
}

/// `(name, query)` of the row at `position`.
///
/// Separators and out-of-range positions are `InvalidSelection`.
pub fn activate(store: &EntryStore, position: usize) -> Result<(&str, &str)> {
    match store.at(position) {
        Some(SearchEntry::Query { name, query, .. }) => Ok((name.as_str(), query.as_str())),
        Some(SearchEntry::Header(_)) | None => {
            debug!(position, len = store.len(), "Activation on a non-query row ignored");
            Err(SearchListError::InvalidSelection { position })
        }
    }
}
