//! Saved searches - a two-section list of notmuch queries with live counts
//!
//! The list shows configured startup queries followed by searches the user
//! saved, each with its total and unread message counts.

pub mod config;
pub mod error;
pub mod logging;

// Rows and their container
pub mod entry;
pub mod store;

// Sources: configured startup queries and the saved-search file
pub mod builder;
pub mod persistence;

// Message counts (inline or on worker threads)
pub mod counts;

// Cursor, reload and activation
pub mod activation;
pub mod navigation;
pub mod reload;

pub mod view;

// Test doubles, also usable by embedders
pub mod testing;

pub use activation::OpenQuery;
pub use builder::{CountMode, ListBuilder, RebuildSummary, StartupQuerySource};
pub use counts::{CountBackend, CountClient, CountPool, NotmuchCli};
pub use entry::{Counts, MessageCounts, NamedQuery, SearchEntry};
pub use error::{Result, SearchListError};
pub use persistence::{SavedSearchDocument, SavedSearchFile};
pub use reload::{ReloadListener, ReloadSignal};
pub use store::EntryStore;
pub use view::SavedSearches;
