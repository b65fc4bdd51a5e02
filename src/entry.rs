//! Rows of the saved-searches list
//!
//! A row is either a section header ("Startup queries", "Saved searches") or a
//! named query annotated with its message counts. Headers are never selectable.

use std::fmt;

/// Title of the section holding queries from configuration
pub const STARTUP_SECTION: &str = "Startup queries";

/// Title of the section holding user-saved queries
pub const SAVED_SECTION: &str = "Saved searches";

/// Document key used for searches saved without a name
pub const UNNAMED_SENTINEL: &str = "none";

/// A (name, query) pair as read from configuration or the saved-search document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    pub name: String,
    pub query: String,
}

impl NamedQuery {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
        }
    }
}

/// Message counts for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageCounts {
    pub total: u64,
    pub unread: u64,
}

/// Count state of a query row.
///
/// `Ready { total: 0, .. }` is a real zero; a failed count is `Unavailable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Counts {
    /// Counts are queued on a worker and not applied yet
    #[default]
    Pending,
    Ready(MessageCounts),
    /// The backend rejected the query or could not be reached
    Unavailable,
}

impl Counts {
    /// Pre-formatted total label, e.g. `(total: 42)`
    pub fn total_label(&self) -> String {
        match self {
            Counts::Pending => "(total: …)".to_string(),
            Counts::Ready(c) => format!("(total: {})", c.total),
            Counts::Unavailable => "(total: n/a)".to_string(),
        }
    }

    /// Pre-formatted unread label, e.g. `(unread: 3)`
    pub fn unread_label(&self) -> String {
        match self {
            Counts::Pending => "(unread: …)".to_string(),
            Counts::Ready(c) => format!("(unread: {})", c.unread),
            Counts::Unavailable => "(unread: n/a)".to_string(),
        }
    }
}

/// One row of the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEntry {
    /// A section separator
    Header(String),
    Query {
        name: String,
        query: String,
        counts: Counts,
    },
}

impl SearchEntry {
    pub fn header(title: impl Into<String>) -> Self {
        SearchEntry::Header(title.into())
    }

    pub fn query(name: impl Into<String>, query: impl Into<String>, counts: Counts) -> Self {
        SearchEntry::Query {
            name: name.into(),
            query: query.into(),
            counts,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, SearchEntry::Header(_))
    }

    /// Plain display name (header title for separators)
    pub fn name(&self) -> &str {
        match self {
            SearchEntry::Header(title) => title,
            SearchEntry::Query { name, .. } => name,
        }
    }

    /// Backend query; `None` for separators
    pub fn query_str(&self) -> Option<&str> {
        match self {
            SearchEntry::Header(_) => None,
            SearchEntry::Query { query, .. } => Some(query),
        }
    }

    pub fn counts(&self) -> Option<Counts> {
        match self {
            SearchEntry::Header(_) => None,
            SearchEntry::Query { counts, .. } => Some(*counts),
        }
    }

    /// Name as Pango-style markup: headers bold, query names escaped
    pub fn name_markup(&self) -> String {
        match self {
            SearchEntry::Header(title) => format!("<b>{}</b>", escape_markup(title)),
            SearchEntry::Query { name, .. } => escape_markup(name),
        }
    }

    pub fn total_label(&self) -> String {
        self.counts().map(|c| c.total_label()).unwrap_or_default()
    }

    pub fn unread_label(&self) -> String {
        self.counts().map(|c| c.unread_label()).unwrap_or_default()
    }
}

impl fmt::Display for SearchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchEntry::Header(title) => write!(f, "== {} ==", title),
            SearchEntry::Query {
                name,
                query,
                counts,
            } => write!(
                f,
                "{:<16} {:<32} {} {}",
                name,
                query,
                counts.unread_label(),
                counts.total_label()
            ),
        }
    }
}

fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_failure_render_differently() {
        let zero = Counts::Ready(MessageCounts::default());
        assert_eq!(zero.total_label(), "(total: 0)");
        assert_eq!(zero.unread_label(), "(unread: 0)");
        assert_eq!(Counts::Unavailable.total_label(), "(total: n/a)");
        assert_eq!(Counts::Unavailable.unread_label(), "(unread: n/a)");
    }

    #[test]
    fn test_header_has_no_query_or_counts() {
        let header = SearchEntry::header(STARTUP_SECTION);
        assert!(header.is_separator());
        assert_eq!(header.query_str(), None);
        assert_eq!(header.counts(), None);
        assert_eq!(header.total_label(), "");
        assert_eq!(header.name_markup(), "<b>Startup queries</b>");
    }

    #[test]
    fn test_query_name_markup_is_escaped() {
        let entry = SearchEntry::query(
            "R&D <inbox>",
            "tag:rnd",
            Counts::Ready(MessageCounts {
                total: 42,
                unread: 3,
            }),
        );
        assert!(!entry.is_separator());
        assert_eq!(entry.name_markup(), "R&amp;D &lt;inbox&gt;");
        assert_eq!(entry.total_label(), "(total: 42)");
        assert_eq!(entry.unread_label(), "(unread: 3)");
    }

    #[test]
    fn test_empty_query_is_allowed() {
        let entry = SearchEntry::query("all", "", Counts::Pending);
        assert_eq!(entry.query_str(), Some(""));
    }
}
