//! Saved-search document persistence
//!
//! The document is a JSON object mapping a name to a query string:
//!
//! ```json
//! { "none": "tag:todo", "work": "tag:work", "none": "from:boss" }
//! ```
//!
//! Keys may repeat and their order is display order, so the document is kept
//! as an ordered list of pairs rather than a map. Searches saved from the UI
//! are keyed `"none"` (unnamed).

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info, instrument};

use crate::entry::{NamedQuery, UNNAMED_SENTINEL};
use crate::error::PersistenceError;
use crate::reload::ReloadSignal;

/// Ordered, multi-valued name → query document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedSearchDocument {
    entries: Vec<NamedQuery>,
}

impl SavedSearchDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair at the end, keeping any existing pair with the same name
    pub fn push(&mut self, name: impl Into<String>, query: impl Into<String>) {
        self.entries.push(NamedQuery::new(name, query));
    }

    /// Add an unnamed search
    pub fn push_unnamed(&mut self, query: impl Into<String>) {
        self.push(UNNAMED_SENTINEL, query);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedQuery> {
        self.entries.iter()
    }

    /// All queries stored under `name`, in document order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.name == name)
            .map(|e| e.query.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SavedSearchDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.query)?;
        }
        map.end()
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = SavedSearchDocument;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping search names to query strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut doc = SavedSearchDocument::new();
        while let Some((name, query)) = access.next_entry::<String, String>()? {
            doc.push(name, query);
        }
        Ok(doc)
    }

    // Older writers emit a bare "" for a document with no entries
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v.is_empty() {
            Ok(SavedSearchDocument::new())
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl<'de> Deserialize<'de> for SavedSearchDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

impl<'a> IntoIterator for &'a SavedSearchDocument {
    type Item = &'a NamedQuery;
    type IntoIter = std::slice::Iter<'a, NamedQuery>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The saved-searches file on disk
#[derive(Debug, Clone)]
pub struct SavedSearchFile {
    path: PathBuf,
    reload: Option<ReloadSignal>,
}

impl SavedSearchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reload: None,
        }
    }

    /// Raise `signal` after every successful append
    pub fn with_reload_signal(mut self, signal: ReloadSignal) -> Self {
        self.reload = Some(signal);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document.
    ///
    /// A missing file is an empty document, not an error.
    #[instrument(name = "saved_searches_load", skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<SavedSearchDocument, PersistenceError> {
        if !self.path.exists() {
            debug!("Saved searches file not found, using empty document");
            return Ok(SavedSearchDocument::new());
        }

        info!("searches: loading saved searches..");
        let content =
            fs::read_to_string(&self.path).map_err(|e| PersistenceError::io(&self.path, e))?;
        serde_json::from_str(&content).map_err(|source| PersistenceError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the file with `doc` (write temp + rename)
    #[instrument(name = "saved_searches_write", skip(self, doc), fields(path = %self.path.display(), entries = doc.len()))]
    pub fn write(&self, doc: &SavedSearchDocument) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(doc).map_err(PersistenceError::Serialize)?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, &json).map_err(|e| PersistenceError::io(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| PersistenceError::io(&self.path, e))?;

        info!(bytes = json.len(), "searches: wrote back saved searches");
        Ok(())
    }

    /// Append an unnamed search, write back and request a reload.
    ///
    /// A malformed existing file is reported rather than overwritten.
    #[instrument(name = "saved_searches_append", skip(self))]
    pub fn append_saved_search(&self, query: &str) -> Result<(), PersistenceError> {
        info!(query, "searches: adding query");

        let mut doc = self.load()?;
        doc.push_unnamed(query);
        self.write(&doc)?;

        if let Some(signal) = &self.reload {
            signal.trigger();
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("searches"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::reload_channel;
    use tempfile::tempdir;

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let file = SavedSearchFile::new("/nonexistent/path/searches.json");
        let doc = file.load().unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_load_keeps_duplicate_keys_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("searches.json");
        fs::write(
            &path,
            r#"{ "none": "tag:todo", "work": "tag:work", "none": "from:boss" }"#,
        )
        .unwrap();

        let doc = SavedSearchFile::new(&path).load().unwrap();
        let pairs: Vec<_> = doc.iter().map(|e| (e.name.as_str(), e.query.as_str())).collect();
        assert_eq!(
            pairs,
            vec![("none", "tag:todo"), ("work", "tag:work"), ("none", "from:boss")]
        );
        assert_eq!(doc.get_all("none").collect::<Vec<_>>(), vec!["tag:todo", "from:boss"]);
    }

    #[test]
    fn test_load_invalid_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("searches.json");
        fs::write(&path, "not valid json").unwrap();

        let result = SavedSearchFile::new(&path).load();
        assert!(matches!(result, Err(PersistenceError::Json { .. })));
    }

    #[test]
    fn test_load_rejects_non_string_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("searches.json");
        fs::write(&path, r#"{ "work": { "nested": "x" } }"#).unwrap();

        assert!(SavedSearchFile::new(&path).load().is_err());
    }

    #[test]
    fn test_load_accepts_bare_empty_string() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("searches.json");
        fs::write(&path, "\"\"\n").unwrap();

        let doc = SavedSearchFile::new(&path).load().unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_write_then_load_is_stable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("searches.json");
        let file = SavedSearchFile::new(&path);

        let mut doc = SavedSearchDocument::new();
        doc.push_unnamed("tag:todo");
        doc.push("work", "tag:work");
        doc.push_unnamed("");
        file.write(&doc).unwrap();

        let first = file.load().unwrap();
        assert_eq!(first, doc);
        file.write(&first).unwrap();
        assert_eq!(file.load().unwrap(), first);
        assert!(!dir.path().join("nested").join("searches.json.tmp").exists());
    }

    #[test]
    fn test_append_adds_unnamed_and_triggers_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("searches.json");
        let (signal, listener) = reload_channel();
        let file = SavedSearchFile::new(&path).with_reload_signal(signal);

        file.append_saved_search("tag:later").unwrap();

        let doc = file.load().unwrap();
        assert_eq!(doc.get_all("none").collect::<Vec<_>>(), vec!["tag:later"]);
        assert!(listener.take());
        assert!(!listener.take());
    }

    #[test]
    fn test_append_does_not_clobber_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("searches.json");
        fs::write(&path, "{ broken").unwrap();
        let (signal, listener) = reload_channel();
        let file = SavedSearchFile::new(&path).with_reload_signal(signal);

        assert!(file.append_saved_search("tag:x").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ broken");
        assert!(!listener.take());
    }
}
