//! Ordered container of list rows

use crate::entry::SearchEntry;

/// Ordered rows; insertion order is display order.
///
/// Every `clear()` starts a new generation. Work computed against an older
/// generation (background counts) must not be applied to the current rows.
#[derive(Debug, Default, Clone)]
pub struct EntryStore {
    entries: Vec<SearchEntry>,
    generation: u64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Append a row and return its position
    pub fn append(&mut self, entry: SearchEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchEntry> {
        self.entries.iter()
    }

    /// Row at `position`, `None` when out of range
    pub fn at(&self, position: usize) -> Option<&SearchEntry> {
        self.entries.get(position)
    }

    pub(crate) fn at_mut(&mut self, position: usize) -> Option<&mut SearchEntry> {
        self.entries.get_mut(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_selectable(&self, position: usize) -> bool {
        matches!(self.at(position), Some(entry) if !entry.is_separator())
    }

    pub fn first_selectable(&self) -> Option<usize> {
        self.entries.iter().position(|e| !e.is_separator())
    }

    pub fn last_selectable(&self) -> Option<usize> {
        self.entries.iter().rposition(|e| !e.is_separator())
    }
}

impl<'a> IntoIterator for &'a EntryStore {
    type Item = &'a SearchEntry;
    type IntoIter = std::slice::Iter<'a, SearchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
