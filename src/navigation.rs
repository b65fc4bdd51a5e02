//! Cursor movement over the list
//!
//! Movement skips section headers and never wraps. Any move that cannot find
//! a selectable row in the requested direction leaves the cursor where it was.

use std::ops::Range;

use tracing::trace;

use crate::store::EntryStore;

/// Scroll window of the hosting view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible row
    pub offset: usize,
    /// Visible rows; 0 means the view shows everything
    pub height: usize,
    /// Rows moved by page up/down
    pub step: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: 0,
            height: 0,
            step: crate::config::DEFAULT_PAGE_STEP,
        }
    }
}

impl Viewport {
    fn max_offset(&self, len: usize) -> usize {
        if self.height == 0 {
            0
        } else {
            len.saturating_sub(self.height)
        }
    }

    /// Scroll the least amount that brings `position` into view
    fn reveal(&mut self, position: usize) {
        if self.height == 0 {
            return;
        }
        if position < self.offset {
            self.offset = position;
        } else if position >= self.offset + self.height {
            self.offset = position + 1 - self.height;
        }
    }
}

/// Selection state over an [`EntryStore`]
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    selected: Option<usize>,
    viewport: Viewport,
}

impl Navigator {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            selected: None,
            viewport,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport_height(&mut self, store: &EntryStore, height: usize) {
        self.viewport.height = height;
        self.viewport.offset = self.viewport.offset.min(self.viewport.max_offset(store.len()));
        if let Some(position) = self.selected {
            self.viewport.reveal(position);
        }
    }

    /// Rows currently in view
    pub fn visible_range(&self, store: &EntryStore) -> Range<usize> {
        let len = store.len();
        let start = self.viewport.offset.min(len);
        let end = if self.viewport.height == 0 {
            len
        } else {
            (start + self.viewport.height).min(len)
        };
        start..end
    }

    /// Next selectable row below the cursor
    pub fn move_down(&mut self, store: &EntryStore) {
        if store.len() < 2 {
            return;
        }
        let start = self.selected.map_or(0, |p| p + 1);
        if let Some(position) = (start..store.len()).find(|&p| store.is_selectable(p)) {
            self.select(position, "down");
        }
    }

    /// Previous selectable row above the cursor
    pub fn move_up(&mut self, store: &EntryStore) {
        let Some(current) = self.selected else {
            return;
        };
        if current == 0 {
            return;
        }
        let end = current.min(store.len());
        if let Some(position) = (0..end).rev().find(|&p| store.is_selectable(p)) {
            self.select(position, "up");
        }
    }

    /// Scroll one step down; the selection is left alone
    pub fn page_down(&mut self, store: &EntryStore) {
        let max = self.viewport.max_offset(store.len());
        self.viewport.offset = (self.viewport.offset + self.viewport.step).min(max);
    }

    /// Scroll one step up; the selection is left alone
    pub fn page_up(&mut self) {
        self.viewport.offset = self.viewport.offset.saturating_sub(self.viewport.step);
    }

    /// First selectable row, or row 0 when nothing is selectable
    pub fn home(&mut self, store: &EntryStore) {
        match store.first_selectable() {
            Some(position) => self.select(position, "home"),
            None if !store.is_empty() => self.select(0, "home"),
            None => {}
        }
    }

    /// Last selectable row, or the last row when nothing is selectable
    pub fn end(&mut self, store: &EntryStore) {
        match store.last_selectable() {
            Some(position) => self.select(position, "end"),
            None if !store.is_empty() => self.select(store.len() - 1, "end"),
            None => {}
        }
    }

    /// Put the cursor back on `previous` after a rebuild.
    ///
    /// The position is clamped to the new bounds; a header at that position
    /// hands the cursor to the nearest selectable row, preferring below.
    pub fn restore(&mut self, store: &EntryStore, previous: Option<usize>) {
        let Some(previous) = previous else {
            self.selected = store.first_selectable();
            self.clamp_viewport(store);
            return;
        };
        if store.is_empty() {
            self.selected = None;
            return;
        }

        let clamped = previous.min(store.len() - 1);
        self.selected = if store.is_selectable(clamped) {
            Some(clamped)
        } else {
            (clamped..store.len())
                .find(|&p| store.is_selectable(p))
                .or_else(|| (0..clamped).rev().find(|&p| store.is_selectable(p)))
        };
        self.clamp_viewport(store);
        if let Some(position) = self.selected {
            self.viewport.reveal(position);
        }
    }

    fn clamp_viewport(&mut self, store: &EntryStore) {
        self.viewport.offset = self.viewport.offset.min(self.viewport.max_offset(store.len()));
    }

    fn select(&mut self, position: usize, reason: &str) {
        trace!(position, reason, "selection moved");
        self.selected = Some(position);
        self.viewport.reveal(position);
    }
}

#[cfg(test)]
#[path = "navigation_tests.rs"]
mod tests;
