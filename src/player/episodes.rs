//! Episode list navigation

use crate::models::Episode;

/// Ordered episode list with a cursor
///
/// Order is the catalog server's order. When the list is non-empty the
/// cursor always points at a valid entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeNavigator {
    episodes: Vec<Episode>,
    current: usize,
}

impl EpisodeNavigator {
    /// Build a navigator, clamping `current` into range
    pub fn new(episodes: Vec<Episode>, current: usize) -> Self {
        let current = if episodes.is_empty() {
            0
        } else {
            current.min(episodes.len() - 1)
        };
        Self { episodes, current }
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Cursor position, `None` for an empty list
    pub fn current_index(&self) -> Option<usize> {
        (!self.episodes.is_empty()).then_some(self.current)
    }

    pub fn current(&self) -> Option<&Episode> {
        self.episodes.get(self.current)
    }

    pub fn has_next(&self) -> bool {
        !self.episodes.is_empty() && self.current < self.episodes.len() - 1
    }

    pub fn has_previous(&self) -> bool {
        !self.episodes.is_empty() && self.current > 0
    }

    pub fn get(&self, index: usize) -> Option<&Episode> {
        self.episodes.get(index)
    }

    /// Index after the cursor, if there is one. The cursor does not move.
    pub fn next_index(&self) -> Option<usize> {
        self.has_next().then(|| self.current + 1)
    }

    /// Index before the cursor, if there is one. The cursor does not move.
    pub fn previous_index(&self) -> Option<usize> {
        self.has_previous().then(|| self.current - 1)
    }

    /// Move the cursor to `index`
    pub fn select(&mut self, index: usize) -> Option<&Episode> {
        if index >= self.episodes.len() {
            return None;
        }
        self.current = index;
        self.episodes.get(self.current)
    }
}
