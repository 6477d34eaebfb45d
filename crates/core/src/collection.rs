//! A user's owned entries and the merge rule for new draws.
//!
//! Ownership is keyed by catalog id: a user owns each item at most once. A
//! shiny draw upgrades a plain entry, and nothing ever downgrades one.

use serde::{Deserialize, Serialize};

use crate::draw::DrawResult;
use crate::types::CatalogItemId;

/// One owned item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnedEntry {
    pub item_id: CatalogItemId,
    pub shiny: bool,
}

/// What a merge did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    /// The item was not owned and is now.
    Added,
    /// A plain entry became shiny.
    Upgraded,
    /// The collection did not change.
    Unchanged,
}

impl MergeOutcome {
    /// Decide the outcome for a draw given the existing entry's shiny flag.
    ///
    /// Stores that apply merges row by row use this to stay consistent with
    /// [`Collection::merge`].
    #[must_use]
    pub const fn decide(existing_shiny: Option<bool>, drawn_shiny: bool) -> Self {
        match existing_shiny {
            None => Self::Added,
            Some(false) if drawn_shiny => Self::Upgraded,
            Some(_) => Self::Unchanged,
        }
    }

    /// Whether the collection changed.
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Upgraded => "upgraded",
            Self::Unchanged => "unchanged",
        }
    }
}

/// An in-memory collection, oldest entry first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    entries: Vec<OwnedEntry>,
}

impl Collection {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from stored entries. Later duplicates of an id are merged into
    /// the first occurrence.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = OwnedEntry>) -> Self {
        let mut collection = Self::new();
        for entry in entries {
            collection.apply(entry.item_id, entry.shiny);
        }
        collection
    }

    /// Apply a draw.
    pub fn merge(&mut self, result: &DrawResult) -> MergeOutcome {
        self.apply(result.item.id, result.shiny)
    }

    fn apply(&mut self, item_id: CatalogItemId, shiny: bool) -> MergeOutcome {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.item_id == item_id) {
            let outcome = MergeOutcome::decide(Some(entry.shiny), shiny);
            if outcome == MergeOutcome::Upgraded {
                entry.shiny = true;
            }
            return outcome;
        }
        self.entries.push(OwnedEntry { item_id, shiny });
        MergeOutcome::Added
    }

    #[must_use]
    pub fn get(&self, item_id: CatalogItemId) -> Option<&OwnedEntry> {
        self.entries.iter().find(|e| e.item_id == item_id)
    }

    #[must_use]
    pub fn entries(&self) -> &[OwnedEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
