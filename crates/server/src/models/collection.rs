//! Collection domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gachadex_core::{CatalogItem, CatalogItemId};

/// A stored ownership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionEntry {
    pub item_id: CatalogItemId,
    pub shiny: bool,
    pub caught_at: DateTime<Utc>,
}

/// An owned entry joined with its catalog item.
#[derive(Debug, Clone, Serialize)]
pub struct CollectedItem {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub shiny: bool,
    pub caught_at: DateTime<Utc>,
}
