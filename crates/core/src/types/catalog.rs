//! The static catalog of drawable items.
//!
//! The catalog is loaded once from a JSON array at startup and never mutated.
//! Items are indexed by id and grouped by rarity so a draw can pick uniformly
//! inside the selected class.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::id::CatalogItemId;
use super::rarity::Rarity;
use crate::draw::DrawError;

/// Errors raised while loading a catalog.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// The input is not a JSON array of catalog items.
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Two entries share an id.
    #[error("duplicate catalog id {0}")]
    DuplicateId(CatalogItemId),
    /// An entry has a blank name.
    #[error("catalog item {0} has an empty name")]
    EmptyName(CatalogItemId),
}

/// One drawable creature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    /// Elemental type tag, e.g. `"Fire"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub rarity: Rarity,
    /// Image path or URL shown by clients.
    pub image: String,
}

/// Immutable, validated item catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    by_id: HashMap<CatalogItemId, usize>,
    by_rarity: HashMap<Rarity, Vec<usize>>,
}

impl Catalog {
    /// Build a catalog from items, checking id uniqueness and names.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] or [`CatalogError::EmptyName`].
    pub fn new(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(items.len());
        let mut by_rarity: HashMap<Rarity, Vec<usize>> = HashMap::new();

        for (index, item) in items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(item.id));
            }
            if by_id.insert(item.id, index).is_some() {
                return Err(CatalogError::DuplicateId(item.id));
            }
            by_rarity.entry(item.rarity).or_default().push(index);
        }

        Ok(Self {
            items,
            by_id,
            by_rarity,
        })
    }

    /// Parse and validate a catalog from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on malformed JSON or invalid entries.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<CatalogItem> = serde_json::from_str(json)?;
        Self::new(items)
    }

    /// All items in file order.
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by id.
    #[must_use]
    pub fn get(&self, id: CatalogItemId) -> Option<&CatalogItem> {
        self.by_id.get(&id).and_then(|&i| self.items.get(i))
    }

    /// Pick uniformly among items of `rarity`.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::NoItemForRarity`] if the class has no items.
    pub fn select_item<R: Rng + ?Sized>(
        &self,
        rarity: Rarity,
        rng: &mut R,
    ) -> Result<&CatalogItem, DrawError> {
        let indices = self
            .by_rarity
            .get(&rarity)
            .filter(|indices| !indices.is_empty())
            .ok_or(DrawError::NoItemForRarity(rarity))?;
        let pick = rng.random_range(0..indices.len());
        indices
            .get(pick)
            .and_then(|&i| self.items.get(i))
            .ok_or(DrawError::NoItemForRarity(rarity))
    }

    /// Item count per rarity, in draw order. Empty classes report zero.
    #[must_use]
    pub fn counts_by_rarity(&self) -> Vec<(Rarity, usize)> {
        Rarity::ALL
            .into_iter()
            .map(|r| (r, self.by_rarity.get(&r).map_or(0, Vec::len)))
            .collect()
    }

    /// Rarities that can be selected but would fail the draw.
    #[must_use]
    pub fn missing_rarities(&self) -> Vec<Rarity> {
        let present: HashSet<Rarity> = self.items.iter().map(|i| i.rarity).collect();
        Rarity::ALL
            .into_iter()
            .filter(|r| !present.contains(r))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const SAMPLE: &str = r#"[
        {"id": 1, "name": "Bulbasaur", "type": "Grass", "rarity": "Common", "image": "/pokemon/001.png"},
        {"id": 4, "name": "Charmander", "type": "Fire", "rarity": "Common", "image": "/pokemon/004.png"},
        {"id": 150, "name": "Mewtwo", "type": "Psychic", "rarity": "Legendary", "image": "/pokemon/150.png"}
    ]"#;

    fn item(id: i32, name: &str, rarity: Rarity) -> CatalogItem {
        CatalogItem {
            id: CatalogItemId::new(id),
            name: name.to_owned(),
            kind: "Normal".to_owned(),
            rarity,
            image: format!("/pokemon/{id:03}.png"),
        }
    }

    #[test]
    fn test_from_json_reads_type_field() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 3);
        let charmander = catalog.get(CatalogItemId::new(4)).unwrap();
        assert_eq!(charmander.kind, "Fire");
        assert_eq!(charmander.rarity, Rarity::Common);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = Catalog::new(vec![
            item(7, "Squirtle", Rarity::Common),
            item(7, "Wartortle", Rarity::Uncommon),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id.as_i32() == 7));
    }

    #[test]
    fn test_rejects_blank_names() {
        let err = Catalog::new(vec![item(1, "  ", Rarity::Common)]).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyName(_)));
    }

    #[test]
    fn test_rejects_unknown_rarity() {
        let json = r#"[{"id": 1, "name": "Mew", "type": "Psychic", "rarity": "Mythic", "image": ""}]"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_select_item_stays_in_class() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let picked = catalog.select_item(Rarity::Common, &mut rng).unwrap();
            assert_eq!(picked.rarity, Rarity::Common);
        }
    }

    #[test]
    fn test_select_item_reaches_every_member() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let seen: HashSet<CatalogItemId> = (0..200)
            .map(|_| catalog.select_item(Rarity::Common, &mut rng).unwrap().id)
            .collect();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_select_item_empty_class_fails() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            catalog.select_item(Rarity::Epic, &mut rng).unwrap_err(),
            DrawError::NoItemForRarity(Rarity::Epic)
        );
    }

    #[test]
    fn test_counts_and_missing() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(
            catalog.counts_by_rarity(),
            vec![
                (Rarity::Common, 2),
                (Rarity::Uncommon, 0),
                (Rarity::Rare, 0),
                (Rarity::Epic, 0),
                (Rarity::Legendary, 1),
            ]
        );
        assert_eq!(
            catalog.missing_rarities(),
            vec![Rarity::Uncommon, Rarity::Rare, Rarity::Epic]
        );
    }
}
