//! Asset catalog: placeables, items and weighted spawn tables.
//!
//! Every asset is addressed by a numeric [`AssetId`]. Ids live in separate
//! namespaces per asset kind, so a placeable and a spawn table may share an
//! id the same way they do in the configuration file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric asset identifier.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u16);

impl AssetId {
    /// Creates an asset id from its raw value.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for AssetId {
    fn from(id: u16) -> Self {
        Self::new(id)
    }
}

/// A placeable (barricade) definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceableDef {
    /// Asset id.
    pub id: AssetId,
    /// Display name.
    pub name: String,
    /// Storage slots, or `None` for placeables without storage.
    pub storage_slots: Option<u32>,
}

impl PlaceableDef {
    /// A placeable with a storage container of `slots` slots.
    #[must_use]
    pub fn storage(id: AssetId, name: &str, slots: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            storage_slots: Some(slots),
        }
    }

    /// A placeable with no storage (walls, signs, ...).
    #[must_use]
    pub fn plain(id: AssetId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            storage_slots: None,
        }
    }

    /// Returns true if placing this definition yields a storage container.
    #[must_use]
    pub fn has_storage(&self) -> bool {
        self.storage_slots.is_some()
    }
}

/// An item definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Asset id.
    pub id: AssetId,
    /// Display name.
    pub name: String,
    /// Storage slots one instance occupies.
    pub size: u32,
}

impl ItemDef {
    /// Creates an item definition.
    #[must_use]
    pub fn new(id: AssetId, name: &str, size: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            size,
        }
    }
}

/// What a spawn table entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnTarget {
    /// An item definition.
    Item(AssetId),
    /// Another spawn table, resolved recursively.
    Table(AssetId),
    /// Any other asset kind (vehicles, animals, ...).
    Other(AssetId),
}

/// A weighted entry in a spawn table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Entry target.
    pub target: SpawnTarget,
    /// Relative weight; zero-weight entries are never drawn.
    pub weight: u32,
}

/// A weighted spawn table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpawnTable {
    /// Entries in declaration order.
    pub entries: Vec<SpawnEntry>,
}

impl SpawnTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry and returns the table (builder style).
    #[must_use]
    pub fn with(mut self, target: SpawnTarget, weight: u32) -> Self {
        self.entries.push(SpawnEntry { target, weight });
        self
    }

    /// Sum of all entry weights.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.weight)).sum()
    }

    /// Picks the entry whose cumulative weight range contains `roll`.
    ///
    /// `roll` must be in `[0, total_weight())`.
    #[must_use]
    pub fn pick(&self, roll: u64) -> Option<SpawnTarget> {
        let mut acc = 0u64;
        for entry in &self.entries {
            acc += u64::from(entry.weight);
            if roll < acc {
                return Some(entry.target);
            }
        }
        None
    }
}

/// All assets known to the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    placeables: BTreeMap<AssetId, PlaceableDef>,
    items: BTreeMap<AssetId, ItemDef>,
    tables: BTreeMap<AssetId, SpawnTable>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a placeable definition, replacing any with the same id.
    pub fn add_placeable(&mut self, def: PlaceableDef) {
        self.placeables.insert(def.id, def);
    }

    /// Registers an item definition, replacing any with the same id.
    pub fn add_item(&mut self, def: ItemDef) {
        self.items.insert(def.id, def);
    }

    /// Registers a spawn table under `id`.
    pub fn add_table(&mut self, id: AssetId, table: SpawnTable) {
        self.tables.insert(id, table);
    }

    /// Looks up a placeable definition.
    #[must_use]
    pub fn placeable(&self, id: AssetId) -> Option<&PlaceableDef> {
        self.placeables.get(&id)
    }

    /// Looks up an item definition.
    #[must_use]
    pub fn item(&self, id: AssetId) -> Option<&ItemDef> {
        self.items.get(&id)
    }

    /// Looks up a spawn table.
    #[must_use]
    pub fn table(&self, id: AssetId) -> Option<&SpawnTable> {
        self.tables.get(&id)
    }
}
