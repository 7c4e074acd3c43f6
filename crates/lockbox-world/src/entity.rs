//! Placed entities, storage containers and players.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::asset::ItemDef;

/// Opaque handle to a placed entity.
///
/// Handles are assigned monotonically and never reused within a world.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Creates a handle from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({})", self.0)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// Opaque handle to a storage container.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerHandle(u64);

impl ContainerHandle {
    /// Creates a handle from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContainerHandle({})", self.0)
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container:{}", self.0)
    }
}

/// Identity of a connected player.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u64);

impl PlayerId {
    /// Creates a player id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A slot-budgeted storage container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    owner: EntityHandle,
    capacity: u32,
    used: u32,
    items: Vec<ItemDef>,
}

impl Storage {
    /// Creates an empty storage owned by `owner` with `capacity` slots.
    #[must_use]
    pub fn new(owner: EntityHandle, capacity: u32) -> Self {
        Self {
            owner,
            capacity,
            used: 0,
            items: Vec::new(),
        }
    }

    /// Entity this storage belongs to.
    #[must_use]
    pub fn owner(&self) -> EntityHandle {
        self.owner
    }

    /// Slots still free.
    #[must_use]
    pub fn free_slots(&self) -> u32 {
        self.capacity - self.used
    }

    /// Inserts `item` if it fits. Returns false when there is not enough room.
    pub fn try_add(&mut self, item: &ItemDef) -> bool {
        if item.size > self.free_slots() {
            return false;
        }
        self.used += item.size;
        self.items.push(item.clone());
        true
    }

    /// Items currently stored, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[ItemDef] {
        &self.items
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
