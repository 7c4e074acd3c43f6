//! The sandbox world: an in-memory host.
//!
//! `SandboxWorld` owns everything a real game server would own on behalf of
//! the crate lifecycle: the asset catalog, placed entities and their
//! storages, the region bookkeeping needed to destroy an entity, connected
//! players, and a log of every area broadcast.
//!
//! # Region slots
//!
//! Each region keeps an ordered list of the entities placed inside it. An
//! entity's [`RegionRef`] is its region plus its index in that list, and
//! destroying an entity requires a matching reference. Removing an entity
//! shifts the indices of later entities in the same region, so a reference
//! must be looked up right before it is used.
//!
//! # Determinism
//!
//! Spawn table draws use a `ChaCha8Rng` seeded at construction, so the same
//! seed and the same sequence of calls produce the same loot.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use lockbox_world::{AssetId, Bounds, Catalog, ItemDef, SandboxWorld, SpawnTable, SpawnTarget, TableDraw};
//!
//! let mut catalog = Catalog::new();
//! catalog.add_item(ItemDef::new(AssetId::new(15), "Bandage", 1));
//! catalog.add_table(AssetId::new(1), SpawnTable::new().with(SpawnTarget::Item(AssetId::new(15)), 1));
//!
//! let mut world = SandboxWorld::new(Bounds::new(512.0, 64.0, 512.0), 64.0, 3).with_catalog(catalog);
//! let draw = world.resolve_table(AssetId::new(1)).unwrap();
//! assert!(matches!(draw, TableDraw::Item(ref item) if item.name == "Bandage"));
//! ```

use std::collections::BTreeMap;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::asset::{AssetId, Catalog, ItemDef, PlaceableDef, SpawnTarget};
use crate::entity::{ContainerHandle, EntityHandle, PlayerId, Storage};
use crate::error::HostError;
use crate::region::{RegionCoord, RegionGrid, RegionRef};
use crate::Bounds;

/// Maximum nesting depth followed when a table points at another table.
pub const MAX_TABLE_DEPTH: usize = 8;

// =============================================================================
// Supporting types
// =============================================================================

/// Result of one spawn table draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableDraw {
    /// The draw produced an item definition.
    Item(ItemDef),
    /// The draw produced something that is not a known item.
    Other(AssetId),
}

/// One area broadcast, as delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    /// Center of the broadcast area.
    pub origin: Vec3,
    /// Radius of the broadcast area.
    pub radius: f32,
    /// Message text.
    pub message: String,
    /// Players inside the radius at delivery time, sorted by id.
    pub recipients: Vec<PlayerId>,
}

/// Fault switches for exercising host failure paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faults {
    /// `place` refuses every request.
    pub refuse_placement: bool,
    /// `resolve_table` fails every draw.
    pub fail_resolution: bool,
    /// `locate` cannot find any entity.
    pub lose_entities: bool,
}

#[derive(Debug, Clone)]
struct Placed {
    asset: AssetId,
    position: Vec3,
    region: RegionCoord,
    containers: Vec<ContainerHandle>,
}

// =============================================================================
// SandboxWorld
// =============================================================================

/// In-memory host world.
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    grid: RegionGrid,
    catalog: Catalog,
    next_entity: u64,
    next_container: u64,
    entities: BTreeMap<EntityHandle, Placed>,
    regions: BTreeMap<RegionCoord, Vec<EntityHandle>>,
    containers: BTreeMap<ContainerHandle, Storage>,
    players: BTreeMap<PlayerId, Vec3>,
    broadcasts: Vec<Broadcast>,
    faults: Faults,
    rng: ChaCha8Rng,
    seed: u64,
}

impl SandboxWorld {
    /// Creates an empty world over `bounds`, partitioned into regions of
    /// `region_size` units, with loot draws seeded by `seed`.
    #[must_use]
    pub fn new(bounds: Bounds, region_size: f32, seed: u64) -> Self {
        Self {
            grid: RegionGrid::new(bounds, region_size),
            catalog: Catalog::new(),
            next_entity: 1,
            next_container: 1,
            entities: BTreeMap::new(),
            regions: BTreeMap::new(),
            containers: BTreeMap::new(),
            players: BTreeMap::new(),
            broadcasts: Vec::new(),
            faults: Faults::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Replaces the catalog (builder style).
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Seed the loot RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Asset catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Mutable asset catalog.
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Mutable fault switches.
    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.faults
    }

    // -------------------------------------------------------------------------
    // Placement
    // -------------------------------------------------------------------------

    /// Maps a position to its region.
    #[must_use]
    pub fn region_of(&self, position: Vec3) -> Option<RegionCoord> {
        self.grid.coordinate(position)
    }

    /// Places `def` at `position`, creating its storage if it has one.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::PlacementRefused`] when the refusal fault is set
    /// and [`HostError::OutsideRegions`] when the position is not addressable.
    pub fn place(&mut self, def: &PlaceableDef, position: Vec3) -> Result<EntityHandle, HostError> {
        if self.faults.refuse_placement {
            return Err(HostError::PlacementRefused(def.id));
        }
        let region = self
            .grid
            .coordinate(position)
            .ok_or(HostError::OutsideRegions)?;

        let handle = EntityHandle::new(self.next_entity);
        self.next_entity += 1;

        let mut containers = Vec::new();
        if let Some(slots) = def.storage_slots {
            containers.push(self.new_container(handle, slots));
        }

        self.entities.insert(
            handle,
            Placed {
                asset: def.id,
                position,
                region,
                containers,
            },
        );
        self.regions.entry(region).or_default().push(handle);
        debug!(%handle, asset = %def.id, %region, "placed entity");
        Ok(handle)
    }

    /// Adds a child storage of `slots` slots to an existing entity.
    pub fn attach_storage(&mut self, entity: EntityHandle, slots: u32) -> Option<ContainerHandle> {
        if !self.entities.contains_key(&entity) {
            return None;
        }
        let container = self.new_container(entity, slots);
        self.entities.get_mut(&entity)?.containers.push(container);
        Some(container)
    }

    fn new_container(&mut self, owner: EntityHandle, slots: u32) -> ContainerHandle {
        let container = ContainerHandle::new(self.next_container);
        self.next_container += 1;
        self.containers.insert(container, Storage::new(owner, slots));
        container
    }

    /// Primary storage of an entity.
    #[must_use]
    pub fn container_of(&self, entity: EntityHandle) -> Option<ContainerHandle> {
        self.entities.get(&entity)?.containers.first().copied()
    }

    /// Returns true if `container` belongs to `entity` (primary or child).
    #[must_use]
    pub fn owns_container(&self, entity: EntityHandle, container: ContainerHandle) -> bool {
        self.containers
            .get(&container)
            .is_some_and(|storage| storage.owner() == entity)
    }

    /// Looks up the region slot of an entity.
    #[must_use]
    pub fn locate(&self, entity: EntityHandle) -> Option<RegionRef> {
        if self.faults.lose_entities {
            return None;
        }
        let placed = self.entities.get(&entity)?;
        let index = self
            .regions
            .get(&placed.region)?
            .iter()
            .position(|h| *h == entity)?;
        Some(RegionRef {
            coord: placed.region,
            index,
        })
    }

    /// Destroys an entity and its storages.
    ///
    /// Returns false if `region` does not point at `entity`.
    pub fn destroy(&mut self, entity: EntityHandle, region: RegionRef) -> bool {
        let matches = self
            .regions
            .get(&region.coord)
            .and_then(|slots| slots.get(region.index))
            .is_some_and(|h| *h == entity);
        if !matches {
            return false;
        }
        if let Some(slots) = self.regions.get_mut(&region.coord) {
            slots.remove(region.index);
        }
        if let Some(placed) = self.entities.remove(&entity) {
            for container in placed.containers {
                self.containers.remove(&container);
            }
        }
        debug!(%entity, %region, "destroyed entity");
        true
    }

    /// Returns true if the entity is still placed.
    #[must_use]
    pub fn contains(&self, entity: EntityHandle) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Number of placed entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Position of a placed entity.
    #[must_use]
    pub fn position_of(&self, entity: EntityHandle) -> Option<Vec3> {
        self.entities.get(&entity).map(|p| p.position)
    }

    /// Asset a placed entity was created from.
    #[must_use]
    pub fn asset_of(&self, entity: EntityHandle) -> Option<AssetId> {
        self.entities.get(&entity).map(|p| p.asset)
    }

    // -------------------------------------------------------------------------
    // Loot
    // -------------------------------------------------------------------------

    /// Draws one result from spawn table `table`, following nested tables.
    ///
    /// # Errors
    ///
    /// Fails when the table is unknown, has no weight, nests too deeply, or
    /// the resolution fault is set.
    pub fn resolve_table(&mut self, table: AssetId) -> Result<TableDraw, HostError> {
        if self.faults.fail_resolution {
            return Err(HostError::Resolution(format!("table {table} unavailable")));
        }
        let mut current = table;
        for _ in 0..MAX_TABLE_DEPTH {
            let spawn = self
                .catalog
                .table(current)
                .ok_or(HostError::UnknownTable(current))?;
            let total = spawn.total_weight();
            if total == 0 {
                return Err(HostError::EmptyTable(current));
            }
            let roll = self.rng.gen_range(0..total);
            match spawn.pick(roll) {
                Some(SpawnTarget::Table(next)) => current = next,
                Some(SpawnTarget::Item(id)) => {
                    trace!(%table, item = %id, "table draw");
                    return Ok(match self.catalog.item(id) {
                        Some(item) => TableDraw::Item(item.clone()),
                        None => TableDraw::Other(id),
                    });
                }
                Some(SpawnTarget::Other(id)) => return Ok(TableDraw::Other(id)),
                None => return Err(HostError::EmptyTable(current)),
            }
        }
        Err(HostError::TableTooDeep(table, MAX_TABLE_DEPTH))
    }

    /// Inserts one instance of `item` into `container`.
    pub fn try_add_item(&mut self, container: ContainerHandle, item: &ItemDef) -> bool {
        self.containers
            .get_mut(&container)
            .is_some_and(|storage| storage.try_add(item))
    }

    /// Storage behind a container handle.
    #[must_use]
    pub fn storage(&self, container: ContainerHandle) -> Option<&Storage> {
        self.containers.get(&container)
    }

    /// Number of items in a container (zero for unknown containers).
    #[must_use]
    pub fn item_count(&self, container: ContainerHandle) -> usize {
        self.containers.get(&container).map_or(0, Storage::len)
    }

    // -------------------------------------------------------------------------
    // Players and broadcasts
    // -------------------------------------------------------------------------

    /// Connects (or moves) a player.
    pub fn connect_player(&mut self, player: PlayerId, position: Vec3) {
        self.players.insert(player, position);
    }

    /// Disconnects a player. Returns false if they were not connected.
    pub fn disconnect_player(&mut self, player: PlayerId) -> bool {
        self.players.remove(&player).is_some()
    }

    /// Number of connected players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Delivers `message` to every connected player within `radius` of `origin`.
    pub fn broadcast(&mut self, origin: Vec3, radius: f32, message: &str) {
        let radius_sq = radius * radius;
        let recipients: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(_, pos)| origin.distance_squared(**pos) <= radius_sq)
            .map(|(id, _)| *id)
            .collect();
        self.broadcasts.push(Broadcast {
            origin,
            radius,
            message: message.to_string(),
            recipients,
        });
    }

    /// Every broadcast delivered so far, oldest first.
    #[must_use]
    pub fn broadcasts(&self) -> &[Broadcast] {
        &self.broadcasts
    }

    /// Drains the broadcast log.
    pub fn take_broadcasts(&mut self) -> Vec<Broadcast> {
        std::mem::take(&mut self.broadcasts)
    }
}
