//! Host seam implementations for [`SandboxWorld`].

use glam::Vec3;
use lockbox_world::{
    AssetId, ContainerHandle, EntityHandle, HostError, ItemDef, PlaceableDef, RegionCoord,
    RegionRef, SandboxWorld, TableDraw,
};

use crate::host::Broadcaster;
use crate::loot::{LootDraw, LootHost};
use crate::placement::PlacementHost;

impl PlacementHost for SandboxWorld {
    fn region_of(&self, position: Vec3) -> Option<RegionCoord> {
        SandboxWorld::region_of(self, position)
    }

    fn find_placeable(&self, id: AssetId) -> Option<PlaceableDef> {
        self.catalog().placeable(id).cloned()
    }

    fn place(&mut self, def: &PlaceableDef, position: Vec3) -> Result<EntityHandle, HostError> {
        SandboxWorld::place(self, def, position)
    }

    fn container_of(&self, entity: EntityHandle) -> Option<ContainerHandle> {
        SandboxWorld::container_of(self, entity)
    }

    fn owns_container(&self, entity: EntityHandle, container: ContainerHandle) -> bool {
        SandboxWorld::owns_container(self, entity, container)
    }

    fn locate_region(&self, entity: EntityHandle) -> Option<RegionRef> {
        self.locate(entity)
    }

    fn destroy(&mut self, entity: EntityHandle, region: RegionRef) -> bool {
        SandboxWorld::destroy(self, entity, region)
    }
}

impl LootHost for SandboxWorld {
    fn has_loot_table(&self, table: AssetId) -> bool {
        self.catalog().table(table).is_some()
    }

    fn resolve_loot(&mut self, table: AssetId) -> Result<LootDraw, HostError> {
        Ok(match self.resolve_table(table)? {
            TableDraw::Item(item) => LootDraw::Item(item),
            TableDraw::Other(asset) => LootDraw::NotAnItem(asset),
        })
    }

    fn try_add_item(&mut self, container: ContainerHandle, item: &ItemDef) -> bool {
        SandboxWorld::try_add_item(self, container, item)
    }

    fn item_count(&self, container: ContainerHandle) -> usize {
        SandboxWorld::item_count(self, container)
    }
}

impl Broadcaster for SandboxWorld {
    fn broadcast(&mut self, origin: Vec3, radius: f32, message: &str) {
        SandboxWorld::broadcast(self, origin, radius, message);
    }
}
