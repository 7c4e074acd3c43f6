//! The demo map: world volume, catalog and loot tables.

use lockbox_world::{
    AssetId, Bounds, Catalog, ItemDef, PlaceableDef, SandboxWorld, SpawnTable, SpawnTarget,
};

/// Edge length of the square demo map.
pub const MAP_SIZE: f32 = 1024.0;
/// Edge length of one region.
pub const REGION_SIZE: f32 = 128.0;

const MEDICAL: AssetId = AssetId::new(2);
const AMMO: AssetId = AssetId::new(3);

/// Builds the demo world. `seed` drives loot draws.
pub fn world(seed: u64) -> SandboxWorld {
    SandboxWorld::new(Bounds::new(MAP_SIZE, 256.0, MAP_SIZE), REGION_SIZE, seed)
        .with_catalog(catalog())
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add_placeable(PlaceableDef::storage(AssetId::new(366), "Supply Crate", 24));
    catalog.add_placeable(PlaceableDef::storage(AssetId::new(328), "Locker", 32));
    catalog.add_placeable(PlaceableDef::plain(AssetId::new(40), "Wooden Wall"));

    for (id, name, size) in [
        (15, "Bandage", 1),
        (95, "Medkit", 2),
        (394, "Dressing", 1),
        (254, "Rifle Magazine", 1),
        (381, "Shotgun Shells", 1),
        (17, "Military Drum", 3),
        (363, "Maplestrike", 6),
    ] {
        catalog.add_item(ItemDef::new(AssetId::new(id), name, size));
    }

    catalog.add_table(
        AssetId::new(1),
        SpawnTable::new()
            .with(SpawnTarget::Table(MEDICAL), 45)
            .with(SpawnTarget::Table(AMMO), 45)
            .with(SpawnTarget::Item(AssetId::new(363)), 8)
            // A vehicle id: not an item, the fill skips it.
            .with(SpawnTarget::Other(AssetId::new(120)), 2),
    );
    catalog.add_table(
        MEDICAL,
        SpawnTable::new()
            .with(SpawnTarget::Item(AssetId::new(15)), 5)
            .with(SpawnTarget::Item(AssetId::new(95)), 2)
            .with(SpawnTarget::Item(AssetId::new(394)), 3),
    );
    catalog.add_table(
        AMMO,
        SpawnTable::new()
            .with(SpawnTarget::Item(AssetId::new(254)), 4)
            .with(SpawnTarget::Item(AssetId::new(381)), 4)
            .with(SpawnTarget::Item(AssetId::new(17)), 1),
    );
    catalog
}
