//! Factories for the demo world, catalog and configuration.

use glam::Vec3;
use lockbox_world::{
    AssetId, Bounds, Catalog, ContainerHandle, ItemDef, PlaceableDef, PlayerId, SandboxWorld,
    SpawnTable, SpawnTarget,
};

use crate::config::{CrateConfig, SpawnPoint};
use crate::controller::CrateController;
use crate::error::CrateError;
use crate::event::CrateEvent;

// =============================================================================
// Assets
// =============================================================================

/// Supply crate placeable (24 slots).
pub const CRATE_ID: AssetId = AssetId::new(366);
/// Top-level loot table.
pub const LOOT_TABLE: AssetId = AssetId::new(1);
/// Nested ammunition table.
pub const AMMO_TABLE: AssetId = AssetId::new(2);

/// Catalog with the crate, a handful of items and two loot tables.
///
/// Table 1 draws medical items directly and nests into table 2 for ammo.
pub fn demo_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add_placeable(PlaceableDef::storage(CRATE_ID, "Supply Crate", 24));
    catalog.add_placeable(PlaceableDef::plain(AssetId::new(40), "Wooden Wall"));

    catalog.add_item(ItemDef::new(AssetId::new(15), "Bandage", 1));
    catalog.add_item(ItemDef::new(AssetId::new(95), "Medkit", 2));
    catalog.add_item(ItemDef::new(AssetId::new(254), "Rifle Magazine", 1));
    catalog.add_item(ItemDef::new(AssetId::new(381), "Shotgun Shells", 1));

    catalog.add_table(
        LOOT_TABLE,
        SpawnTable::new()
            .with(SpawnTarget::Item(AssetId::new(15)), 40)
            .with(SpawnTarget::Item(AssetId::new(95)), 20)
            .with(SpawnTarget::Table(AMMO_TABLE), 40),
    );
    catalog.add_table(
        AMMO_TABLE,
        SpawnTable::new()
            .with(SpawnTarget::Item(AssetId::new(254)), 1)
            .with(SpawnTarget::Item(AssetId::new(381)), 1),
    );
    catalog
}

/// 1024 x 256 x 1024 world with 128-unit regions and the demo catalog.
pub fn demo_world(seed: u64) -> SandboxWorld {
    SandboxWorld::new(Bounds::new(1024.0, 256.0, 1024.0), 128.0, seed).with_catalog(demo_catalog())
}

// =============================================================================
// Configuration
// =============================================================================

/// Where [`single_point_config`] puts the crate.
pub const AIRFIELD: Vec3 = Vec3::new(100.0, 0.0, 50.0);

/// Default timings with two spawn points.
pub fn demo_config() -> CrateConfig {
    CrateConfig {
        spawn_points: vec![
            SpawnPoint::new("Airfield", AIRFIELD),
            SpawnPoint::new("Harbor", Vec3::new(-200.0, 0.0, 300.0)),
        ],
        ..CrateConfig::default()
    }
}

/// Default timings with the airfield as the only spawn point.
pub fn single_point_config() -> CrateConfig {
    CrateConfig {
        spawn_points: vec![SpawnPoint::new("Airfield", AIRFIELD)],
        ..CrateConfig::default()
    }
}

// =============================================================================
// Controllers
// =============================================================================

/// A fresh controller over the demo world.
pub fn controller_with(config: CrateConfig, seed: u64) -> CrateController<SandboxWorld> {
    CrateController::new(config, demo_world(seed), seed)
}

/// A controller whose crate has already spawned at the airfield.
///
/// Returns the controller, the player that triggered the spawn, and the
/// crate's container. The event outbox and broadcast log are drained.
pub fn spawned(seed: u64) -> (CrateController<SandboxWorld>, PlayerId, ContainerHandle) {
    let mut controller = controller_with(single_point_config(), seed);
    let player = PlayerId::new(1);
    controller.host_mut().connect_player(player, AIRFIELD);
    controller.player_connected(player);

    let container = controller
        .instance()
        .map(|instance| instance.container)
        .expect("demo crate should spawn");
    controller.take_events();
    controller.host_mut().take_broadcasts();
    (controller, player, container)
}

/// Every failure recorded in `events`.
pub fn failures(events: &[CrateEvent]) -> Vec<&CrateError> {
    events.iter().filter_map(CrateEvent::as_error).collect()
}

/// Broadcast texts delivered so far.
pub fn messages(world: &SandboxWorld) -> Vec<&str> {
    world
        .broadcasts()
        .iter()
        .map(|broadcast| broadcast.message.as_str())
        .collect()
}
