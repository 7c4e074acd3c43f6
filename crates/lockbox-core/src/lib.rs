//! # Lockbox Core
//!
//! Lifecycle of a single locked supply crate on a multiplayer server.
//!
//! A crate spawns when the first player connects, stays locked until someone
//! tries to open it, unlocks after a countdown, gets filled from a weighted
//! loot table, despawns after a period of neglect and respawns later at a
//! randomly chosen location.
//!
//! ## Architecture
//!
//! - **Timers**: a virtual-clock scheduler with cancellable handles
//!   ([`timer`])
//! - **Loot**: fills a container with a bounded number of draws ([`loot`])
//! - **Placement**: puts the crate into the world and takes it out again
//!   ([`placement`])
//! - **Controller**: the state machine tying the three together
//!   ([`controller`])
//! - **Runtime**: a mailbox that serializes events from other threads onto
//!   the controller's owner ([`runtime`])
//!
//! The controller never touches a concrete server. It is generic over
//! [`CrateHost`], which [`SandboxWorld`](lockbox_world::SandboxWorld)
//! implements for tests and simulation.
//!
//! ## Usage
//!
//! ```
//! use std::time::Duration;
//! use glam::Vec3;
//! use lockbox_core::{CrateConfig, CrateController, CratePhase, SpawnPoint};
//! use lockbox_world::{
//!     AssetId, Bounds, Catalog, ItemDef, PlaceableDef, PlayerId, SandboxWorld, SpawnTable,
//!     SpawnTarget,
//! };
//!
//! let mut catalog = Catalog::new();
//! catalog.add_placeable(PlaceableDef::storage(AssetId::new(366), "Supply Crate", 24));
//! catalog.add_item(ItemDef::new(AssetId::new(15), "Bandage", 1));
//! catalog.add_table(AssetId::new(1), SpawnTable::new().with(SpawnTarget::Item(AssetId::new(15)), 1));
//! let world = SandboxWorld::new(Bounds::new(1024.0, 256.0, 1024.0), 128.0, 9).with_catalog(catalog);
//!
//! let config = CrateConfig {
//!     spawn_points: vec![SpawnPoint::new("Harbor", Vec3::new(40.0, 0.0, -80.0))],
//!     ..CrateConfig::default()
//! };
//! let mut controller = CrateController::new(config, world, 3);
//! let player = PlayerId::new(1);
//!
//! controller.player_connected(player);
//! let container = controller.instance().unwrap().container;
//!
//! assert!(!controller.interaction_requested(player, container));
//! assert_eq!(controller.phase(), CratePhase::Unlocking);
//!
//! controller.advance(Duration::from_secs(15));
//! assert_eq!(controller.phase(), CratePhase::Unlocked);
//! assert!(controller.interaction_requested(player, container));
//! assert!(controller.host().item_count(container) >= 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod host;
pub mod loot;
pub mod placement;
pub mod runtime;
pub mod sandbox;
pub mod timer;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use config::{CrateConfig, SpawnPoint};
pub use controller::{CrateController, CrateInstance, CratePhase, LockState};
pub use error::{ConfigError, CrateError};
pub use event::{CrateEvent, DenyReason, Notice};
pub use host::{Broadcaster, CrateHost};
pub use loot::{FillReport, LootDraw, LootHost, LootResolver};
pub use placement::{PlacedCrate, PlacementHost, SpatialPlacement};
pub use runtime::{CrateRuntime, Inbound, RuntimeHandle};
pub use timer::{TimerHandle, TimerKind, TimerScheduler, TimerSlots, NEVER};
