//! # Lockbox World
//!
//! In-memory host world for the Lockbox crate lifecycle.
//!
//! The lifecycle core never owns physical state: placement, storage, loot
//! tables and player delivery all belong to a host. This crate provides a
//! complete host that lives entirely in memory so the core can be driven by
//! tests, benchmarks and the sandbox simulator:
//!
//! - **Bounds and regions**: the world volume and the grid of addressable regions
//! - **Assets**: placeable definitions, item definitions and weighted spawn tables
//! - **Entities**: placed barricades with their storage containers
//! - **Players**: connected players and area broadcast delivery
//! - **Faults**: switches that make the host refuse or lose things on demand
//!
//! ## Quick Start
//!
//! ```
//! use glam::Vec3;
//! use lockbox_world::{AssetId, Bounds, Catalog, PlaceableDef, SandboxWorld};
//!
//! let mut catalog = Catalog::new();
//! catalog.add_placeable(PlaceableDef::storage(AssetId::new(366), "Supply Crate", 24));
//!
//! let mut world = SandboxWorld::new(Bounds::new(1024.0, 256.0, 1024.0), 128.0, 7)
//!     .with_catalog(catalog);
//!
//! let def = world.catalog().placeable(AssetId::new(366)).cloned().unwrap();
//! let entity = world.place(&def, Vec3::new(10.0, 0.0, 10.0)).unwrap();
//! assert!(world.container_of(entity).is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod entity;
pub mod error;
pub mod region;
pub mod world;

// Re-exports for convenience
pub use asset::{AssetId, Catalog, ItemDef, PlaceableDef, SpawnEntry, SpawnTable, SpawnTarget};
pub use entity::{ContainerHandle, EntityHandle, PlayerId, Storage};
pub use error::HostError;
pub use region::{RegionCoord, RegionGrid, RegionRef};
pub use world::{Broadcast, Faults, SandboxWorld, TableDraw};

/// Axis-aligned bounding box of the world volume.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// Minimum corner
    pub min: glam::Vec3,
    /// Maximum corner
    pub max: glam::Vec3,
}

impl Bounds {
    /// Create bounds from dimensions (centered at origin).
    #[must_use]
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            min: glam::Vec3::new(-width / 2.0, -height / 2.0, -depth / 2.0),
            max: glam::Vec3::new(width / 2.0, height / 2.0, depth / 2.0),
        }
    }

    /// Get the size of the bounds.
    #[must_use]
    pub fn size(&self) -> glam::Vec3 {
        self.max - self.min
    }

    /// Check if a point is inside the bounds.
    ///
    /// Non-finite points are never inside.
    #[must_use]
    pub fn contains(&self, point: glam::Vec3) -> bool {
        point.is_finite()
            && point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}
