//! The full host seam the controller is generic over.

use glam::Vec3;

pub use crate::loot::{LootDraw, LootHost};
pub use crate::placement::PlacementHost;

/// Area message delivery.
pub trait Broadcaster {
    /// Delivers `message` to every connected player within `radius` of `origin`.
    fn broadcast(&mut self, origin: Vec3, radius: f32, message: &str);
}

/// Everything the lifecycle controller needs from its host.
pub trait CrateHost: PlacementHost + LootHost + Broadcaster {}

impl<T: PlacementHost + LootHost + Broadcaster> CrateHost for T {}
