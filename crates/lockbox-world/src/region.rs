//! Region grid: maps world positions to addressable regions.
//!
//! The world is partitioned on the horizontal (`x`/`z`) plane into square
//! regions of `region_size` units. A position is addressable when it lies
//! inside the world bounds; its region coordinate is the cell it falls into,
//! counted from the minimum corner.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Bounds;

/// Coordinate of a region cell on the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionCoord {
    /// Cell index along `x`.
    pub x: u16,
    /// Cell index along `z`.
    pub z: u16,
}

impl RegionCoord {
    /// Creates a region coordinate.
    #[must_use]
    pub const fn new(x: u16, z: u16) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for RegionCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Location of a placed entity inside the region grid.
///
/// Destroying an entity requires both its region and its slot within that
/// region's entity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionRef {
    /// Region the entity lives in.
    pub coord: RegionCoord,
    /// Slot of the entity inside the region.
    pub index: usize,
}

impl fmt::Display for RegionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.coord, self.index)
    }
}

/// Partition of the world bounds into square regions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionGrid {
    bounds: Bounds,
    region_size: f32,
}

impl RegionGrid {
    /// Creates a grid over `bounds` with cells of `region_size` units.
    ///
    /// A non-positive or non-finite size falls back to a single region
    /// covering the whole world.
    #[must_use]
    pub fn new(bounds: Bounds, region_size: f32) -> Self {
        let size = bounds.size();
        let region_size = if region_size.is_finite() && region_size > 0.0 {
            region_size
        } else {
            size.x.max(size.z).max(1.0)
        };
        Self {
            bounds,
            region_size,
        }
    }

    /// Returns the edge length of one region.
    #[must_use]
    pub fn region_size(&self) -> f32 {
        self.region_size
    }

    /// Maps a position to its region, or `None` if it is outside the world.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn coordinate(&self, position: Vec3) -> Option<RegionCoord> {
        if !self.bounds.contains(position) {
            return None;
        }
        let offset = position - self.bounds.min;
        let x = (offset.x / self.region_size).floor();
        let z = (offset.z / self.region_size).floor();
        if x > f32::from(u16::MAX) || z > f32::from(u16::MAX) {
            return None;
        }
        Some(RegionCoord::new(x as u16, z as u16))
    }
}
