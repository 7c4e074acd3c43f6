//! Crate lifecycle configuration.
//!
//! The configuration is loaded once per process and never mutated by the
//! controller. All delays and radii are configuration, not constants.
//!
//! # Format
//!
//! JSON, every field optional (missing fields take the defaults below):
//!
//! ```json
//! {
//!   "crate_id": 366,
//!   "loot_table": 1,
//!   "item_count_min": 3,
//!   "item_count_max": 6,
//!   "unlock_delay_secs": 15,
//!   "respawn_delay_min_secs": 30,
//!   "respawn_delay_max_secs": 30,
//!   "despawn_delay_secs": 600,
//!   "broadcast_radius": 500.0,
//!   "debug_logging": false,
//!   "spawn_points": [
//!     { "name": "Airfield", "position": [120.0, 4.0, -80.0] }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use lockbox_world::AssetId;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A named candidate location for the crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Display name, used only in messages. Not required to be unique.
    pub name: String,
    /// World coordinate.
    pub position: Vec3,
}

impl SpawnPoint {
    /// Creates a spawn point.
    #[must_use]
    pub fn new(name: &str, position: Vec3) -> Self {
        Self {
            name: name.to_string(),
            position,
        }
    }
}

/// Configuration of the crate lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrateConfig {
    /// Placeable asset used for the crate.
    pub crate_id: AssetId,
    /// Spawn table the crate is filled from.
    pub loot_table: AssetId,
    /// Minimum number of items to add on unlock.
    pub item_count_min: u32,
    /// Maximum number of items to add on unlock.
    pub item_count_max: u32,
    /// Seconds between the first open attempt and the unlock.
    pub unlock_delay_secs: u64,
    /// Lower bound of the respawn delay, in seconds.
    pub respawn_delay_min_secs: u64,
    /// Upper bound of the respawn delay, in seconds.
    pub respawn_delay_max_secs: u64,
    /// Seconds a crate stays in the world before it despawns.
    pub despawn_delay_secs: u64,
    /// Radius of the area broadcasts around the crate.
    pub broadcast_radius: f32,
    /// Emit per-attempt loot and timer records.
    pub debug_logging: bool,
    /// Candidate locations, chosen uniformly at random.
    pub spawn_points: Vec<SpawnPoint>,
}

impl Default for CrateConfig {
    fn default() -> Self {
        Self {
            crate_id: AssetId::new(366),
            loot_table: AssetId::new(1),
            item_count_min: 3,
            item_count_max: 6,
            unlock_delay_secs: 15,
            respawn_delay_min_secs: 30,
            respawn_delay_max_secs: 30,
            despawn_delay_secs: 600,
            broadcast_radius: 500.0,
            debug_logging: false,
            spawn_points: vec![
                SpawnPoint::new("Default A", Vec3::new(1.0, 1.0, 1.0)),
                SpawnPoint::new("Default B", Vec3::new(2.0, 2.0, 2.0)),
            ],
        }
    }
}

impl CrateConfig {
    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid JSON for this type, and
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parses and validates a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// See [`CrateConfig::load`].
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values that would otherwise only fail at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spawn_points.is_empty() {
            return Err(ConfigError::Invalid("no spawn points defined".into()));
        }
        if let Some(point) = self.spawn_points.iter().find(|p| !p.position.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "spawn point '{}' has a non-finite coordinate",
                point.name
            )));
        }
        if self.item_count_min > self.item_count_max {
            return Err(ConfigError::Invalid(format!(
                "item_count_min ({}) exceeds item_count_max ({})",
                self.item_count_min, self.item_count_max
            )));
        }
        if self.respawn_delay_min_secs > self.respawn_delay_max_secs {
            return Err(ConfigError::Invalid(format!(
                "respawn_delay_min_secs ({}) exceeds respawn_delay_max_secs ({})",
                self.respawn_delay_min_secs, self.respawn_delay_max_secs
            )));
        }
        if !self.broadcast_radius.is_finite() || self.broadcast_radius < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "broadcast_radius must be a non-negative number, got {}",
                self.broadcast_radius
            )));
        }
        Ok(())
    }

    /// Unlock countdown length.
    #[must_use]
    pub fn unlock_delay(&self) -> Duration {
        Duration::from_secs(self.unlock_delay_secs)
    }

    /// Despawn countdown length.
    #[must_use]
    pub fn despawn_delay(&self) -> Duration {
        Duration::from_secs(self.despawn_delay_secs)
    }
}
