//! Error taxonomy for the crate lifecycle.
//!
//! No controller entry point returns these to its caller. They are logged,
//! recorded in the event outbox, and the controller carries on in a
//! consistent state.

use std::path::PathBuf;

use glam::Vec3;
use lockbox_world::{AssetId, EntityHandle, HostError};
use thiserror::Error;

/// Failures of a lifecycle transition or of one loot draw.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrateError {
    /// The crate type or loot table cannot be resolved, or the spawn list is empty.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The host refused to materialize the crate.
    #[error("placement of asset {asset} failed: {source}")]
    PlacementFailed {
        /// Asset that was being placed.
        asset: AssetId,
        /// Host refusal reason.
        #[source]
        source: HostError,
    },
    /// The live crate could not be found in any region at despawn time.
    #[error("could not locate {0} in any region")]
    RegionLookupFailed(EntityHandle),
    /// One loot table draw failed.
    #[error("loot resolution attempt {attempt} failed: {source}")]
    ResolutionFailure {
        /// 1-based attempt number.
        attempt: u32,
        /// Host failure reason.
        #[source]
        source: HostError,
    },
    /// The chosen spawn coordinate is outside the world.
    #[error("spawn point '{name}' at {position} is outside the world")]
    OutOfBounds {
        /// Spawn point display name.
        name: String,
        /// Rejected coordinate.
        position: Vec3,
    },
    /// The placed entity exposes no storage container.
    #[error("{0} has no storage container")]
    MissingContainer(EntityHandle),
}

impl CrateError {
    /// Short stable name of the error kind, used as a log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "invalid_config",
            Self::PlacementFailed { .. } => "placement_failed",
            Self::RegionLookupFailed(_) => "region_lookup_failed",
            Self::ResolutionFailure { .. } => "resolution_failure",
            Self::OutOfBounds { .. } => "out_of_bounds",
            Self::MissingContainer(_) => "missing_container",
        }
    }
}

/// Failures loading or validating the configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid JSON for [`CrateConfig`](crate::config::CrateConfig).
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration parsed but its values are unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
