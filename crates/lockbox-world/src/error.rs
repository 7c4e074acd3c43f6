//! Host-side failure reasons.

use thiserror::Error;

use crate::asset::AssetId;
use crate::entity::EntityHandle;

/// Reasons the host refuses or fails a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The position does not map to an addressable region.
    #[error("position is outside every addressable region")]
    OutsideRegions,
    /// The host declined to materialize the entity.
    #[error("host refused to place asset {0}")]
    PlacementRefused(AssetId),
    /// No spawn table is registered under this id.
    #[error("unknown spawn table {0}")]
    UnknownTable(AssetId),
    /// The spawn table has no entries with positive weight.
    #[error("spawn table {0} has no weighted entries")]
    EmptyTable(AssetId),
    /// Nested table resolution exceeded the depth limit.
    #[error("spawn table {0} nests deeper than {1} levels")]
    TableTooDeep(AssetId, usize),
    /// Resolution failed inside the host (injected fault).
    #[error("table resolution failed: {0}")]
    Resolution(String),
    /// The entity is not (or no longer) known to the host.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityHandle),
}
