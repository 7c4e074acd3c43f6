//! Spatial placement seam.
//!
//! [`PlacementHost`] is the set of world calls the lifecycle needs to put a
//! crate into the world and take it out again. [`SpatialPlacement`] wraps a
//! host for the duration of one transition and turns every host answer into
//! a `Result` in the crate error taxonomy. It holds no state of its own:
//! each call passes straight through, and any of them may fail.

use glam::Vec3;
use lockbox_world::{
    AssetId, ContainerHandle, EntityHandle, HostError, PlaceableDef, RegionCoord, RegionRef,
};
use tracing::warn;

use crate::config::SpawnPoint;
use crate::error::CrateError;

/// Host calls for placing and removing entities.
pub trait PlacementHost {
    /// Region containing `position`, or `None` if it is not addressable.
    fn region_of(&self, position: Vec3) -> Option<RegionCoord>;

    /// Placeable definition registered under `id`.
    fn find_placeable(&self, id: AssetId) -> Option<PlaceableDef>;

    /// Materializes `def` at `position`.
    ///
    /// # Errors
    ///
    /// Returns the host's refusal reason.
    fn place(&mut self, def: &PlaceableDef, position: Vec3) -> Result<EntityHandle, HostError>;

    /// Primary storage of an entity.
    fn container_of(&self, entity: EntityHandle) -> Option<ContainerHandle>;

    /// True if `container` is the entity's storage or one of its child storages.
    fn owns_container(&self, entity: EntityHandle, container: ContainerHandle) -> bool;

    /// Region slot of an entity.
    fn locate_region(&self, entity: EntityHandle) -> Option<RegionRef>;

    /// Destroys an entity. Returns false if `region` does not point at it.
    fn destroy(&mut self, entity: EntityHandle, region: RegionRef) -> bool;
}

/// A freshly placed crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedCrate {
    /// The entity.
    pub entity: EntityHandle,
    /// Its storage container.
    pub container: ContainerHandle,
}

/// Pass-through placement adapter over a borrowed host.
#[derive(Debug)]
pub struct SpatialPlacement<'h, H: PlacementHost> {
    host: &'h mut H,
}

impl<'h, H: PlacementHost> SpatialPlacement<'h, H> {
    /// Wraps `host` for the duration of one transition.
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }

    /// Checks that a spawn point lies in an addressable region.
    ///
    /// # Errors
    ///
    /// Returns [`CrateError::OutOfBounds`] otherwise.
    pub fn validate(&self, point: &SpawnPoint) -> Result<RegionCoord, CrateError> {
        self.host
            .region_of(point.position)
            .ok_or_else(|| CrateError::OutOfBounds {
                name: point.name.clone(),
                position: point.position,
            })
    }

    /// Resolves the configured crate type to a placeable with storage.
    ///
    /// # Errors
    ///
    /// Returns [`CrateError::InvalidConfig`] if the asset is missing or is
    /// not a storage placeable.
    pub fn resolve_definition(&self, id: AssetId) -> Result<PlaceableDef, CrateError> {
        let def = self
            .host
            .find_placeable(id)
            .ok_or_else(|| CrateError::InvalidConfig(format!("crate id {id} not found")))?;
        if !def.has_storage() {
            return Err(CrateError::InvalidConfig(format!(
                "crate id {id} ('{}') is not a storage placeable",
                def.name
            )));
        }
        Ok(def)
    }

    /// Places the crate and fetches its storage.
    ///
    /// If the host places the entity but exposes no storage for it, the
    /// entity is removed again (best effort) and the placement fails.
    ///
    /// # Errors
    ///
    /// Returns [`CrateError::PlacementFailed`] if the host refuses, or
    /// [`CrateError::MissingContainer`] if no storage appears.
    pub fn place(&mut self, def: &PlaceableDef, position: Vec3) -> Result<PlacedCrate, CrateError> {
        let entity = self
            .host
            .place(def, position)
            .map_err(|source| CrateError::PlacementFailed {
                asset: def.id,
                source,
            })?;
        match self.host.container_of(entity) {
            Some(container) => Ok(PlacedCrate { entity, container }),
            None => {
                if self.destroy(entity).is_err() {
                    warn!(%entity, "storage-less entity left in world");
                }
                Err(CrateError::MissingContainer(entity))
            }
        }
    }

    /// Returns true if an interaction with `container` targets `entity`.
    #[must_use]
    pub fn targets(&self, entity: EntityHandle, container: ContainerHandle) -> bool {
        self.host.owns_container(entity, container)
    }

    /// Looks up the region slot of an entity.
    ///
    /// # Errors
    ///
    /// Returns [`CrateError::RegionLookupFailed`] if the host cannot find it.
    pub fn locate_region(&self, entity: EntityHandle) -> Result<RegionRef, CrateError> {
        self.host
            .locate_region(entity)
            .ok_or(CrateError::RegionLookupFailed(entity))
    }

    /// Locates and destroys an entity.
    ///
    /// # Errors
    ///
    /// Returns [`CrateError::RegionLookupFailed`] if it cannot be located, or
    /// if the host rejects the region it reported.
    pub fn destroy(&mut self, entity: EntityHandle) -> Result<RegionRef, CrateError> {
        let region = self.locate_region(entity)?;
        if self.host.destroy(entity, region) {
            Ok(region)
        } else {
            Err(CrateError::RegionLookupFailed(entity))
        }
    }
}
