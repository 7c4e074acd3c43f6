//! The crate lifecycle state machine.
//!
//! `CrateController` owns the single live crate (if any), the three
//! countdowns and every transition between them:
//!
//! ```text
//!  Unspawned ──spawn──▶ Locked ──open attempt──▶ Unlocking ──unlock──▶ Unlocked
//!      ▲                  │                                              │
//!      └──respawn◀── despawn ◀───────────────────────────────────────────┘
//! ```
//!
//! - A despawn countdown runs while `Locked` (armed at spawn) and while
//!   `Unlocked` (re-armed after the fill).
//! - An unlock countdown runs only while `Unlocking`. Starting it always
//!   cancels the pending despawn countdown first.
//! - A respawn countdown runs while `Unspawned` after a despawn.
//!
//! # Serialization
//!
//! Every entry point takes `&mut self`, and timers only fire from inside
//! [`CrateController::advance`], so host events and timer callbacks can never
//! interleave. Hosts that receive events on several threads funnel them
//! through [`CrateRuntime`](crate::runtime::CrateRuntime).
//!
//! # Failure handling
//!
//! No entry point returns an error. A failed transition is logged, recorded
//! as [`CrateEvent::Failed`], and leaves the controller in a state from which
//! the next trigger can proceed.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use glam::Vec3;
//! use lockbox_core::config::{CrateConfig, SpawnPoint};
//! use lockbox_core::controller::{CrateController, CratePhase};
//! use lockbox_world::{AssetId, Bounds, Catalog, PlaceableDef, PlayerId, SandboxWorld};
//!
//! let mut catalog = Catalog::new();
//! catalog.add_placeable(PlaceableDef::storage(AssetId::new(366), "Supply Crate", 24));
//! let world = SandboxWorld::new(Bounds::new(1024.0, 256.0, 1024.0), 128.0, 1).with_catalog(catalog);
//!
//! let config = CrateConfig {
//!     spawn_points: vec![SpawnPoint::new("Airfield", Vec3::new(100.0, 0.0, 50.0))],
//!     ..CrateConfig::default()
//! };
//! let mut controller = CrateController::new(config, world, 42);
//!
//! controller.player_connected(PlayerId::new(1));
//! assert_eq!(controller.phase(), CratePhase::Locked);
//!
//! controller.advance(Duration::from_secs(600));
//! assert_eq!(controller.phase(), CratePhase::Unspawned);
//! ```

use std::fmt;
use std::time::Duration;

use glam::Vec3;
use lockbox_world::{ContainerHandle, EntityHandle, PlayerId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::CrateConfig;
use crate::error::CrateError;
use crate::event::{CrateEvent, DenyReason, Notice};
use crate::host::CrateHost;
use crate::loot::LootResolver;
use crate::placement::SpatialPlacement;
use crate::timer::{FiredTimer, TimerKind, TimerScheduler, TimerSlots};

// =============================================================================
// State
// =============================================================================

/// Lock state of a live crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockState {
    /// Interaction blocked, no countdown running.
    Locked,
    /// Interaction blocked, unlock countdown running.
    Unlocking,
    /// Interaction allowed, contents filled.
    Unlocked,
}

/// Overall lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CratePhase {
    /// No crate is live.
    Unspawned,
    /// A crate is live and locked.
    Locked,
    /// A crate is live and counting down to unlock.
    Unlocking,
    /// A crate is live and open.
    Unlocked,
}

impl From<LockState> for CratePhase {
    fn from(lock: LockState) -> Self {
        match lock {
            LockState::Locked => Self::Locked,
            LockState::Unlocking => Self::Unlocking,
            LockState::Unlocked => Self::Unlocked,
        }
    }
}

impl fmt::Display for CratePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspawned => write!(f, "Unspawned"),
            Self::Locked => write!(f, "Locked"),
            Self::Unlocking => write!(f, "Unlocking"),
            Self::Unlocked => write!(f, "Unlocked"),
        }
    }
}

/// The currently live crate.
#[derive(Debug, Clone, PartialEq)]
pub struct CrateInstance {
    /// Placed entity.
    pub entity: EntityHandle,
    /// Its storage.
    pub container: ContainerHandle,
    /// World position.
    pub position: Vec3,
    /// Display name of the spawn point used.
    pub point: String,
    /// Lock state.
    pub lock: LockState,
}

// =============================================================================
// CrateController
// =============================================================================

/// Owner of the crate lifecycle.
///
/// Generic over the host so the same state machine runs against a real
/// server or against [`SandboxWorld`](lockbox_world::SandboxWorld).
pub struct CrateController<H: CrateHost> {
    config: CrateConfig,
    host: H,
    scheduler: TimerScheduler,
    timers: TimerSlots,
    loot: LootResolver,
    rng: ChaCha8Rng,
    seed: u64,
    live: Option<CrateInstance>,
    events: Vec<CrateEvent>,
    shut_down: bool,
}

impl<H: CrateHost> fmt::Debug for CrateController<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrateController")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler)
            .field("timers", &self.timers)
            .field("seed", &self.seed)
            .field("live", &self.live)
            .field("events", &format!("[{} events]", self.events.len()))
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}

impl<H: CrateHost> CrateController<H> {
    /// Creates a controller with no live crate.
    ///
    /// `seed` drives spawn point choice, loot counts and respawn delays.
    #[must_use]
    pub fn new(config: CrateConfig, host: H, seed: u64) -> Self {
        let loot = LootResolver::new(config.debug_logging);
        info!(
            crate_id = %config.crate_id,
            loot_table = %config.loot_table,
            spawn_points = config.spawn_points.len(),
            "crate controller ready, waiting for first player"
        );
        Self {
            config,
            host,
            scheduler: TimerScheduler::new(),
            timers: TimerSlots::new(),
            loot,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            live: None,
            events: Vec::new(),
            shut_down: false,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &CrateConfig {
        &self.config
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access (for the host's own bookkeeping).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Seed the controller RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> CratePhase {
        self.live
            .as_ref()
            .map_or(CratePhase::Unspawned, |instance| instance.lock.into())
    }

    /// The live crate, if any.
    #[must_use]
    pub fn instance(&self) -> Option<&CrateInstance> {
        self.live.as_ref()
    }

    /// Virtual time since the controller was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// The scheduler, for inspection.
    #[must_use]
    pub fn scheduler(&self) -> &TimerScheduler {
        &self.scheduler
    }

    /// True if a countdown of `kind` is pending.
    #[must_use]
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.timers
            .get(kind)
            .is_some_and(|handle| self.scheduler.is_pending(handle))
    }

    /// Time left on the pending countdown of `kind`.
    #[must_use]
    pub fn remaining(&self, kind: TimerKind) -> Option<Duration> {
        self.timers
            .get(kind)
            .and_then(|handle| self.scheduler.remaining(handle))
    }

    /// Time until the next countdown fires, if any is pending.
    #[must_use]
    pub fn time_until_next(&self) -> Option<Duration> {
        let now = self.scheduler.now();
        self.scheduler
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(now))
    }

    /// True once [`CrateController::shutdown`] ran.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Events recorded since the last drain.
    #[must_use]
    pub fn events(&self) -> &[CrateEvent] {
        &self.events
    }

    /// Drains the event outbox.
    pub fn take_events(&mut self) -> Vec<CrateEvent> {
        std::mem::take(&mut self.events)
    }

    // -------------------------------------------------------------------------
    // Inbound events
    // -------------------------------------------------------------------------

    /// Handles a player connecting.
    ///
    /// Spawns a crate if none is live and no respawn countdown is running.
    pub fn player_connected(&mut self, player: PlayerId) {
        if self.shut_down {
            return;
        }
        if self.live.is_some() || self.is_pending(TimerKind::Respawn) {
            debug!(%player, phase = %self.phase(), "player connected, nothing to spawn");
            return;
        }
        info!(%player, "player connected with no crate live, spawning crate");
        self.spawn();
    }

    /// Handles a request to open `container`.
    ///
    /// Returns whether the interaction may proceed. Requests that do not
    /// target the live crate are always allowed.
    pub fn interaction_requested(&mut self, player: PlayerId, container: ContainerHandle) -> bool {
        if self.shut_down {
            return true;
        }
        let Some(instance) = self.live.as_ref() else {
            return true;
        };
        let (entity, lock) = (instance.entity, instance.lock);
        let targets_crate = instance.container == container
            || SpatialPlacement::new(&mut self.host).targets(entity, container);
        if !targets_crate {
            return true;
        }

        match lock {
            LockState::Locked => {
                self.start_unlock(player);
                false
            }
            LockState::Unlocking => {
                self.deny_already_unlocking(player);
                false
            }
            LockState::Unlocked => {
                info!(%player, %entity, "player opened the unlocked crate");
                self.record(CrateEvent::InteractionAllowed { player });
                true
            }
        }
    }

    /// Advances virtual time by `elapsed`, firing every countdown that
    /// comes due, one at a time and in deadline order.
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.scheduler.now().saturating_add(elapsed);
        while let Some(fired) = self.scheduler.pop_due(until) {
            self.dispatch(fired);
        }
        self.scheduler.advance_clock(until);
    }

    /// Stops every countdown and destroys the live crate.
    ///
    /// Later events are ignored. Calling it twice is harmless.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.timers.disarm_all(&mut self.scheduler);

        let destroyed = match self.live.take() {
            Some(instance) => {
                let result = SpatialPlacement::new(&mut self.host).destroy(instance.entity);
                match result {
                    Ok(region) => {
                        info!(entity = %instance.entity, %region, "removed crate on shutdown");
                        true
                    }
                    Err(err) => {
                        self.fail(err);
                        false
                    }
                }
            }
            None => false,
        };
        info!(destroyed, "crate controller shut down");
        self.record(CrateEvent::ShutDown { destroyed });
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    fn spawn(&mut self) -> bool {
        if self.live.is_some() {
            warn!("spawn requested while a crate is live");
            return false;
        }
        match self.try_spawn() {
            Ok(instance) => {
                info!(
                    entity = %instance.entity,
                    point = %instance.point,
                    position = %instance.position,
                    "locked crate spawned"
                );
                self.record(CrateEvent::Spawned {
                    entity: instance.entity,
                    point: instance.point.clone(),
                    position: instance.position,
                });
                let origin = instance.position;
                let notice = Notice::Spawned {
                    point: instance.point.clone(),
                };
                self.live = Some(instance);
                self.notify(origin, &notice);
                self.arm(TimerKind::Despawn, self.config.despawn_delay());
                true
            }
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    fn try_spawn(&mut self) -> Result<CrateInstance, CrateError> {
        if self.config.spawn_points.is_empty() {
            return Err(CrateError::InvalidConfig(
                "no spawn locations defined".into(),
            ));
        }
        let index = self.rng.gen_range(0..self.config.spawn_points.len());
        let point = &self.config.spawn_points[index];

        let mut placement = SpatialPlacement::new(&mut self.host);
        let region = placement.validate(point)?;
        let def = placement.resolve_definition(self.config.crate_id)?;
        let placed = placement.place(&def, point.position)?;
        debug!(entity = %placed.entity, %region, "crate placed");

        Ok(CrateInstance {
            entity: placed.entity,
            container: placed.container,
            position: point.position,
            point: point.name.clone(),
            lock: LockState::Locked,
        })
    }

    fn start_unlock(&mut self, player: PlayerId) {
        let delay = self.config.unlock_delay();
        self.timers.disarm(&mut self.scheduler, TimerKind::Despawn);
        let Some(instance) = self.live.as_mut() else {
            return;
        };
        instance.lock = LockState::Unlocking;
        let origin = instance.position;

        info!(%player, delay_secs = delay.as_secs(), "player triggered crate unlock timer");
        self.arm(TimerKind::Unlock, delay);
        self.record(CrateEvent::UnlockStarted { player, delay });
        self.record(CrateEvent::InteractionDenied {
            player,
            reason: DenyReason::Locked,
        });
        self.notify(origin, &Notice::UnlockStarted { delay });
    }

    fn deny_already_unlocking(&mut self, player: PlayerId) {
        let Some(origin) = self.live.as_ref().map(|instance| instance.position) else {
            return;
        };
        info!(%player, "player attempted to open crate, still unlocking");
        self.record(CrateEvent::InteractionDenied {
            player,
            reason: DenyReason::AlreadyUnlocking,
        });
        let total = self.config.unlock_delay();
        self.notify(origin, &Notice::AlreadyUnlocking { total });
    }

    fn dispatch(&mut self, fired: FiredTimer) {
        if !self.timers.claim(&fired) {
            debug!(kind = %fired.kind, handle = %fired.handle, "ignoring superseded timer");
            return;
        }
        match fired.kind {
            TimerKind::Unlock => self.on_unlock_elapsed(),
            TimerKind::Despawn => self.on_despawn_elapsed(),
            TimerKind::Respawn => self.on_respawn_elapsed(),
        }
    }

    fn on_unlock_elapsed(&mut self) {
        let Some(instance) = self.live.as_mut() else {
            return;
        };
        if instance.lock != LockState::Unlocking {
            warn!(lock = ?instance.lock, "unlock timer fired outside the unlocking state");
            return;
        }
        instance.lock = LockState::Unlocked;
        let (container, origin) = (instance.container, instance.position);
        info!(entity = %instance.entity, "crate is now unlocked");

        let report = match self.loot.fill(
            &mut self.host,
            container,
            self.config.loot_table,
            self.config.item_count_min,
            self.config.item_count_max,
            &mut self.rng,
        ) {
            Ok(report) => Some(report),
            Err(err) => {
                self.fail(err);
                None
            }
        };
        self.record(CrateEvent::Unlocked { report });
        self.notify(origin, &Notice::Unlocked);
        self.arm(TimerKind::Despawn, self.config.despawn_delay());
    }

    fn on_despawn_elapsed(&mut self) {
        let Some(instance) = self.live.take() else {
            return;
        };
        self.timers.disarm(&mut self.scheduler, TimerKind::Unlock);

        let result = SpatialPlacement::new(&mut self.host).destroy(instance.entity);
        let orphaned = match result {
            Ok(region) => {
                info!(entity = %instance.entity, %region, "crate despawned");
                false
            }
            Err(err) => {
                self.fail(err);
                true
            }
        };
        self.record(CrateEvent::Despawned {
            entity: instance.entity,
            orphaned,
        });
        self.notify(instance.position, &Notice::Despawned);

        let delay = self.respawn_delay();
        self.arm(TimerKind::Respawn, delay);
    }

    fn on_respawn_elapsed(&mut self) {
        info!("respawn timer elapsed");
        self.spawn();
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn respawn_delay(&mut self) -> Duration {
        let (a, b) = (
            self.config.respawn_delay_min_secs,
            self.config.respawn_delay_max_secs,
        );
        let secs = self.rng.gen_range(a.min(b)..=a.max(b));
        Duration::from_secs(secs)
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration) {
        let handle = self.timers.arm(&mut self.scheduler, kind, delay);
        if self.config.debug_logging {
            debug!(%kind, %handle, delay_secs = delay.as_secs(), "timer armed");
        }
        self.record(CrateEvent::TimerArmed { kind, delay });
    }

    fn notify(&mut self, origin: Vec3, notice: &Notice) {
        let message = notice.to_string();
        self.host
            .broadcast(origin, self.config.broadcast_radius, &message);
        debug!(%message, "broadcast");
    }

    fn fail(&mut self, err: CrateError) {
        error!(kind = err.kind(), %err, phase = %self.phase(), "crate transition failed");
        self.record(CrateEvent::Failed(err));
    }

    fn record(&mut self, event: CrateEvent) {
        self.events.push(event);
    }
}
