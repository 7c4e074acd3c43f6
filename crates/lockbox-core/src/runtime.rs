//! Coordinating runtime: funnels events from any thread onto one owner.
//!
//! Real hosts deliver connection events on network threads, but placement
//! and storage calls are only safe on the main thread. `CrateRuntime` owns
//! the controller on that thread and exposes a cloneable [`RuntimeHandle`]
//! that other threads use to enqueue events. Nothing touches the controller
//! until the owner calls [`CrateRuntime::pump`], which applies queued events
//! in arrival order and then lets due countdowns fire.
//!
//! Open requests are answered synchronously by the owner, since the host
//! reads the allow/deny answer before the interaction completes.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use glam::Vec3;
//! use lockbox_core::config::{CrateConfig, SpawnPoint};
//! use lockbox_core::controller::{CrateController, CratePhase};
//! use lockbox_core::runtime::CrateRuntime;
//! use lockbox_world::{AssetId, Bounds, Catalog, PlaceableDef, PlayerId, SandboxWorld};
//!
//! let mut catalog = Catalog::new();
//! catalog.add_placeable(PlaceableDef::storage(AssetId::new(366), "Supply Crate", 24));
//! let world = SandboxWorld::new(Bounds::new(512.0, 64.0, 512.0), 64.0, 1).with_catalog(catalog);
//! let config = CrateConfig {
//!     spawn_points: vec![SpawnPoint::new("Dock", Vec3::ZERO)],
//!     ..CrateConfig::default()
//! };
//!
//! let mut runtime = CrateRuntime::new(CrateController::new(config, world, 5));
//! let handle = runtime.handle();
//!
//! std::thread::spawn(move || handle.player_connected(PlayerId::new(1)))
//!     .join()
//!     .unwrap();
//!
//! assert_eq!(runtime.controller().phase(), CratePhase::Unspawned);
//! runtime.pump(Duration::ZERO);
//! assert_eq!(runtime.controller().phase(), CratePhase::Locked);
//! ```

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use lockbox_world::{ContainerHandle, PlayerId};
use tracing::debug;

use crate::controller::CrateController;
use crate::host::CrateHost;

/// Events other threads may enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// A player finished connecting.
    PlayerConnected(PlayerId),
    /// The host is unloading the lifecycle.
    Shutdown,
}

/// Cloneable, `Send` handle for enqueueing [`Inbound`] events.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: Sender<Inbound>,
}

impl RuntimeHandle {
    /// Enqueues a player connection. Returns false if the runtime is gone.
    pub fn player_connected(&self, player: PlayerId) -> bool {
        self.send(Inbound::PlayerConnected(player))
    }

    /// Enqueues a shutdown. Returns false if the runtime is gone.
    pub fn shutdown(&self) -> bool {
        self.send(Inbound::Shutdown)
    }

    /// Enqueues any inbound event. Returns false if the runtime is gone.
    pub fn send(&self, event: Inbound) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Single owner of a [`CrateController`] plus its mailbox.
#[derive(Debug)]
pub struct CrateRuntime<H: CrateHost> {
    controller: CrateController<H>,
    tx: Sender<Inbound>,
    rx: Receiver<Inbound>,
}

impl<H: CrateHost> CrateRuntime<H> {
    /// Wraps a controller.
    #[must_use]
    pub fn new(controller: CrateController<H>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { controller, tx, rx }
    }

    /// A handle other threads can use to enqueue events.
    #[must_use]
    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            tx: self.tx.clone(),
        }
    }

    /// The controller, for inspection.
    #[must_use]
    pub fn controller(&self) -> &CrateController<H> {
        &self.controller
    }

    /// The controller, for direct calls from the owning thread.
    pub fn controller_mut(&mut self) -> &mut CrateController<H> {
        &mut self.controller
    }

    /// Unwraps the controller.
    #[must_use]
    pub fn into_controller(self) -> CrateController<H> {
        self.controller
    }

    /// Applies every queued event, then advances time by `elapsed`.
    ///
    /// Returns the number of queued events applied.
    pub fn pump(&mut self, elapsed: Duration) -> usize {
        let applied = self.drain();
        self.controller.advance(elapsed);
        applied
    }

    /// Answers an open request, after applying any queued events so that the
    /// answer reflects everything that arrived before it.
    pub fn interaction_requested(&mut self, player: PlayerId, container: ContainerHandle) -> bool {
        self.drain();
        self.controller.interaction_requested(player, container)
    }

    fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            debug!(?event, "applying queued event");
            match event {
                Inbound::PlayerConnected(player) => self.controller.player_connected(player),
                Inbound::Shutdown => self.controller.shutdown(),
            }
            applied += 1;
        }
        applied
    }
}
