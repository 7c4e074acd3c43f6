//! A scripted play session against the sandbox world.
//!
//! Players connect from worker threads through the runtime mailbox; the
//! main thread owns the controller, answers open requests and moves time.

use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use lockbox_core::{CrateController, CrateEvent, CratePhase, CrateRuntime};
use lockbox_world::{Broadcast, PlayerId, SandboxWorld};
use serde::Serialize;
use tracing::info;

/// What the session observed.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    /// Seed used for both the controller and the world.
    pub seed: u64,
    /// Virtual seconds simulated.
    pub elapsed_secs: u64,
    /// Number of crates spawned.
    pub spawns: usize,
    /// Number of crates despawned.
    pub despawns: usize,
    /// Items placed by every fill.
    pub items_filled: u32,
    /// Recorded failures, rendered.
    pub failures: Vec<String>,
    /// Phase when the session ended.
    pub final_phase: CratePhase,
    /// Every broadcast, in delivery order.
    pub broadcasts: Vec<Broadcast>,
}

/// Runs the scripted session to completion.
pub fn run(controller: CrateController<SandboxWorld>) -> Result<SessionReport> {
    let seed = controller.seed();
    let mut runtime = CrateRuntime::new(controller);
    let mut events = Vec::new();

    // Three players near the first spawn candidates, connecting concurrently.
    let arrivals = [
        (PlayerId::new(1), Vec3::new(100.0, 0.0, -60.0)),
        (PlayerId::new(2), Vec3::new(-300.0, 0.0, 240.0)),
        (PlayerId::new(3), Vec3::new(380.0, 0.0, 400.0)),
    ];
    for (player, position) in arrivals {
        runtime.controller_mut().host_mut().connect_player(player, position);
    }
    let workers: Vec<_> = arrivals
        .iter()
        .map(|&(player, _)| {
            let handle = runtime.handle();
            thread::Builder::new()
                .name(format!("conn-{player}"))
                .spawn(move || handle.player_connected(player))
        })
        .collect::<std::io::Result<_>>()
        .context("failed to start connection threads")?;
    for worker in workers {
        let delivered = worker
            .join()
            .map_err(|_| anyhow!("connection thread panicked"))?;
        if !delivered {
            return Err(anyhow!("runtime stopped before connections arrived"));
        }
    }
    runtime.pump(Duration::ZERO);
    events.extend(runtime.controller_mut().take_events());

    // Two cycles of: wander, open, wait, loot, neglect, respawn.
    for cycle in 1..=2 {
        let container = runtime
            .controller()
            .instance()
            .map(|instance| instance.container)
            .ok_or_else(|| anyhow!("no crate live at the start of cycle {cycle}"))?;
        info!(cycle, "session cycle");

        runtime.pump(Duration::from_secs(120));
        for (player, _) in arrivals {
            let allowed = runtime.interaction_requested(player, container);
            info!(%player, allowed, "open attempt");
        }

        let unlock = runtime.controller().config().unlock_delay();
        runtime.pump(unlock);
        let allowed = runtime.interaction_requested(arrivals[0].0, container);
        info!(player = %arrivals[0].0, allowed, "open attempt after unlock");

        let despawn = runtime.controller().config().despawn_delay();
        runtime.pump(despawn);
        // Only the respawn countdown is pending now.
        let respawn = runtime.controller().time_until_next().unwrap_or_default();
        runtime.pump(respawn);
        events.extend(runtime.controller_mut().take_events());
    }

    runtime.handle().shutdown();
    runtime.pump(Duration::ZERO);

    let mut controller = runtime.into_controller();
    events.extend(controller.take_events());
    Ok(summarize(seed, &mut controller, &events))
}

fn summarize(
    seed: u64,
    controller: &mut CrateController<SandboxWorld>,
    events: &[CrateEvent],
) -> SessionReport {
    let count = |pred: fn(&CrateEvent) -> bool| events.iter().filter(|e| pred(e)).count();
    let items_filled = events
        .iter()
        .filter_map(|event| match event {
            CrateEvent::Unlocked {
                report: Some(report),
            } => Some(report.added),
            _ => None,
        })
        .sum();

    SessionReport {
        seed,
        elapsed_secs: controller.now().as_secs(),
        spawns: count(|e| matches!(e, CrateEvent::Spawned { .. })),
        despawns: count(|e| matches!(e, CrateEvent::Despawned { .. })),
        items_filled,
        failures: events
            .iter()
            .filter_map(CrateEvent::as_error)
            .map(ToString::to_string)
            .collect(),
        final_phase: controller.phase(),
        broadcasts: controller.host_mut().take_broadcasts(),
    }
}
