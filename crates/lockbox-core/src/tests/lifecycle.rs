//! End-to-end lifecycle scenarios.
//!
//! Each test drives a controller over the sandbox world through host events
//! and virtual time, then checks phase, timers, world state, the event
//! outbox and the broadcast log.

use std::time::Duration;

use glam::Vec3;
use lockbox_world::{AssetId, ContainerHandle, PlayerId};

use crate::config::{CrateConfig, SpawnPoint};
use crate::controller::CratePhase;
use crate::error::CrateError;
use crate::event::{CrateEvent, DenyReason};
use crate::timer::TimerKind;

use super::helpers::{
    controller_with, demo_config, failures, messages, single_point_config, spawned, AIRFIELD,
};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

// =============================================================================
// Spawning
// =============================================================================

mod spawn_tests {
    use super::*;

    #[test]
    fn first_connection_spawns_a_locked_crate() {
        let mut controller = controller_with(single_point_config(), 1);
        controller.player_connected(PlayerId::new(7));

        assert_eq!(controller.phase(), CratePhase::Locked);
        let instance = controller.instance().unwrap();
        assert_eq!(instance.point, "Airfield");
        assert_eq!(instance.position, AIRFIELD);
        assert!(controller.host().contains(instance.entity));
        assert_eq!(controller.remaining(TimerKind::Despawn), Some(secs(600)));
        assert!(!controller.is_pending(TimerKind::Unlock));

        let events = controller.events();
        assert!(matches!(events[0], CrateEvent::Spawned { ref point, .. } if point == "Airfield"));
        assert!(failures(events).is_empty());
        assert_eq!(
            messages(controller.host()),
            vec!["A locked supply crate has spawned at Airfield!"]
        );
    }

    #[test]
    fn later_connections_do_not_spawn_again() {
        let (mut controller, _, _) = spawned(2);
        controller.player_connected(PlayerId::new(2));
        controller.player_connected(PlayerId::new(3));

        assert_eq!(controller.host().entity_count(), 1);
        assert!(controller.events().is_empty());
    }

    #[test]
    fn spawn_point_is_one_of_the_configured_points() {
        let config = demo_config();
        for seed in 0..16 {
            let mut controller = controller_with(config.clone(), seed);
            controller.player_connected(PlayerId::new(1));
            let position = controller.instance().unwrap().position;
            assert!(config.spawn_points.iter().any(|p| p.position == position));
        }
    }

    #[test]
    fn empty_spawn_list_fails_once_per_attempt() {
        let config = CrateConfig {
            spawn_points: Vec::new(),
            ..CrateConfig::default()
        };
        let mut controller = controller_with(config, 3);
        controller.player_connected(PlayerId::new(1));

        let events = controller.take_events();
        let errors = failures(&events);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], CrateError::InvalidConfig(_)));
        assert_eq!(controller.phase(), CratePhase::Unspawned);
        assert_eq!(controller.scheduler().pending_count(), 0);

        // The next connection tries again.
        controller.player_connected(PlayerId::new(2));
        assert_eq!(failures(controller.events()).len(), 1);
    }

    #[test]
    fn out_of_bounds_point_is_reported_by_name() {
        let config = CrateConfig {
            spawn_points: vec![SpawnPoint::new("Ocean", Vec3::new(9000.0, 0.0, 0.0))],
            ..CrateConfig::default()
        };
        let mut controller = controller_with(config, 4);
        controller.player_connected(PlayerId::new(1));

        let errors = failures(controller.events());
        assert!(matches!(errors[..], [CrateError::OutOfBounds { name, .. }] if name == "Ocean"));
        assert_eq!(controller.host().entity_count(), 0);
    }

    #[test]
    fn unknown_crate_type_is_a_config_error() {
        let config = CrateConfig {
            crate_id: AssetId::new(9999),
            ..single_point_config()
        };
        let mut controller = controller_with(config, 5);
        controller.player_connected(PlayerId::new(1));

        assert!(matches!(
            failures(controller.events())[..],
            [CrateError::InvalidConfig(_)]
        ));
        assert_eq!(controller.phase(), CratePhase::Unspawned);
    }

    #[test]
    fn refused_placement_leaves_no_crate_and_recovers() {
        let mut controller = controller_with(single_point_config(), 6);
        controller.host_mut().faults_mut().refuse_placement = true;
        controller.player_connected(PlayerId::new(1));

        assert!(matches!(
            failures(controller.events())[..],
            [CrateError::PlacementFailed { .. }]
        ));
        assert_eq!(controller.phase(), CratePhase::Unspawned);
        assert_eq!(controller.scheduler().pending_count(), 0);

        controller.host_mut().faults_mut().refuse_placement = false;
        controller.player_connected(PlayerId::new(2));
        assert_eq!(controller.phase(), CratePhase::Locked);
    }
}

// =============================================================================
// Unlocking
// =============================================================================

mod unlock_tests {
    use super::*;

    #[test]
    fn first_open_attempt_is_denied_and_starts_the_countdown() {
        let (mut controller, player, container) = spawned(10);

        assert!(!controller.interaction_requested(player, container));
        assert_eq!(controller.phase(), CratePhase::Unlocking);
        assert_eq!(controller.remaining(TimerKind::Unlock), Some(secs(15)));
        assert!(!controller.is_pending(TimerKind::Despawn));

        let events = controller.events();
        assert!(events.contains(&CrateEvent::UnlockStarted {
            player,
            delay: secs(15)
        }));
        assert!(events.contains(&CrateEvent::InteractionDenied {
            player,
            reason: DenyReason::Locked
        }));
        assert_eq!(
            messages(controller.host()),
            vec!["The supply crate will unlock in 15 seconds."]
        );
    }

    #[test]
    fn back_to_back_attempts_start_one_countdown() {
        let (mut controller, player, container) = spawned(11);
        let other = PlayerId::new(2);

        assert!(!controller.interaction_requested(player, container));
        assert!(!controller.interaction_requested(other, container));

        assert_eq!(controller.scheduler().pending_of(TimerKind::Unlock), 1);
        let started = controller
            .events()
            .iter()
            .filter(|e| matches!(e, CrateEvent::UnlockStarted { .. }))
            .count();
        assert_eq!(started, 1);
        assert!(controller.events().contains(&CrateEvent::InteractionDenied {
            player: other,
            reason: DenyReason::AlreadyUnlocking
        }));
        assert_eq!(
            messages(controller.host())[1],
            "The supply crate is already unlocking (15 seconds total)."
        );
    }

    #[test]
    fn repeated_attempts_do_not_extend_the_countdown() {
        let (mut controller, player, container) = spawned(12);
        controller.interaction_requested(player, container);
        controller.advance(secs(10));
        controller.interaction_requested(player, container);

        assert_eq!(controller.remaining(TimerKind::Unlock), Some(secs(5)));
        controller.advance(secs(5));
        assert_eq!(controller.phase(), CratePhase::Unlocked);
    }

    #[test]
    fn unlock_cancels_a_nearly_due_despawn() {
        let (mut controller, player, container) = spawned(13);
        controller.advance(secs(599));
        controller.interaction_requested(player, container);

        controller.advance(secs(1));
        assert_eq!(controller.phase(), CratePhase::Unlocking);
        let entity = controller.instance().unwrap().entity;
        assert!(controller.host().contains(entity));

        controller.advance(secs(14));
        assert_eq!(controller.phase(), CratePhase::Unlocked);
    }

    #[test]
    fn unlock_fills_the_crate_and_rearms_despawn() {
        let (mut controller, player, container) = spawned(14);
        controller.interaction_requested(player, container);
        controller.take_events();
        controller.advance(secs(15));

        let events = controller.take_events();
        let report = events
            .iter()
            .find_map(|e| match e {
                CrateEvent::Unlocked { report } => *report,
                _ => None,
            })
            .unwrap();
        assert!((3..=6).contains(&report.target));
        assert_eq!(report.added, report.target);
        assert_eq!(controller.host().item_count(container), report.stored);
        assert_eq!(controller.remaining(TimerKind::Despawn), Some(secs(600)));
        assert_eq!(
            messages(controller.host()).last(),
            Some(&"The supply crate is now unlocked!")
        );
    }

    #[test]
    fn unlocked_crate_allows_every_attempt() {
        let (mut controller, player, container) = spawned(15);
        controller.interaction_requested(player, container);
        controller.advance(secs(15));

        assert!(controller.interaction_requested(player, container));
        assert!(controller.interaction_requested(PlayerId::new(9), container));
        assert_eq!(controller.phase(), CratePhase::Unlocked);
    }

    #[test]
    fn child_storage_counts_as_the_crate() {
        let (mut controller, player, _) = spawned(16);
        let entity = controller.instance().unwrap().entity;
        let child = controller.host_mut().attach_storage(entity, 4).unwrap();

        assert!(!controller.interaction_requested(player, child));
        assert_eq!(controller.phase(), CratePhase::Unlocking);
    }

    #[test]
    fn unrelated_containers_are_always_allowed() {
        let (mut controller, player, _) = spawned(17);
        assert!(controller.interaction_requested(player, ContainerHandle::new(4242)));
        assert_eq!(controller.phase(), CratePhase::Locked);
        assert!(controller.events().is_empty());
    }

    #[test]
    fn missing_loot_table_still_unlocks() {
        let config = CrateConfig {
            loot_table: AssetId::new(77),
            ..single_point_config()
        };
        let mut controller = controller_with(config, 18);
        let player = PlayerId::new(1);
        controller.player_connected(player);
        let container = controller.instance().unwrap().container;
        controller.interaction_requested(player, container);
        controller.advance(secs(15));

        assert_eq!(controller.phase(), CratePhase::Unlocked);
        assert!(controller
            .events()
            .contains(&CrateEvent::Unlocked { report: None }));
        assert!(matches!(
            failures(controller.events())[..],
            [CrateError::InvalidConfig(_)]
        ));
        assert!(controller.is_pending(TimerKind::Despawn));
    }

    #[test]
    fn failing_draws_exhaust_the_attempt_budget() {
        let (mut controller, player, container) = spawned(19);
        controller.host_mut().faults_mut().fail_resolution = true;
        controller.interaction_requested(player, container);
        controller.advance(secs(15));

        let report = controller
            .events()
            .iter()
            .find_map(|e| match e {
                CrateEvent::Unlocked { report } => *report,
                _ => None,
            })
            .unwrap();
        assert_eq!(report.added, 0);
        assert_eq!(report.attempted, report.target * 5);
        assert_eq!(report.failures, report.attempted);
        assert_eq!(controller.phase(), CratePhase::Unlocked);
    }
}

// =============================================================================
// Despawn and respawn
// =============================================================================

mod despawn_tests {
    use super::*;

    #[test]
    fn neglected_locked_crate_despawns() {
        let (mut controller, _, _) = spawned(20);
        let entity = controller.instance().unwrap().entity;
        controller.advance(secs(600));

        assert_eq!(controller.phase(), CratePhase::Unspawned);
        assert!(!controller.host().contains(entity));
        assert!(controller.events().contains(&CrateEvent::Despawned {
            entity,
            orphaned: false
        }));
        assert_eq!(controller.remaining(TimerKind::Respawn), Some(secs(30)));
        assert_eq!(
            messages(controller.host()),
            vec!["The supply crate has despawned."]
        );
    }

    #[test]
    fn unlocked_crate_despawns_after_its_own_delay() {
        let (mut controller, player, container) = spawned(21);
        controller.interaction_requested(player, container);
        controller.advance(secs(15));
        controller.advance(secs(599));
        assert_eq!(controller.phase(), CratePhase::Unlocked);

        controller.advance(secs(1));
        assert_eq!(controller.phase(), CratePhase::Unspawned);
        assert_eq!(controller.host().item_count(container), 0);
    }

    #[test]
    fn respawn_places_a_fresh_locked_crate() {
        let (mut controller, _, _) = spawned(22);
        let first = controller.instance().unwrap().entity;
        controller.advance(secs(600));
        controller.advance(secs(30));

        assert_eq!(controller.phase(), CratePhase::Locked);
        let second = controller.instance().unwrap().entity;
        assert_ne!(first, second);
        assert_eq!(controller.host().entity_count(), 1);
        assert!(controller.is_pending(TimerKind::Despawn));
    }

    #[test]
    fn one_long_advance_runs_the_whole_cycle() {
        let (mut controller, _, _) = spawned(23);
        controller.advance(secs(630));

        assert_eq!(controller.phase(), CratePhase::Locked);
        assert_eq!(controller.now(), secs(630));
        assert_eq!(controller.remaining(TimerKind::Despawn), Some(secs(600)));
    }

    #[test]
    fn connection_during_respawn_wait_does_not_spawn() {
        let (mut controller, _, _) = spawned(24);
        controller.advance(secs(600));
        controller.player_connected(PlayerId::new(5));

        assert_eq!(controller.phase(), CratePhase::Unspawned);
        assert!(controller.is_pending(TimerKind::Respawn));
    }

    #[test]
    fn lost_entity_is_orphaned_and_lifecycle_continues() {
        let (mut controller, _, _) = spawned(25);
        let entity = controller.instance().unwrap().entity;
        controller.host_mut().faults_mut().lose_entities = true;
        controller.advance(secs(600));

        assert_eq!(controller.phase(), CratePhase::Unspawned);
        assert!(controller.host().contains(entity));
        assert!(controller.events().contains(&CrateEvent::Despawned {
            entity,
            orphaned: true
        }));
        assert!(matches!(
            failures(controller.events())[..],
            [CrateError::RegionLookupFailed(e)] if *e == entity
        ));
        assert!(controller.is_pending(TimerKind::Respawn));
    }

    #[test]
    fn respawn_delay_is_drawn_from_the_configured_range() {
        let config = CrateConfig {
            respawn_delay_min_secs: 20,
            respawn_delay_max_secs: 40,
            ..single_point_config()
        };
        let mut controller = controller_with(config, 26);
        controller.player_connected(PlayerId::new(1));
        controller.advance(secs(600));

        let delay = controller.remaining(TimerKind::Respawn).unwrap();
        assert!(delay >= secs(20) && delay <= secs(40));
    }
}

mod clock_tests {
    use super::*;

    fn endless_delays() -> CrateConfig {
        CrateConfig {
            despawn_delay_secs: u64::MAX,
            respawn_delay_min_secs: u64::MAX,
            respawn_delay_max_secs: u64::MAX,
            ..single_point_config()
        }
    }

    #[test]
    fn huge_delays_pass_validation_and_saturate() {
        let config = endless_delays();
        assert!(config.validate().is_ok());

        let mut controller = controller_with(config, 27);
        let player = PlayerId::new(1);
        controller.player_connected(player);
        let container = controller.instance().unwrap().container;
        controller.interaction_requested(player, container);
        controller.advance(secs(15));

        // The despawn countdown re-armed after the fill would end past the clock.
        assert_eq!(controller.phase(), CratePhase::Unlocked);
        assert!(controller.is_pending(TimerKind::Despawn));
        assert_eq!(controller.time_until_next(), Some(Duration::MAX - secs(15)));
    }

    #[test]
    fn advancing_to_the_end_of_the_clock_terminates() {
        let mut controller = controller_with(endless_delays(), 28);
        controller.player_connected(PlayerId::new(1));
        controller.advance(secs(1));
        controller.advance(Duration::MAX);

        assert_eq!(controller.now(), Duration::MAX);
        assert_eq!(controller.phase(), CratePhase::Unspawned);
        assert!(controller.is_pending(TimerKind::Respawn));
    }

    #[test]
    fn time_until_next_tracks_the_earliest_countdown() {
        let (mut controller, _, _) = spawned(29);
        assert_eq!(controller.time_until_next(), Some(secs(600)));

        controller.advance(secs(600));
        assert_eq!(
            controller.time_until_next(),
            controller.remaining(TimerKind::Respawn)
        );

        controller.shutdown();
        assert_eq!(controller.time_until_next(), None);
    }
}

// =============================================================================
// Shutdown
// =============================================================================

mod shutdown_tests {
    use super::*;

    #[test]
    fn shutdown_removes_the_crate_and_every_timer() {
        let (mut controller, player, container) = spawned(30);
        controller.interaction_requested(player, container);
        let entity = controller.instance().unwrap().entity;
        controller.shutdown();

        assert!(controller.is_shut_down());
        assert_eq!(controller.phase(), CratePhase::Unspawned);
        assert!(!controller.host().contains(entity));
        assert_eq!(controller.scheduler().pending_count(), 0);
        assert_eq!(
            controller.events().last(),
            Some(&CrateEvent::ShutDown { destroyed: true })
        );
    }

    #[test]
    fn events_after_shutdown_are_ignored() {
        let (mut controller, player, container) = spawned(31);
        controller.shutdown();
        controller.take_events();

        controller.player_connected(PlayerId::new(2));
        assert!(controller.interaction_requested(player, container));
        controller.advance(secs(10_000));
        controller.shutdown();

        assert!(controller.events().is_empty());
        assert_eq!(controller.host().entity_count(), 0);
    }

    #[test]
    fn shutdown_while_waiting_to_respawn() {
        let (mut controller, _, _) = spawned(32);
        controller.advance(secs(600));
        controller.shutdown();

        assert_eq!(controller.scheduler().pending_count(), 0);
        assert_eq!(
            controller.events().last(),
            Some(&CrateEvent::ShutDown { destroyed: false })
        );
        controller.advance(secs(30));
        assert_eq!(controller.phase(), CratePhase::Unspawned);
    }
}

// =============================================================================
// Broadcasts and determinism
// =============================================================================

mod broadcast_tests {
    use super::*;

    #[test]
    fn only_players_in_range_hear_notices() {
        let mut controller = controller_with(single_point_config(), 40);
        let near = PlayerId::new(1);
        let far = PlayerId::new(2);
        controller.host_mut().connect_player(near, AIRFIELD + Vec3::X * 100.0);
        controller
            .host_mut()
            .connect_player(far, Vec3::new(-500.0, 0.0, -500.0));
        controller.player_connected(near);

        let broadcast = &controller.host().broadcasts()[0];
        assert_eq!(broadcast.origin, AIRFIELD);
        assert!((broadcast.radius - 500.0).abs() < f32::EPSILON);
        assert_eq!(broadcast.recipients, vec![near]);
    }

    #[test]
    fn same_seed_replays_the_same_session() {
        let run = |seed| {
            let mut controller = controller_with(demo_config(), seed);
            let player = PlayerId::new(1);
            controller.player_connected(player);
            let container = controller.instance().unwrap().container;
            controller.interaction_requested(player, container);
            controller.advance(secs(615));
            controller.advance(secs(45));
            (controller.take_events(), controller.host_mut().take_broadcasts())
        };

        assert_eq!(run(77), run(77));
    }
}
