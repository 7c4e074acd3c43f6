//! Outbound notices and the lifecycle event outbox.
//!
//! Two kinds of output leave the controller:
//!
//! - [`Notice`]: player-facing text, broadcast around the crate
//! - [`CrateEvent`]: a record of every transition and failure, kept in an
//!   outbox the host drains with
//!   [`CrateController::take_events`](crate::controller::CrateController::take_events)
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use lockbox_core::event::Notice;
//!
//! let notice = Notice::UnlockStarted { delay: Duration::from_secs(15) };
//! assert_eq!(notice.to_string(), "The supply crate will unlock in 15 seconds.");
//! ```

use std::fmt;
use std::time::Duration;

use glam::Vec3;
use lockbox_world::{EntityHandle, PlayerId};

use crate::error::CrateError;
use crate::loot::FillReport;
use crate::timer::TimerKind;

/// Player-facing broadcast messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A crate appeared at a named spawn point.
    Spawned {
        /// Spawn point display name.
        point: String,
    },
    /// The first open attempt started the unlock countdown.
    UnlockStarted {
        /// Countdown length.
        delay: Duration,
    },
    /// Someone tried to open the crate while it was already unlocking.
    AlreadyUnlocking {
        /// Total countdown length (not the time remaining).
        total: Duration,
    },
    /// The crate is open and filled.
    Unlocked,
    /// The crate was removed.
    Despawned,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawned { point } => write!(f, "A locked supply crate has spawned at {point}!"),
            Self::UnlockStarted { delay } => write!(
                f,
                "The supply crate will unlock in {} seconds.",
                delay.as_secs()
            ),
            Self::AlreadyUnlocking { total } => write!(
                f,
                "The supply crate is already unlocking ({} seconds total).",
                total.as_secs()
            ),
            Self::Unlocked => write!(f, "The supply crate is now unlocked!"),
            Self::Despawned => write!(f, "The supply crate has despawned."),
        }
    }
}

/// Why an interaction was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The crate was locked; this request started the unlock countdown.
    Locked,
    /// The unlock countdown was already running.
    AlreadyUnlocking,
}

/// A recorded lifecycle transition or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum CrateEvent {
    /// A crate was placed and locked.
    Spawned {
        /// The placed entity.
        entity: EntityHandle,
        /// Spawn point display name.
        point: String,
        /// World position.
        position: Vec3,
    },
    /// A player's open attempt started the unlock countdown.
    UnlockStarted {
        /// Who triggered it.
        player: PlayerId,
        /// Countdown length.
        delay: Duration,
    },
    /// An open attempt was denied.
    InteractionDenied {
        /// Who tried.
        player: PlayerId,
        /// Why.
        reason: DenyReason,
    },
    /// An open attempt on the unlocked crate was allowed.
    InteractionAllowed {
        /// Who opened it.
        player: PlayerId,
    },
    /// The unlock countdown elapsed.
    Unlocked {
        /// Fill outcome, or `None` if the fill could not run.
        report: Option<FillReport>,
    },
    /// The crate was removed from the world.
    Despawned {
        /// The removed entity.
        entity: EntityHandle,
        /// True if the physical entity could not be destroyed.
        orphaned: bool,
    },
    /// A countdown was (re)armed.
    TimerArmed {
        /// Countdown kind.
        kind: TimerKind,
        /// Countdown length.
        delay: Duration,
    },
    /// A transition failed; the controller stayed consistent.
    Failed(CrateError),
    /// The controller shut down.
    ShutDown {
        /// True if a live crate was destroyed.
        destroyed: bool,
    },
}

impl CrateEvent {
    /// The error carried by a [`CrateEvent::Failed`].
    #[must_use]
    pub fn as_error(&self) -> Option<&CrateError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}
