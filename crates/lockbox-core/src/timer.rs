//! One-shot countdown scheduler on a virtual clock.
//!
//! The scheduler never runs anything by itself. The owner advances it from
//! its own (single) thread and dispatches each due timer in turn, so timer
//! callbacks are serialized with every other state mutation by
//! construction.
//!
//! # Ordering
//!
//! Due timers come out earliest deadline first; timers with equal deadlines
//! come out in scheduling order. The clock moves to each timer's deadline as
//! it is popped, so a callback that schedules a new timer measures its delay
//! from the moment the old one fired, never from the end of the advance.
//!
//! # Overflow
//!
//! Deadlines saturate at [`NEVER`]. A timer whose deadline would overflow
//! the clock stays pending but never fires.
//!
//! # Cancellation
//!
//! Cancelled entries stay in the heap and are skipped lazily when they reach
//! the top. Cancelling a handle that already fired or was already cancelled
//! is a harmless no-op.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use lockbox_core::timer::{TimerKind, TimerScheduler};
//!
//! let mut scheduler = TimerScheduler::new();
//! let unlock = scheduler.schedule(TimerKind::Unlock, Duration::from_secs(15));
//!
//! assert!(scheduler.pop_due(Duration::from_secs(14)).is_none());
//! let fired = scheduler.pop_due(Duration::from_secs(20)).unwrap();
//! assert_eq!(fired.handle, unlock);
//! assert_eq!(scheduler.now(), Duration::from_secs(15));
//! assert!(!scheduler.cancel(unlock));
//! ```

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Saturated deadline; timers due at it never fire.
pub const NEVER: Duration = Duration::MAX;

/// The three countdowns of the crate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Removal of the crate.
    Despawn,
    /// Placement of a new crate.
    Respawn,
    /// Transition out of the locked state.
    Unlock,
}

impl TimerKind {
    /// All kinds, in a fixed order.
    pub const ALL: [TimerKind; 3] = [Self::Despawn, Self::Respawn, Self::Unlock];
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Despawn => write!(f, "despawn"),
            Self::Respawn => write!(f, "respawn"),
            Self::Unlock => write!(f, "unlock"),
        }
    }
}

/// Handle to a scheduled timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Returns the raw value of this handle.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer:{}", self.0)
    }
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    /// Handle returned when it was scheduled.
    pub handle: TimerHandle,
    /// Countdown kind.
    pub kind: TimerKind,
    /// Virtual time it was due at.
    pub deadline: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    deadline: Duration,
    handle: TimerHandle,
    kind: TimerKind,
}

/// Min-heap by deadline, then by handle (scheduling order).
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// =============================================================================
// TimerScheduler
// =============================================================================

/// Virtual-clock scheduler for one-shot countdowns.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    now: Duration,
    next_handle: u64,
    heap: BinaryHeap<Entry>,
    live: HashMap<TimerHandle, Entry>,
}

impl TimerScheduler {
    /// Creates a scheduler with its clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedules a countdown that fires `delay` from now, or never if that
    /// is past the end of the clock.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let entry = Entry {
            deadline: self.now.saturating_add(delay),
            handle,
            kind,
        };
        self.live.insert(handle, entry);
        self.heap.push(entry);
        handle
    }

    /// Cancels a pending timer.
    ///
    /// Returns false if the handle already fired or was already cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.live.remove(&handle).is_some()
    }

    /// Returns true if the timer is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Time left before a pending timer fires.
    #[must_use]
    pub fn remaining(&self, handle: TimerHandle) -> Option<Duration> {
        self.live
            .get(&handle)
            .map(|entry| entry.deadline.saturating_sub(self.now))
    }

    /// Number of pending timers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.live.len()
    }

    /// Number of pending timers of one kind.
    #[must_use]
    pub fn pending_of(&self, kind: TimerKind) -> usize {
        self.live.values().filter(|e| e.kind == kind).count()
    }

    /// Deadline of the earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.live.values().map(|entry| entry.deadline).min()
    }

    /// Pops the earliest timer due at or before `until`.
    ///
    /// The clock moves forward to the popped timer's deadline (never back).
    pub fn pop_due(&mut self, until: Duration) -> Option<FiredTimer> {
        self.discard_cancelled();
        let entry = *self.heap.peek()?;
        if entry.deadline > until || entry.deadline == NEVER {
            return None;
        }
        self.heap.pop();
        self.live.remove(&entry.handle);
        self.now = self.now.max(entry.deadline);
        Some(FiredTimer {
            handle: entry.handle,
            kind: entry.kind,
            deadline: entry.deadline,
        })
    }

    /// Moves the clock forward to `to` without firing anything.
    pub fn advance_clock(&mut self, to: Duration) {
        self.now = self.now.max(to);
    }

    /// Cancels every pending timer.
    pub fn clear(&mut self) {
        self.live.clear();
        self.heap.clear();
    }

    fn discard_cancelled(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.live.contains_key(&top.handle) {
                break;
            }
            self.heap.pop();
        }
    }
}

// =============================================================================
// TimerSlots
// =============================================================================

/// At most one retained handle per [`TimerKind`].
///
/// Arming a kind cancels whatever handle that kind held before, so two
/// countdowns of the same kind can never be pending together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerSlots {
    despawn: Option<TimerHandle>,
    respawn: Option<TimerHandle>,
    unlock: Option<TimerHandle>,
}

impl TimerSlots {
    /// Creates empty slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut Option<TimerHandle> {
        match kind {
            TimerKind::Despawn => &mut self.despawn,
            TimerKind::Respawn => &mut self.respawn,
            TimerKind::Unlock => &mut self.unlock,
        }
    }

    /// Handle currently retained for `kind`.
    #[must_use]
    pub fn get(&self, kind: TimerKind) -> Option<TimerHandle> {
        match kind {
            TimerKind::Despawn => self.despawn,
            TimerKind::Respawn => self.respawn,
            TimerKind::Unlock => self.unlock,
        }
    }

    /// Schedules `kind`, replacing and cancelling any handle it held.
    pub fn arm(
        &mut self,
        scheduler: &mut TimerScheduler,
        kind: TimerKind,
        delay: Duration,
    ) -> TimerHandle {
        if let Some(previous) = self.slot_mut(kind).take() {
            scheduler.cancel(previous);
        }
        let handle = scheduler.schedule(kind, delay);
        *self.slot_mut(kind) = Some(handle);
        handle
    }

    /// Cancels and forgets the handle held for `kind`.
    ///
    /// Returns true if a pending timer was actually cancelled.
    pub fn disarm(&mut self, scheduler: &mut TimerScheduler, kind: TimerKind) -> bool {
        self.slot_mut(kind)
            .take()
            .is_some_and(|handle| scheduler.cancel(handle))
    }

    /// Cancels every retained handle.
    pub fn disarm_all(&mut self, scheduler: &mut TimerScheduler) {
        for kind in TimerKind::ALL {
            self.disarm(scheduler, kind);
        }
    }

    /// Claims a fired timer.
    ///
    /// Returns true (and clears the slot) only if `fired` is the handle
    /// currently retained for its kind. A superseded timer returns false.
    pub fn claim(&mut self, fired: &FiredTimer) -> bool {
        let slot = self.slot_mut(fired.kind);
        if *slot == Some(fired.handle) {
            *slot = None;
            true
        } else {
            false
        }
    }
}
