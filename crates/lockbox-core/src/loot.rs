//! Loot resolution: turns a spawn table into items inside the crate.
//!
//! # Algorithm
//!
//! 1. Pick `target` uniformly in `[min, max]`.
//! 2. Draw one candidate from the table and try to insert it.
//! 3. Repeat until `added == target` or `attempted == target * ATTEMPTS_PER_ITEM`.
//!
//! A full container, a draw that is not an item, and a failing draw all
//! count as spent attempts and never abort the loop. The ceiling makes the
//! loop terminate even when every draw is useless. Ending with
//! `added < target` is an accepted outcome.

use lockbox_world::{AssetId, ContainerHandle, HostError, ItemDef};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::CrateError;

/// Attempt budget per requested item.
pub const ATTEMPTS_PER_ITEM: u32 = 5;

/// Result of one spawn table draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LootDraw {
    /// An item definition.
    Item(ItemDef),
    /// Something that is not an item.
    NotAnItem(AssetId),
}

/// Host calls for resolving loot and filling storage.
pub trait LootHost {
    /// True if a spawn table is registered under `table`.
    fn has_loot_table(&self, table: AssetId) -> bool;

    /// Draws one candidate from `table`.
    ///
    /// # Errors
    ///
    /// Returns the host's failure for this draw only.
    fn resolve_loot(&mut self, table: AssetId) -> Result<LootDraw, HostError>;

    /// Inserts one instance of `item`. Returns false if it does not fit.
    fn try_add_item(&mut self, container: ContainerHandle, item: &ItemDef) -> bool;

    /// Number of items in a container.
    fn item_count(&self, container: ContainerHandle) -> usize;
}

/// Counts achieved by one fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    /// Number of items requested.
    pub target: u32,
    /// Number of items inserted.
    pub added: u32,
    /// Number of draws made.
    pub attempted: u32,
    /// Draws that did not fit in the container.
    pub rejected: u32,
    /// Draws that were not items.
    pub non_items: u32,
    /// Draws the host failed.
    pub failures: u32,
    /// Items in the container after the fill.
    pub stored: usize,
}

impl FillReport {
    /// Hard ceiling on draws for this report's target.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.target.saturating_mul(ATTEMPTS_PER_ITEM)
    }

    /// True if every requested item was added.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.added == self.target
    }
}

/// Fills containers from spawn tables with a bounded number of draws.
#[derive(Debug, Clone, Copy, Default)]
pub struct LootResolver {
    verbose: bool,
}

impl LootResolver {
    /// Creates a resolver. `verbose` enables per-attempt records.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Fills `container` from `table` with between `min` and `max` items.
    ///
    /// # Errors
    ///
    /// Returns [`CrateError::InvalidConfig`] if the table does not exist or
    /// `min > max`. Per-draw failures are logged and counted, not returned.
    pub fn fill<H: LootHost, R: Rng>(
        &self,
        host: &mut H,
        container: ContainerHandle,
        table: AssetId,
        min: u32,
        max: u32,
        rng: &mut R,
    ) -> Result<FillReport, CrateError> {
        if min > max {
            return Err(CrateError::InvalidConfig(format!(
                "item count range {min}..={max} is empty"
            )));
        }
        if !host.has_loot_table(table) {
            return Err(CrateError::InvalidConfig(format!(
                "invalid spawn table id {table}"
            )));
        }

        let mut report = FillReport {
            target: rng.gen_range(min..=max),
            ..FillReport::default()
        };
        let max_attempts = report.max_attempts();
        info!(%table, %container, target = report.target, "filling crate");

        while report.added < report.target && report.attempted < max_attempts {
            report.attempted += 1;
            let attempt = report.attempted;

            match host.resolve_loot(table) {
                Ok(LootDraw::Item(item)) => {
                    if host.try_add_item(container, &item) {
                        report.added += 1;
                        if self.verbose {
                            debug!(
                                attempt,
                                item = %item.name,
                                id = %item.id,
                                added = report.added,
                                target = report.target,
                                "added item"
                            );
                        }
                    } else {
                        report.rejected += 1;
                        warn!(attempt, item = %item.name, id = %item.id, "not enough space");
                    }
                }
                Ok(LootDraw::NotAnItem(asset)) => {
                    report.non_items += 1;
                    warn!(attempt, %asset, "resolved asset is not an item");
                }
                Err(source) => {
                    report.failures += 1;
                    let err = CrateError::ResolutionFailure { attempt, source };
                    error!(kind = err.kind(), %err, "loot draw failed");
                }
            }
        }

        report.stored = host.item_count(container);
        info!(
            requested = report.target,
            added = report.added,
            attempted = report.attempted,
            stored = report.stored,
            "finished filling crate"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::VecDeque;

    /// Scripted loot host: draws come from a queue (then repeat `fallback`).
    struct ScriptedHost {
        draws: VecDeque<Result<LootDraw, HostError>>,
        fallback: Result<LootDraw, HostError>,
        accept: bool,
        stored: usize,
        calls: u32,
    }

    impl ScriptedHost {
        fn always(draw: Result<LootDraw, HostError>, accept: bool) -> Self {
            Self {
                draws: VecDeque::new(),
                fallback: draw,
                accept,
                stored: 0,
                calls: 0,
            }
        }
    }

    impl LootHost for ScriptedHost {
        fn has_loot_table(&self, table: AssetId) -> bool {
            table == AssetId::new(1)
        }

        fn resolve_loot(&mut self, _table: AssetId) -> Result<LootDraw, HostError> {
            self.calls += 1;
            self.draws
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        }

        fn try_add_item(&mut self, _container: ContainerHandle, _item: &ItemDef) -> bool {
            if self.accept {
                self.stored += 1;
            }
            self.accept
        }

        fn item_count(&self, _container: ContainerHandle) -> usize {
            self.stored
        }
    }

    fn bandage() -> LootDraw {
        LootDraw::Item(ItemDef::new(AssetId::new(15), "Bandage", 1))
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(9)
    }

    fn fill(host: &mut ScriptedHost, min: u32, max: u32) -> Result<FillReport, CrateError> {
        LootResolver::new(true).fill(
            host,
            ContainerHandle::new(1),
            AssetId::new(1),
            min,
            max,
            &mut rng(),
        )
    }

    #[test]
    fn fills_exactly_target_when_everything_fits() {
        let mut host = ScriptedHost::always(Ok(bandage()), true);
        let report = fill(&mut host, 3, 5).unwrap();

        assert!((3..=5).contains(&report.target));
        assert_eq!(report.added, report.target);
        assert_eq!(report.attempted, report.target);
        assert_eq!(report.stored, report.target as usize);
        assert!(report.is_complete());
    }

    #[test]
    fn full_container_spends_whole_budget() {
        let mut host = ScriptedHost::always(Ok(bandage()), false);
        let report = fill(&mut host, 4, 4).unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(report.attempted, 4 * ATTEMPTS_PER_ITEM);
        assert_eq!(report.rejected, report.attempted);
    }

    #[test]
    fn failing_draw_does_not_abort_loop() {
        let mut host = ScriptedHost::always(Ok(bandage()), true);
        host.draws.push_back(Err(HostError::Resolution("boom".into())));
        host.draws.push_back(Ok(LootDraw::NotAnItem(AssetId::new(500))));

        let report = fill(&mut host, 2, 2).unwrap();

        assert_eq!(report.failures, 1);
        assert_eq!(report.non_items, 1);
        assert_eq!(report.added, 2);
        assert_eq!(report.attempted, 4);
    }

    #[test]
    fn host_that_always_fails_terminates() {
        let mut host = ScriptedHost::always(Err(HostError::Resolution("down".into())), true);
        let report = fill(&mut host, 1, 3).unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(report.attempted, report.max_attempts());
        assert_eq!(host.calls, report.attempted);
    }

    #[test]
    fn zero_target_makes_no_draws() {
        let mut host = ScriptedHost::always(Ok(bandage()), true);
        let report = fill(&mut host, 0, 0).unwrap();
        assert_eq!(report.attempted, 0);
        assert_eq!(host.calls, 0);
    }

    #[test]
    fn unknown_table_is_invalid_config() {
        let mut host = ScriptedHost::always(Ok(bandage()), true);
        let err = LootResolver::default()
            .fill(
                &mut host,
                ContainerHandle::new(1),
                AssetId::new(99),
                1,
                2,
                &mut rng(),
            )
            .unwrap_err();
        assert!(matches!(err, CrateError::InvalidConfig(_)));
        assert_eq!(host.calls, 0);
    }

    #[test]
    fn inverted_range_is_invalid_config() {
        let mut host = ScriptedHost::always(Ok(bandage()), true);
        assert!(matches!(
            fill(&mut host, 5, 1),
            Err(CrateError::InvalidConfig(_))
        ));
    }
}
