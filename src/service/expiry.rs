//! Periodic reconciliation of lapsed redemptions.
//!
//! A sweep lists every live redemption past its deadline and expires each
//! one in its own transaction. One failing item is logged and counted but
//! never stops the rest. At most one sweep runs at a time; a tick that
//! finds a sweep in progress is skipped.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use utoipa::ToSchema;

use super::catalog_service::CatalogService;
use super::clock::Clock;
use super::redemption_service::RedemptionService;
use crate::error::RewardsError;
use crate::persistence::Store;

/// Outcome counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SweepSummary {
    /// Redemptions expired and refunded.
    pub succeeded: usize,
    /// Redemptions whose expiry failed and was rolled back.
    pub failed: usize,
}

/// Single-flight expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpirySweeper {
    store: Store,
    clock: Arc<dyn Clock>,
    redemptions: RedemptionService,
    catalog: CatalogService,
    running: Arc<Mutex<()>>,
}

impl ExpirySweeper {
    /// Creates a new sweeper.
    #[must_use]
    pub fn new(
        store: Store,
        clock: Arc<dyn Clock>,
        redemptions: RedemptionService,
        catalog: CatalogService,
    ) -> Self {
        Self {
            store,
            clock,
            redemptions,
            catalog,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// Runs one sweep.
    ///
    /// # Errors
    ///
    /// - [`RewardsError::SweepInProgress`] if another sweep is running.
    /// - [`RewardsError::PersistenceError`] if the overdue list cannot be
    ///   read. Per-item failures are counted in the summary instead.
    pub async fn run_once(&self) -> Result<SweepSummary, RewardsError> {
        let Ok(_guard) = self.running.try_lock() else {
            return Err(RewardsError::SweepInProgress);
        };

        let overdue = self.store.overdue_redemptions(self.clock.now()).await?;
        let mut summary = SweepSummary::default();
        for (redemption_id, user_id) in overdue {
            match self.redemptions.expire(user_id, redemption_id).await {
                Ok(Some(_)) => summary.succeeded += 1,
                Ok(None) => {}
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(%redemption_id, %user_id, error = %e, "redemption expiry failed");
                }
            }
        }

        if summary.succeeded > 0 {
            self.catalog.invalidate_rewards().await;
        }
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "expiry sweep finished"
        );
        Ok(summary)
    }

    /// Spawns the background loop that sweeps every `interval`.
    #[must_use]
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match self.run_once().await {
                    Ok(_) => {}
                    Err(RewardsError::SweepInProgress) => {
                        tracing::debug!("expiry sweep already running, tick skipped");
                    }
                    Err(e) => tracing::error!(error = %e, "expiry sweep failed"),
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::domain::RedemptionStatus;
    use crate::persistence::FaultPoint;
    use crate::service::testing::Harness;

    #[tokio::test]
    async fn sweep_expires_only_overdue_redemptions() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(1_000).await;
        let short = h.reward(100, Some(1)).await;
        let long = h.reward_with_period(100, 60).await;
        let service = h.redemptions();

        let Ok(_) = service.redeem(user_id, short.id, None).await else {
            panic!("redeem failed");
        };
        let Ok(_) = service.redeem(user_id, long.id, None).await else {
            panic!("redeem failed");
        };
        h.clock.advance(ChronoDuration::days(8));

        let Ok(summary) = h.sweeper().run_once().await else {
            panic!("sweep failed");
        };
        assert_eq!(summary, SweepSummary { succeeded: 1, failed: 0 });
        assert_eq!(h.reward_by_id(short.id).await.stock_quantity, Some(1));

        let Ok(list) = service.list_for_user(user_id).await else {
            panic!("list failed");
        };
        let expired = list
            .iter()
            .filter(|r| r.status == RedemptionStatus::Expired)
            .count();
        assert_eq!(expired, 1);
        h.assert_ledger_matches(user_id).await;

        // Idempotent: nothing left to do.
        let Ok(again) = h.sweeper().run_once().await else {
            panic!("sweep failed");
        };
        assert_eq!(again, SweepSummary::default());
    }

    #[tokio::test]
    async fn one_failure_does_not_block_the_batch() {
        let h = Harness::new().await;
        let ana = h.user_with_points(500).await;
        let ben = h.user_with_points(500).await;
        let reward = h.reward(100, Some(10)).await;
        let service = h.redemptions();
        for user_id in [ana, ben] {
            let Ok(_) = service.redeem(user_id, reward.id, None).await else {
                panic!("redeem failed");
            };
        }
        h.clock.advance(ChronoDuration::days(8));

        h.memory.inject_fault(FaultPoint::UpdateRedemption);
        let Ok(summary) = h.sweeper().run_once().await else {
            panic!("sweep failed");
        };
        assert_eq!(summary, SweepSummary { succeeded: 1, failed: 1 });
        assert_eq!(h.reward_by_id(reward.id).await.stock_quantity, Some(9));
        h.assert_ledger_matches(ana).await;
        h.assert_ledger_matches(ben).await;

        // The failed item is picked up by the next sweep.
        let Ok(retry) = h.sweeper().run_once().await else {
            panic!("sweep failed");
        };
        assert_eq!(retry, SweepSummary { succeeded: 1, failed: 0 });
        assert_eq!(h.reward_by_id(reward.id).await.stock_quantity, Some(10));
    }

    #[tokio::test]
    async fn overlapping_sweeps_are_suppressed() {
        let h = Harness::new().await;
        let sweeper = h.sweeper();
        let _held = sweeper.running.lock().await;
        let result = sweeper.run_once().await;
        assert!(matches!(result, Err(RewardsError::SweepInProgress)));
    }
}
