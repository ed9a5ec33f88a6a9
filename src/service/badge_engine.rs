//! Badge evaluation: recompute progress for every active badge and award
//! the ones whose requirement is newly met.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::clock::Clock;
use super::ledger::{self, LedgerEntry};
use crate::domain::{
    Badge, BadgeId, EventBus, LedgerReference, RewardsEvent, TransactionType, UserBadge, UserId,
};
use crate::error::RewardsError;
use crate::persistence::{Store, StoreTx};

/// A badge awarded by one evaluation.
#[derive(Debug, Clone)]
pub struct AwardedBadge {
    /// The catalog entry.
    pub badge: Badge,
    /// Bonus points credited, snapshotted at award time.
    pub points_awarded: i64,
}

/// Evaluates badges for a user inside the caller's transaction.
///
/// Runs to a fixpoint: bonus points credited for one award raise lifetime
/// points, which can satisfy a `points_total` badge in the next round. Each
/// badge is earned at most once, so the loop ends after at most one round
/// per active badge.
///
/// # Errors
///
/// Returns [`RewardsError`] from storage or the ledger; the caller's
/// transaction must then be dropped.
pub async fn evaluate_in_tx(
    tx: &mut StoreTx,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<Vec<AwardedBadge>, RewardsError> {
    let badges = tx.active_badges().await?;
    let mut awarded = Vec::new();

    loop {
        let activity = tx.load_activity(user_id, now.date_naive()).await?;
        let mut rows: HashMap<BadgeId, UserBadge> = tx
            .lock_user_badges(user_id)
            .await?
            .into_iter()
            .map(|ub| (ub.badge_id, ub))
            .collect();

        let mut round = Vec::new();
        for badge in &badges {
            let existing = rows.remove(&badge.id);
            if existing.as_ref().is_some_and(|ub| ub.is_earned) {
                continue;
            }
            let is_new_row = existing.is_none();
            let mut row = existing.unwrap_or_else(|| UserBadge::new(user_id, badge.id, now));
            let progress = badge.requirement_type.progress(&activity);
            let previous = row.progress;
            let earned = row.record_progress(badge, progress, now);
            if is_new_row || earned || previous != progress {
                tx.upsert_user_badge(&row).await?;
            }
            if earned {
                round.push(AwardedBadge {
                    badge: badge.clone(),
                    points_awarded: row.points_awarded,
                });
            }
        }

        if round.is_empty() {
            break;
        }
        for award in &round {
            if award.points_awarded > 0 {
                ledger::append(
                    tx,
                    LedgerEntry {
                        user_id,
                        delta: award.points_awarded,
                        transaction_type: TransactionType::Bonus,
                        reference: LedgerReference::Badge(award.badge.id),
                        description: format!("badge earned: {}", award.badge.name),
                    },
                    now,
                )
                .await?;
            }
        }
        awarded.extend(round);
    }

    Ok(awarded)
}

/// Builds the events announcing `awarded` badges.
pub(crate) fn award_events(
    user_id: UserId,
    awarded: &[AwardedBadge],
    now: DateTime<Utc>,
) -> impl Iterator<Item = RewardsEvent> + '_ {
    awarded.iter().map(move |award| RewardsEvent::BadgeEarned {
        user_id,
        badge_id: award.badge.id,
        name: award.badge.name.clone(),
        points_awarded: award.points_awarded,
        timestamp: now,
    })
}

/// Standalone entry point for badge evaluation.
#[derive(Debug, Clone)]
pub struct BadgeEngine {
    store: Store,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
}

impl BadgeEngine {
    /// Creates a new engine.
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>, event_bus: EventBus) -> Self {
        Self {
            store,
            clock,
            event_bus,
        }
    }

    /// Evaluates every active badge for `user_id` and returns the newly
    /// earned ones. Running it again right away returns an empty list.
    ///
    /// # Errors
    ///
    /// - [`RewardsError::UserNotFound`] / [`RewardsError::AccountInactive`].
    /// - [`RewardsError::PersistenceError`] on storage failure; nothing is
    ///   written in that case.
    pub async fn evaluate_and_award(&self, user_id: UserId) -> Result<Vec<AwardedBadge>, RewardsError> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        tx.lock_user(user_id).await?.ensure_active()?;

        let awarded = evaluate_in_tx(&mut tx, user_id, now).await?;
        tx.commit().await?;

        for event in award_events(user_id, &awarded, now) {
            let _ = self.event_bus.publish(event);
        }
        for award in &awarded {
            tracing::info!(
                %user_id,
                badge = %award.badge.slug,
                points = award.points_awarded,
                "badge earned"
            );
        }
        Ok(awarded)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::badge::Rarity;
    use crate::domain::{RequirementType, UserStatus};
    use crate::persistence::FaultPoint;
    use crate::service::testing::Harness;

    #[tokio::test]
    async fn award_is_idempotent() {
        let h = Harness::new().await;
        let user_id = h.user().await;
        let dest = h.destination("MNL-001", 14.5995, 120.9842, 50, "heritage").await;
        let Ok(_) = h.check_in_at(user_id, &dest).await else {
            panic!("check-in failed");
        };

        // The check-in already evaluated badges; a fresh run finds nothing new.
        let engine = h.badges();
        let Ok(again) = engine.evaluate_and_award(user_id).await else {
            panic!("evaluation failed");
        };
        assert!(again.is_empty());

        let earned = h.earned_badges(user_id).await;
        assert_eq!(earned.iter().filter(|slug| *slug == "first-steps").count(), 1);
        h.assert_ledger_matches(user_id).await;
    }

    #[tokio::test]
    async fn bonus_points_cascade_into_points_badges() {
        let catalog = [
            Badge::new("one", "One", "", RequirementType::CheckinCount, 1, 100, Rarity::Common),
            Badge::new("rich", "Rich", "", RequirementType::PointsTotal, 150, 0, Rarity::Rare),
        ];
        let h = Harness::with_badges(&catalog).await;
        let user_id = h.user().await;
        let dest = h.destination("CEB-001", 10.3157, 123.8854, 60, "beach").await;

        let Ok(settled) = h.check_in_at(user_id, &dest).await else {
            panic!("check-in failed");
        };
        let slugs: Vec<&str> = settled
            .new_badges
            .iter()
            .map(|a| a.badge.slug.as_str())
            .collect();
        assert_eq!(slugs, vec!["one", "rich"]);
        assert_eq!(settled.total_points, 160);
        h.assert_ledger_matches(user_id).await;
    }

    #[tokio::test]
    async fn progress_is_recorded_for_unearned_badges() {
        let h = Harness::new().await;
        let user_id = h.user().await;
        let dest = h.destination("BOR-001", 11.9674, 121.9248, 10, "beach").await;
        let Ok(_) = h.check_in_at(user_id, &dest).await else {
            panic!("check-in failed");
        };

        let Ok(rows) = h.store.user_badges(user_id).await else {
            panic!("read failed");
        };
        let Ok(catalog) = h.store.list_badges().await else {
            panic!("read failed");
        };
        let Some(wanderer) = catalog.iter().find(|b| b.slug == "wanderer") else {
            panic!("wanderer badge missing");
        };
        let Some(row) = rows.iter().find(|r| r.badge_id == wanderer.id) else {
            panic!("progress row missing");
        };
        assert_eq!(row.progress, 1);
        assert!(!row.is_earned);
    }

    #[tokio::test]
    async fn failed_upsert_rolls_back_everything() {
        let h = Harness::new().await;
        let user_id = h.user().await;
        let dest = h.destination("PAL-001", 9.8349, 118.7384, 25, "nature").await;

        h.memory.inject_fault(FaultPoint::UpsertUserBadge);
        let result = h.check_in_at(user_id, &dest).await;
        assert!(matches!(result, Err(RewardsError::PersistenceError(_))));

        let Ok(user) = h.store.get_user(user_id).await else {
            panic!("user missing");
        };
        assert_eq!(user.total_points, 0);
        let Ok(check_ins) = h.store.user_check_ins(user_id, 10).await else {
            panic!("read failed");
        };
        assert!(check_ins.is_empty());
        h.assert_ledger_matches(user_id).await;
    }

    #[tokio::test]
    async fn inactive_user_cannot_evaluate() {
        let h = Harness::new().await;
        let user_id = h.user_with_status(UserStatus::Suspended).await;
        let result = h.badges().evaluate_and_award(user_id).await;
        assert!(matches!(result, Err(RewardsError::AccountInactive(_))));
    }
}
