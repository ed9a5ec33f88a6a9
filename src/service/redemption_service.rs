//! Reward redemption lifecycle: redeem, change, claim and expire.
//!
//! Lock order in every flow is user, then redemption, then rewards in id
//! order. Points move only through the ledger, stock only through
//! [`Reward::take_stock`] / [`Reward::restore_stock`], and status only
//! through [`RedemptionStatus::apply`](crate::domain::RedemptionStatus::apply).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::catalog_service::CatalogService;
use super::clock::Clock;
use super::codes::CodeGenerator;
use super::ledger::{self, LedgerEntry};
use crate::domain::{
    DestinationId, EventBus, LedgerReference, Redemption, RedemptionAction, RedemptionId,
    RedemptionStatus, Reward, RewardId, RewardsEvent, TransactionType, UserId,
};
use crate::error::RewardsError;
use crate::persistence::{Store, StoreTx};

/// Attempts at drawing an unused redemption code before giving up.
const CODE_ATTEMPTS: usize = 5;

/// A redemption with the reward it currently points at.
#[derive(Debug, Clone)]
pub struct RedemptionReceipt {
    /// The redemption after the operation.
    pub redemption: Redemption,
    /// The reward redeemed.
    pub reward: Reward,
    /// Caller's balance after the operation.
    pub total_points: i64,
}

/// Orchestrates the redemption state machine.
#[derive(Debug, Clone)]
pub struct RedemptionService {
    store: Store,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    codes: Arc<dyn CodeGenerator>,
    catalog: CatalogService,
}

impl RedemptionService {
    /// Creates a new `RedemptionService`.
    #[must_use]
    pub fn new(
        store: Store,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
        codes: Arc<dyn CodeGenerator>,
        catalog: CatalogService,
    ) -> Self {
        Self {
            store,
            clock,
            event_bus,
            codes,
            catalog,
        }
    }

    /// Spends points on a reward and issues a claim code.
    ///
    /// # Errors
    ///
    /// - [`RewardsError::RewardNotFound`] for an unknown reward.
    /// - [`RewardsError::RewardUnavailable`] when inactive, outside its
    ///   window or bound to a different destination.
    /// - [`RewardsError::OutOfStock`], [`RewardsError::RedemptionLimit`],
    ///   [`RewardsError::InsufficientPoints`].
    /// - [`RewardsError::AccountInactive`] for non-active users.
    /// - [`RewardsError::PersistenceError`] on storage failure.
    pub async fn redeem(
        &self,
        user_id: UserId,
        reward_id: RewardId,
        destination_id: Option<DestinationId>,
    ) -> Result<RedemptionReceipt, RewardsError> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        tx.lock_user(user_id).await?.ensure_active()?;

        let mut reward = tx.lock_reward(reward_id).await?;
        if let (Some(requested), Some(bound)) = (destination_id, reward.destination_id) {
            if requested != bound {
                return Err(RewardsError::RewardUnavailable(format!(
                    "reward {reward_id} is not offered at destination {requested}"
                )));
            }
        }

        let redemption_id = RedemptionId::new();
        self.charge(&mut tx, user_id, &mut reward, redemption_id, now)
            .await?;
        let code = self.unused_code(&mut tx).await?;

        let redemption = Redemption {
            id: redemption_id,
            user_id,
            reward_id,
            destination_id: reward.destination_id.or(destination_id),
            points_spent: reward.points_required,
            redemption_code: code,
            status: RedemptionStatus::Active,
            valid_until: reward.redemption_expiry(now),
            redeemed_at: now,
            used_at: None,
            used_location: None,
            verified_by: None,
            updated_at: now,
        };
        tx.insert_redemption(&redemption).await?;
        let total_points = tx.lock_user(user_id).await?.total_points;
        tx.commit().await?;
        self.catalog.invalidate_rewards().await;

        let _ = self.event_bus.publish(RewardsEvent::RewardRedeemed {
            user_id,
            redemption_id,
            reward_id,
            points_spent: redemption.points_spent,
            timestamp: now,
        });
        tracing::info!(
            %user_id,
            %reward_id,
            %redemption_id,
            points_spent = redemption.points_spent,
            total_points,
            "reward redeemed"
        );
        Ok(RedemptionReceipt {
            redemption,
            reward,
            total_points,
        })
    }

    /// Swaps a live redemption to another reward.
    ///
    /// Refunds the original price, returns the original unit of stock, then
    /// charges the new reward, all in one transaction. On any failure the
    /// original redemption is left exactly as it was. The claim code is kept.
    ///
    /// # Errors
    ///
    /// - [`RewardsError::RedemptionNotFound`] if the redemption does not
    ///   exist or belongs to someone else.
    /// - [`RewardsError::AlreadyUsed`] / [`RewardsError::AlreadyExpired`].
    /// - [`RewardsError::InvalidRequest`] when swapping to the same reward.
    /// - Any error of [`Self::redeem`] for the new reward.
    pub async fn change(
        &self,
        user_id: UserId,
        redemption_id: RedemptionId,
        new_reward_id: RewardId,
    ) -> Result<RedemptionReceipt, RewardsError> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        tx.lock_user(user_id).await?.ensure_active()?;

        let mut redemption = tx.lock_redemption(redemption_id).await?;
        if redemption.user_id != user_id {
            return Err(RewardsError::RedemptionNotFound(redemption_id.to_string()));
        }
        let status = redemption.status.apply(RedemptionAction::Change)?;
        if redemption.is_overdue(now) {
            return Err(RewardsError::AlreadyExpired);
        }
        let old_reward_id = redemption.reward_id;
        if old_reward_id == new_reward_id {
            return Err(RewardsError::InvalidRequest(
                "redemption already holds this reward".to_string(),
            ));
        }

        let (mut old_reward, mut new_reward) = if old_reward_id < new_reward_id {
            let old = tx.lock_reward(old_reward_id).await?;
            (old, tx.lock_reward(new_reward_id).await?)
        } else {
            let new = tx.lock_reward(new_reward_id).await?;
            (tx.lock_reward(old_reward_id).await?, new)
        };

        ledger::append(
            &mut tx,
            LedgerEntry {
                user_id,
                delta: redemption.points_spent,
                transaction_type: TransactionType::Refunded,
                reference: LedgerReference::Redemption(redemption_id),
                description: format!("changed from {}", old_reward.name),
            },
            now,
        )
        .await?;
        old_reward.restore_stock();
        tx.update_reward(&old_reward).await?;

        self.charge(&mut tx, user_id, &mut new_reward, redemption_id, now)
            .await?;

        redemption.reward_id = new_reward_id;
        redemption.destination_id = new_reward.destination_id.or(redemption.destination_id);
        redemption.points_spent = new_reward.points_required;
        redemption.valid_until = new_reward.redemption_expiry(now);
        redemption.status = status;
        redemption.updated_at = now;
        tx.update_redemption(&redemption).await?;
        let total_points = tx.lock_user(user_id).await?.total_points;
        tx.commit().await?;
        self.catalog.invalidate_rewards().await;

        let _ = self.event_bus.publish(RewardsEvent::RedemptionChanged {
            user_id,
            redemption_id,
            from_reward_id: old_reward_id,
            to_reward_id: new_reward_id,
            timestamp: now,
        });
        tracing::info!(
            %user_id,
            %redemption_id,
            from = %old_reward_id,
            to = %new_reward_id,
            total_points,
            "redemption changed"
        );
        Ok(RedemptionReceipt {
            redemption,
            reward: new_reward,
            total_points,
        })
    }

    /// Marks the redemption with `code` as used. `verified_by` is the staff
    /// member (or owner) presenting the code.
    ///
    /// # Errors
    ///
    /// - [`RewardsError::RedemptionNotFound`] for an unknown code.
    /// - [`RewardsError::AlreadyUsed`] / [`RewardsError::AlreadyExpired`],
    ///   including a live redemption whose deadline has passed.
    /// - [`RewardsError::AccountInactive`] if the verifier is not active.
    /// - [`RewardsError::PersistenceError`] on storage failure.
    pub async fn claim(
        &self,
        verified_by: UserId,
        code: &str,
        location: Option<String>,
    ) -> Result<Redemption, RewardsError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(RewardsError::InvalidRequest("code must not be empty".to_string()));
        }
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        tx.lock_user(verified_by).await?.ensure_active()?;

        let mut redemption = tx.lock_redemption_by_code(code).await?;
        redemption.claim(now, location, verified_by)?;
        tx.update_redemption(&redemption).await?;
        tx.commit().await?;

        let _ = self.event_bus.publish(RewardsEvent::RedemptionClaimed {
            user_id: redemption.user_id,
            redemption_id: redemption.id,
            timestamp: now,
        });
        tracing::info!(
            redemption_id = %redemption.id,
            user_id = %redemption.user_id,
            %verified_by,
            "redemption claimed"
        );
        Ok(redemption)
    }

    /// Expires one overdue redemption: refunds its points and returns its
    /// stock. Returns `Ok(None)` if it is no longer live or not yet overdue,
    /// which happens when a concurrent flow got to it first.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError`] on storage failure; nothing is written then.
    pub async fn expire(
        &self,
        user_id: UserId,
        redemption_id: RedemptionId,
    ) -> Result<Option<Redemption>, RewardsError> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        tx.lock_user(user_id).await?;

        let mut redemption = tx.lock_redemption(redemption_id).await?;
        if redemption.user_id != user_id || !redemption.is_overdue(now) {
            return Ok(None);
        }
        redemption.expire(now)?;

        let mut reward = tx.lock_reward(redemption.reward_id).await?;
        reward.restore_stock();
        tx.update_reward(&reward).await?;

        ledger::append(
            &mut tx,
            LedgerEntry {
                user_id,
                delta: redemption.points_spent,
                transaction_type: TransactionType::Refunded,
                reference: LedgerReference::Redemption(redemption_id),
                description: format!("expired: {}", reward.name),
            },
            now,
        )
        .await?;
        tx.update_redemption(&redemption).await?;
        tx.commit().await?;

        let _ = self.event_bus.publish(RewardsEvent::RedemptionExpired {
            user_id,
            redemption_id,
            points_refunded: redemption.points_spent,
            timestamp: now,
        });
        tracing::info!(
            %user_id,
            %redemption_id,
            points_refunded = redemption.points_spent,
            "redemption expired"
        );
        Ok(Some(redemption))
    }

    /// Redemptions of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Redemption>, RewardsError> {
        self.store.user_redemptions(user_id).await
    }

    /// Checks redeemability, debits the price and takes a unit of stock.
    async fn charge(
        &self,
        tx: &mut StoreTx,
        user_id: UserId,
        reward: &mut Reward,
        redemption_id: RedemptionId,
        now: DateTime<Utc>,
    ) -> Result<(), RewardsError> {
        reward.ensure_redeemable(now)?;
        if let Some(limit) = reward.max_redemptions_per_user {
            if tx.count_live_redemptions(user_id, reward.id).await? >= limit {
                return Err(RewardsError::RedemptionLimit { limit });
            }
        }

        ledger::append(
            tx,
            LedgerEntry {
                user_id,
                delta: reward.points_required.saturating_neg(),
                transaction_type: TransactionType::Redeemed,
                reference: LedgerReference::Redemption(redemption_id),
                description: format!("redeemed: {}", reward.name),
            },
            now,
        )
        .await?;
        reward.take_stock()?;
        tx.update_reward(reward).await
    }

    async fn unused_code(&self, tx: &mut StoreTx) -> Result<String, RewardsError> {
        for _ in 0..CODE_ATTEMPTS {
            let code = self.codes.generate();
            if !tx.redemption_code_exists(&code).await? {
                return Ok(code);
            }
        }
        Err(RewardsError::Internal(
            "could not generate a unique redemption code".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::persistence::FaultPoint;
    use crate::service::testing::Harness;

    #[tokio::test]
    async fn redeem_debits_points_and_stock() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(500).await;
        let reward = h.reward(100, Some(3)).await;

        let Ok(receipt) = h.redemptions().redeem(user_id, reward.id, None).await else {
            panic!("redeem failed");
        };
        assert_eq!(receipt.total_points, 400);
        assert_eq!(receipt.reward.stock_quantity, Some(2));
        assert_eq!(receipt.reward.total_redeemed, 1);
        assert_eq!(receipt.redemption.status, RedemptionStatus::Active);
        assert_eq!(receipt.redemption.valid_until, h.clock_now() + Duration::days(7));
        assert!(receipt.redemption.redemption_code.starts_with("TP-"));
        h.assert_ledger_matches(user_id).await;
    }

    #[tokio::test]
    async fn last_unit_then_expiry_restores_stock_and_refunds() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(300).await;
        let reward = h.reward(100, Some(1)).await;
        let service = h.redemptions();

        let Ok(first) = service.redeem(user_id, reward.id, None).await else {
            panic!("first redeem failed");
        };
        let second = service.redeem(user_id, reward.id, None).await;
        assert!(matches!(second, Err(RewardsError::OutOfStock(_))));

        h.clock.advance(Duration::days(8));
        let Ok(Some(expired)) = service.expire(user_id, first.redemption.id).await else {
            panic!("expiry failed");
        };
        assert_eq!(expired.status, RedemptionStatus::Expired);

        let stored = h.reward_by_id(reward.id).await;
        assert_eq!(stored.stock_quantity, Some(1));
        assert_eq!(stored.total_redeemed, 0);
        let Ok(user) = h.store.get_user(user_id).await else {
            panic!("user missing");
        };
        assert_eq!(user.total_points, 300);
        h.assert_ledger_matches(user_id).await;

        // Expiring again is a no-op.
        let Ok(None) = service.expire(user_id, first.redemption.id).await else {
            panic!("second expiry should be a no-op");
        };
    }

    #[tokio::test]
    async fn change_charges_only_the_new_price() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(1_000).await;
        let a = h.reward(100, Some(5)).await;
        let b = h.reward(150, Some(5)).await;
        let service = h.redemptions();

        let Ok(original) = service.redeem(user_id, a.id, None).await else {
            panic!("redeem failed");
        };
        let Ok(changed) = service.change(user_id, original.redemption.id, b.id).await else {
            panic!("change failed");
        };
        assert_eq!(changed.total_points, 850);
        assert_eq!(changed.redemption.reward_id, b.id);
        assert_eq!(changed.redemption.points_spent, 150);
        assert_eq!(
            changed.redemption.redemption_code,
            original.redemption.redemption_code
        );

        assert_eq!(h.reward_by_id(a.id).await.stock_quantity, Some(5));
        assert_eq!(h.reward_by_id(b.id).await.stock_quantity, Some(4));
        h.assert_ledger_matches(user_id).await;
    }

    #[tokio::test]
    async fn failed_change_leaves_original_untouched() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(200).await;
        let a = h.reward(100, Some(5)).await;
        let pricey = h.reward(250, Some(5)).await;
        let service = h.redemptions();

        let Ok(original) = service.redeem(user_id, a.id, None).await else {
            panic!("redeem failed");
        };
        // 100 left + 100 refund = 200 < 250
        let result = service.change(user_id, original.redemption.id, pricey.id).await;
        assert!(matches!(
            result,
            Err(RewardsError::InsufficientPoints {
                required: 250,
                available: 200
            })
        ));

        let Ok(list) = service.list_for_user(user_id).await else {
            panic!("list failed");
        };
        assert_eq!(list.first().map(|r| r.reward_id), Some(a.id));
        assert_eq!(h.reward_by_id(a.id).await.stock_quantity, Some(4));
        assert_eq!(h.reward_by_id(pricey.id).await.stock_quantity, Some(5));
        let Ok(user) = h.store.get_user(user_id).await else {
            panic!("user missing");
        };
        assert_eq!(user.total_points, 100);
        h.assert_ledger_matches(user_id).await;
    }

    #[tokio::test]
    async fn claim_then_every_transition_is_rejected() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(500).await;
        let staff = h.user().await;
        let a = h.reward(100, None).await;
        let b = h.reward(100, None).await;
        let service = h.redemptions();

        let Ok(receipt) = service.redeem(user_id, a.id, None).await else {
            panic!("redeem failed");
        };
        let code = receipt.redemption.redemption_code.to_lowercase();
        let Ok(used) = service
            .claim(staff, &code, Some("front desk".to_string()))
            .await
        else {
            panic!("claim failed");
        };
        assert_eq!(used.status, RedemptionStatus::Used);
        assert_eq!(used.verified_by, Some(staff));
        assert_eq!(used.used_location.as_deref(), Some("front desk"));

        let again = service.claim(staff, &code, None).await;
        assert!(matches!(again, Err(RewardsError::AlreadyUsed)));
        let swap = service.change(user_id, receipt.redemption.id, b.id).await;
        assert!(matches!(swap, Err(RewardsError::AlreadyUsed)));

        h.clock.advance(Duration::days(30));
        let Ok(None) = service.expire(user_id, receipt.redemption.id).await else {
            panic!("used redemptions never expire");
        };
        h.assert_ledger_matches(user_id).await;
    }

    #[tokio::test]
    async fn overdue_claim_is_rejected_without_writing() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(500).await;
        let reward = h.reward(100, Some(1)).await;
        let service = h.redemptions();

        let Ok(receipt) = service.redeem(user_id, reward.id, None).await else {
            panic!("redeem failed");
        };
        h.clock.advance(Duration::days(8));
        let result = service
            .claim(user_id, &receipt.redemption.redemption_code, None)
            .await;
        assert!(matches!(result, Err(RewardsError::AlreadyExpired)));

        let Ok(list) = service.list_for_user(user_id).await else {
            panic!("list failed");
        };
        assert_eq!(list.first().map(|r| r.status), Some(RedemptionStatus::Active));
    }

    #[tokio::test]
    async fn per_user_limit_ignores_expired_redemptions() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(1_000).await;
        let reward = h.reward_with_limit(100, 1).await;
        let service = h.redemptions();

        let Ok(first) = service.redeem(user_id, reward.id, None).await else {
            panic!("redeem failed");
        };
        let capped = service.redeem(user_id, reward.id, None).await;
        assert!(matches!(
            capped,
            Err(RewardsError::RedemptionLimit { limit: 1 })
        ));

        h.clock.advance(Duration::days(8));
        let Ok(Some(_)) = service.expire(user_id, first.redemption.id).await else {
            panic!("expiry failed");
        };
        assert!(service.redeem(user_id, reward.id, None).await.is_ok());
        h.assert_ledger_matches(user_id).await;
    }

    #[tokio::test]
    async fn destination_binding_is_enforced() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(500).await;
        let venue = h.destination("CAFE-1", 14.0, 121.0, 10, "food").await;
        let other = h.destination("CAFE-2", 14.1, 121.1, 10, "food").await;
        let reward = h.reward_at(100, venue.id).await;

        let wrong = h.redemptions().redeem(user_id, reward.id, Some(other.id)).await;
        assert!(matches!(wrong, Err(RewardsError::RewardUnavailable(_))));
        let Ok(right) = h.redemptions().redeem(user_id, reward.id, Some(venue.id)).await else {
            panic!("redeem failed");
        };
        assert_eq!(right.redemption.destination_id, Some(venue.id));
    }

    #[tokio::test]
    async fn change_moves_redemption_to_new_destination() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(500).await;
        let cafe = h.destination("CAFE-1", 14.0, 121.0, 10, "food").await;
        let museum = h.destination("MUSEO-1", 14.1, 121.1, 10, "museum").await;
        let coffee = h.reward_at(100, cafe.id).await;
        let tour = h.reward_at(150, museum.id).await;
        let service = h.redemptions();

        let Ok(original) = service.redeem(user_id, coffee.id, Some(cafe.id)).await else {
            panic!("redeem failed");
        };
        let Ok(changed) = service.change(user_id, original.redemption.id, tour.id).await else {
            panic!("change failed");
        };
        assert_eq!(changed.redemption.destination_id, Some(museum.id));

        let Ok(list) = service.list_for_user(user_id).await else {
            panic!("list failed");
        };
        let Some(stored) = list.first() else {
            panic!("redemption missing");
        };
        assert_eq!(stored.reward_id, tour.id);
        assert_eq!(stored.destination_id, Some(museum.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn racing_redeems_sell_the_last_unit_once() {
        let h = Harness::new().await;
        let ana = h.user_with_points(300).await;
        let ben = h.user_with_points(300).await;
        let reward = h.reward(100, Some(1)).await;
        let service = h.redemptions();

        let (a, b) = tokio::join!(
            service.redeem(ana, reward.id, None),
            service.redeem(ben, reward.id, None),
        );
        let (won, lost) = match (a, b) {
            (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
            (a, b) => panic!("exactly one redeem should win: {a:?} / {b:?}"),
        };
        assert!(matches!(lost, RewardsError::OutOfStock(_)));
        assert_eq!(won.total_points, 200);

        let stored = h.reward_by_id(reward.id).await;
        assert_eq!(stored.stock_quantity, Some(0));
        assert_eq!(stored.total_redeemed, 1);
        h.assert_ledger_matches(ana).await;
        h.assert_ledger_matches(ben).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn racing_redeems_cannot_overdraw_one_balance() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(150).await;
        let coffee = h.reward(100, None).await;
        let tour = h.reward(100, None).await;
        let service = h.redemptions();

        let (a, b) = tokio::join!(
            service.redeem(user_id, coffee.id, None),
            service.redeem(user_id, tour.id, None),
        );
        let lost = match (a, b) {
            (Ok(_), Err(lost)) | (Err(lost), Ok(_)) => lost,
            (a, b) => panic!("exactly one redeem should win: {a:?} / {b:?}"),
        };
        assert!(matches!(
            lost,
            RewardsError::InsufficientPoints {
                required: 100,
                available: 50
            }
        ));

        let Ok(user) = h.store.get_user(user_id).await else {
            panic!("user missing");
        };
        assert_eq!(user.total_points, 50);
        h.assert_ledger_matches(user_id).await;
    }

    #[tokio::test]
    async fn insufficient_points_and_failed_insert_roll_back() {
        let h = Harness::new().await;
        let user_id = h.user_with_points(50).await;
        let reward = h.reward(100, Some(2)).await;
        let service = h.redemptions();

        let poor = service.redeem(user_id, reward.id, None).await;
        assert!(matches!(poor, Err(RewardsError::InsufficientPoints { .. })));

        let rich = h.user_with_points(500).await;
        h.memory.inject_fault(FaultPoint::InsertRedemption);
        let failed = service.redeem(rich, reward.id, None).await;
        assert!(matches!(failed, Err(RewardsError::PersistenceError(_))));
        assert_eq!(h.reward_by_id(reward.id).await.stock_quantity, Some(2));
        h.assert_ledger_matches(user_id).await;
        h.assert_ledger_matches(rich).await;
    }

    #[tokio::test]
    async fn other_users_redemptions_are_invisible() {
        let h = Harness::new().await;
        let owner = h.user_with_points(500).await;
        let intruder = h.user_with_points(500).await;
        let a = h.reward(100, None).await;
        let b = h.reward(100, None).await;

        let Ok(receipt) = h.redemptions().redeem(owner, a.id, None).await else {
            panic!("redeem failed");
        };
        let result = h
            .redemptions()
            .change(intruder, receipt.redemption.id, b.id)
            .await;
        assert!(matches!(result, Err(RewardsError::RedemptionNotFound(_))));
    }
}
