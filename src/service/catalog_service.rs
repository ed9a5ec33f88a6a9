//! Catalog reads and writes: destinations, rewards and badges.
//!
//! Reads go through [`CachedCollection`]s. Every write that changes a
//! cached collection invalidates it after commit.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::cache::CachedCollection;
use super::clock::Clock;
use crate::domain::geo::Coordinates;
use crate::domain::{Badge, Destination, DestinationId, Reward, RewardId};
use crate::error::RewardsError;
use crate::persistence::Store;

/// Input for a new destination.
#[derive(Debug, Clone)]
pub struct NewDestination {
    /// Display name.
    pub name: String,
    /// Category used by `category_count` badges.
    pub category: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Own visit radius in meters; the policy default applies when `None`.
    pub visit_radius_m: Option<f64>,
    /// Base points for a check-in.
    pub points_reward: i64,
    /// Code printed on the destination's QR sign.
    pub qr_code: String,
}

/// Input for a new reward.
#[derive(Debug, Clone)]
pub struct NewReward {
    /// Display name.
    pub name: String,
    /// Longer description.
    pub description: String,
    /// Partner destination, if the reward is bound to one.
    pub destination_id: Option<DestinationId>,
    /// Price in points.
    pub points_required: i64,
    /// Units available; `None` means unlimited.
    pub stock_quantity: Option<i64>,
    /// Per-user cap on live redemptions.
    pub max_redemptions_per_user: Option<i64>,
    /// Start of the offer window.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the offer window.
    pub valid_until: Option<DateTime<Utc>>,
    /// Days a redemption stays claimable.
    pub redemption_period_days: i64,
}

/// Partial update of a reward.
#[derive(Debug, Clone, Default)]
pub struct RewardUpdate {
    /// New activation flag.
    pub is_active: Option<bool>,
    /// Units to add to limited stock.
    pub restock: Option<i64>,
    /// New start of the offer window.
    pub valid_from: Option<DateTime<Utc>>,
    /// New end of the offer window.
    pub valid_until: Option<DateTime<Utc>>,
}

/// Catalog access with explicit cache invalidation.
#[derive(Debug, Clone)]
pub struct CatalogService {
    store: Store,
    clock: Arc<dyn Clock>,
    destinations: Arc<CachedCollection<Destination>>,
    rewards: Arc<CachedCollection<Reward>>,
    badges: Arc<CachedCollection<Badge>>,
}

impl CatalogService {
    /// Creates a catalog service whose caches live at most `ttl`.
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            destinations: Arc::new(CachedCollection::new(ttl)),
            rewards: Arc::new(CachedCollection::new(ttl)),
            badges: Arc::new(CachedCollection::new(ttl)),
        }
    }

    /// Active destinations, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn destinations(&self) -> Result<Arc<Vec<Destination>>, RewardsError> {
        self.destinations
            .get_or_load(|| self.store.list_destinations())
            .await
    }

    /// Active rewards, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn rewards(&self) -> Result<Arc<Vec<Reward>>, RewardsError> {
        self.rewards.get_or_load(|| self.store.list_rewards()).await
    }

    /// Active, non-hidden badges.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn visible_badges(&self) -> Result<Vec<Badge>, RewardsError> {
        let all = self.badges.get_or_load(|| self.store.list_badges()).await?;
        Ok(all
            .iter()
            .filter(|b| b.is_active && !b.is_hidden)
            .cloned()
            .collect())
    }

    /// All badges, hidden and inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn all_badges(&self) -> Result<Arc<Vec<Badge>>, RewardsError> {
        self.badges.get_or_load(|| self.store.list_badges()).await
    }

    /// Adds a destination.
    ///
    /// # Errors
    ///
    /// - [`RewardsError::InvalidRequest`] for invalid fields or a code that
    ///   is already in use.
    /// - [`RewardsError::PersistenceError`] on storage failure.
    pub async fn create_destination(
        &self,
        input: NewDestination,
    ) -> Result<Destination, RewardsError> {
        Coordinates::new(input.latitude, input.longitude)?;
        let qr_code = input.qr_code.trim().to_string();
        if input.name.trim().is_empty() || qr_code.is_empty() {
            return Err(RewardsError::InvalidRequest(
                "name and qr_code are required".to_string(),
            ));
        }
        if input.points_reward < 0 {
            return Err(RewardsError::InvalidRequest(
                "points_reward must not be negative".to_string(),
            ));
        }
        if input
            .visit_radius_m
            .is_some_and(|r| !r.is_finite() || r <= 0.0)
        {
            return Err(RewardsError::InvalidRequest(
                "visit_radius_m must be positive".to_string(),
            ));
        }

        let destination = Destination {
            id: DestinationId::new(),
            name: input.name.trim().to_string(),
            category: input.category.trim().to_ascii_lowercase(),
            latitude: input.latitude,
            longitude: input.longitude,
            visit_radius_m: input.visit_radius_m,
            points_reward: input.points_reward,
            qr_code,
            is_active: true,
            created_at: self.clock.now(),
        };

        let mut tx = self.store.begin().await?;
        if tx
            .find_destination_by_code(&destination.qr_code)
            .await?
            .is_some()
        {
            return Err(RewardsError::InvalidRequest(format!(
                "qr_code {} is already in use",
                destination.qr_code
            )));
        }
        tx.insert_destination(&destination).await?;
        tx.commit().await?;
        self.destinations.invalidate().await;

        tracing::info!(destination_id = %destination.id, name = %destination.name, "destination created");
        Ok(destination)
    }

    /// Adds a reward.
    ///
    /// # Errors
    ///
    /// - [`RewardsError::InvalidRequest`] for invalid fields.
    /// - [`RewardsError::DestinationNotFound`] for an unknown partner destination.
    /// - [`RewardsError::PersistenceError`] on storage failure.
    pub async fn create_reward(&self, input: NewReward) -> Result<Reward, RewardsError> {
        if input.name.trim().is_empty() {
            return Err(RewardsError::InvalidRequest("name is required".to_string()));
        }
        if input.points_required < 0
            || input.stock_quantity.is_some_and(|q| q < 0)
            || input.redemption_period_days < 0
            || input.max_redemptions_per_user.is_some_and(|m| m < 1)
        {
            return Err(RewardsError::InvalidRequest(
                "numeric reward fields out of range".to_string(),
            ));
        }
        check_window(input.valid_from, input.valid_until)?;

        let reward = Reward {
            id: RewardId::new(),
            name: input.name.trim().to_string(),
            description: input.description,
            destination_id: input.destination_id,
            points_required: input.points_required,
            stock_quantity: input.stock_quantity,
            stock_unlimited: input.stock_quantity.is_none(),
            max_redemptions_per_user: input.max_redemptions_per_user,
            valid_from: input.valid_from,
            valid_until: input.valid_until,
            redemption_period_days: input.redemption_period_days,
            total_redeemed: 0,
            is_active: true,
            created_at: self.clock.now(),
        };

        let mut tx = self.store.begin().await?;
        if let Some(destination_id) = reward.destination_id {
            tx.get_destination(destination_id)
                .await?
                .ok_or_else(|| RewardsError::DestinationNotFound(destination_id.to_string()))?;
        }
        tx.insert_reward(&reward).await?;
        tx.commit().await?;
        self.rewards.invalidate().await;

        tracing::info!(reward_id = %reward.id, name = %reward.name, "reward created");
        Ok(reward)
    }

    /// Toggles activation, restocks or moves the offer window of a reward.
    ///
    /// # Errors
    ///
    /// - [`RewardsError::RewardNotFound`] for an unknown reward.
    /// - [`RewardsError::InvalidRequest`] for a restock below one unit, a restock
    ///   of an unlimited reward or an inverted window.
    /// - [`RewardsError::PersistenceError`] on storage failure.
    pub async fn update_reward(
        &self,
        reward_id: RewardId,
        update: RewardUpdate,
    ) -> Result<Reward, RewardsError> {
        let mut tx = self.store.begin().await?;
        let mut reward = tx.lock_reward(reward_id).await?;

        if let Some(is_active) = update.is_active {
            reward.is_active = is_active;
        }
        if let Some(units) = update.restock {
            if units <= 0 || reward.stock_unlimited {
                return Err(RewardsError::InvalidRequest(
                    "restock must be positive and the reward must have limited stock".to_string(),
                ));
            }
            reward.stock_quantity = Some(reward.stock_quantity.unwrap_or(0).saturating_add(units));
        }
        if update.valid_from.is_some() {
            reward.valid_from = update.valid_from;
        }
        if update.valid_until.is_some() {
            reward.valid_until = update.valid_until;
        }
        check_window(reward.valid_from, reward.valid_until)?;

        tx.update_reward(&reward).await?;
        tx.commit().await?;
        self.rewards.invalidate().await;

        tracing::info!(
            %reward_id,
            is_active = reward.is_active,
            stock = ?reward.stock_quantity,
            "reward updated"
        );
        Ok(reward)
    }

    /// Drops the cached reward list. Called after commits that move stock.
    pub async fn invalidate_rewards(&self) {
        self.rewards.invalidate().await;
    }
}

fn check_window(
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<(), RewardsError> {
    match (from, until) {
        (Some(from), Some(until)) if until < from => Err(RewardsError::InvalidRequest(
            "valid_until must not precede valid_from".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::service::testing::Harness;

    fn manila(code: &str) -> NewDestination {
        NewDestination {
            name: "Intramuros".to_string(),
            category: "Heritage".to_string(),
            latitude: 14.5896,
            longitude: 120.9747,
            visit_radius_m: None,
            points_reward: 40,
            qr_code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn destination_writes_invalidate_the_cache() {
        let h = Harness::new().await;
        let catalog = h.catalog();
        let Ok(before) = catalog.destinations().await else {
            panic!("list failed");
        };
        assert!(before.is_empty());

        let Ok(created) = catalog.create_destination(manila("INTRA-1")).await else {
            panic!("create failed");
        };
        assert_eq!(created.category, "heritage");
        let Ok(after) = catalog.destinations().await else {
            panic!("list failed");
        };
        assert_eq!(after.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_codes_are_rejected_case_insensitively() {
        let h = Harness::new().await;
        let catalog = h.catalog();
        assert!(catalog.create_destination(manila("INTRA-1")).await.is_ok());
        let dup = catalog.create_destination(manila("intra-1")).await;
        assert!(matches!(dup, Err(RewardsError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn restock_and_deactivate_reward() {
        let h = Harness::new().await;
        let reward = h.reward(100, Some(1)).await;
        let catalog = h.catalog();

        let Ok(updated) = catalog
            .update_reward(
                reward.id,
                RewardUpdate {
                    restock: Some(4),
                    is_active: Some(false),
                    ..RewardUpdate::default()
                },
            )
            .await
        else {
            panic!("update failed");
        };
        assert_eq!(updated.stock_quantity, Some(5));
        assert!(!updated.is_active);

        let Ok(listed) = catalog.rewards().await else {
            panic!("list failed");
        };
        assert!(listed.iter().all(|r| r.id != reward.id));
    }

    #[tokio::test]
    async fn restock_needs_at_least_one_unit() {
        let h = Harness::new().await;
        let reward = h.reward(100, Some(1)).await;
        let catalog = h.catalog();

        for units in [0, -3] {
            let result = catalog
                .update_reward(
                    reward.id,
                    RewardUpdate {
                        restock: Some(units),
                        ..RewardUpdate::default()
                    },
                )
                .await;
            assert!(
                matches!(result, Err(RewardsError::InvalidRequest(_))),
                "restock {units} was accepted"
            );
        }
        assert_eq!(h.reward_by_id(reward.id).await.stock_quantity, Some(1));
    }

    #[tokio::test]
    async fn reward_bound_to_unknown_destination_is_rejected() {
        let h = Harness::new().await;
        let result = h
            .catalog()
            .create_reward(NewReward {
                name: "Tour".to_string(),
                description: String::new(),
                destination_id: Some(DestinationId::new()),
                points_required: 10,
                stock_quantity: None,
                max_redemptions_per_user: None,
                valid_from: None,
                valid_until: None,
                redemption_period_days: 30,
            })
            .await;
        assert!(matches!(result, Err(RewardsError::DestinationNotFound(_))));
    }

    #[tokio::test]
    async fn hidden_badges_are_not_listed() {
        let h = Harness::new().await;
        let Ok(visible) = h.catalog().visible_badges().await else {
            panic!("list failed");
        };
        assert_eq!(visible.len(), crate::domain::badge::default_catalog().len());
    }
}
