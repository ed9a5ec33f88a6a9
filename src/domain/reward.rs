//! Redeemable rewards offered by partner venues.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{DestinationId, RewardId};
use crate::error::RewardsError;

/// A reward users spend points on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    /// Reward identifier.
    pub id: RewardId,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Partner destination where the reward is claimed, if bound to one.
    pub destination_id: Option<DestinationId>,
    /// Price in points.
    pub points_required: i64,
    /// Remaining stock; ignored when `stock_unlimited`.
    pub stock_quantity: Option<i64>,
    /// Stock is never depleted.
    pub stock_unlimited: bool,
    /// Cap on live (non-expired) redemptions per user.
    pub max_redemptions_per_user: Option<i64>,
    /// Start of the offer window.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the offer window.
    pub valid_until: Option<DateTime<Utc>>,
    /// Days a redemption stays claimable.
    pub redemption_period_days: i64,
    /// Live redemptions counter.
    pub total_redeemed: i64,
    /// Inactive rewards cannot be redeemed.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Reward {
    /// Checks activation, offer window and stock.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::RewardUnavailable`] when inactive or outside
    /// the window, and [`RewardsError::OutOfStock`] when no stock is left.
    pub fn ensure_redeemable(&self, now: DateTime<Utc>) -> Result<(), RewardsError> {
        if !self.is_active {
            return Err(RewardsError::RewardUnavailable(format!(
                "reward {} is not active",
                self.id
            )));
        }
        if self.valid_from.is_some_and(|from| now < from) {
            return Err(RewardsError::RewardUnavailable(format!(
                "reward {} is not yet available",
                self.id
            )));
        }
        if self.valid_until.is_some_and(|until| now > until) {
            return Err(RewardsError::RewardUnavailable(format!(
                "reward {} is no longer available",
                self.id
            )));
        }
        if !self.has_stock() {
            return Err(RewardsError::OutOfStock(*self.id.as_uuid()));
        }
        Ok(())
    }

    /// `true` when at least one unit can be handed out.
    #[must_use]
    pub fn has_stock(&self) -> bool {
        self.stock_unlimited || self.stock_quantity.is_some_and(|qty| qty > 0)
    }

    /// Takes one unit of stock and counts the redemption.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::OutOfStock`] when no stock is left.
    pub fn take_stock(&mut self) -> Result<(), RewardsError> {
        if !self.has_stock() {
            return Err(RewardsError::OutOfStock(*self.id.as_uuid()));
        }
        if !self.stock_unlimited {
            self.stock_quantity = self.stock_quantity.map(|qty| qty - 1);
        }
        self.total_redeemed += 1;
        Ok(())
    }

    /// Returns one unit of stock and uncounts the redemption.
    pub fn restore_stock(&mut self) {
        if !self.stock_unlimited {
            self.stock_quantity = Some(self.stock_quantity.unwrap_or(0) + 1);
        }
        self.total_redeemed = (self.total_redeemed - 1).max(0);
    }

    /// Expiry of a redemption made at `now`.
    #[must_use]
    pub fn redemption_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.redemption_period_days.max(0))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A reward with the given price and stock, open indefinitely.
    pub(crate) fn reward(points_required: i64, stock: Option<i64>) -> Reward {
        Reward {
            id: RewardId::new(),
            name: "Free coffee".to_string(),
            description: "One brewed coffee".to_string(),
            destination_id: None,
            points_required,
            stock_quantity: stock,
            stock_unlimited: stock.is_none(),
            max_redemptions_per_user: None,
            valid_from: None,
            valid_until: None,
            redemption_period_days: 7,
            total_redeemed: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::fixtures::reward;
    use super::*;

    #[test]
    fn stock_round_trip() {
        let mut r = reward(100, Some(1));
        assert!(r.take_stock().is_ok());
        assert_eq!(r.stock_quantity, Some(0));
        assert_eq!(r.total_redeemed, 1);
        assert!(matches!(r.take_stock(), Err(RewardsError::OutOfStock(_))));

        r.restore_stock();
        assert_eq!(r.stock_quantity, Some(1));
        assert_eq!(r.total_redeemed, 0);
    }

    #[test]
    fn unlimited_stock_is_never_touched() {
        let mut r = reward(100, None);
        assert!(r.take_stock().is_ok());
        assert!(r.take_stock().is_ok());
        assert_eq!(r.stock_quantity, None);
        assert_eq!(r.total_redeemed, 2);
        r.restore_stock();
        assert_eq!(r.stock_quantity, None);
    }

    #[test]
    fn window_and_activation_are_enforced() {
        let now = Utc::now();
        let mut r = reward(100, Some(5));
        assert!(r.ensure_redeemable(now).is_ok());

        r.valid_from = Some(now + Duration::hours(1));
        assert!(matches!(
            r.ensure_redeemable(now),
            Err(RewardsError::RewardUnavailable(_))
        ));

        r.valid_from = None;
        r.valid_until = Some(now - Duration::hours(1));
        assert!(r.ensure_redeemable(now).is_err());

        r.valid_until = None;
        r.is_active = false;
        assert!(r.ensure_redeemable(now).is_err());
    }

    #[test]
    fn expiry_adds_redemption_period() {
        let now = Utc::now();
        let r = reward(100, Some(5));
        assert_eq!(r.redemption_expiry(now), now + Duration::days(7));
    }
}
