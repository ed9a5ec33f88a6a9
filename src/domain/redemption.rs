//! Reward redemptions and their lifecycle state machine.
//!
//! All status changes go through [`RedemptionStatus::apply`]; no other code
//! compares statuses to decide whether a transition is legal.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DestinationId, RedemptionId, RewardId, UserId};
use crate::error::RewardsError;

/// Redemption status. `Used` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    /// Created, awaiting activation.
    Pending,
    /// Claimable.
    Active,
    /// Claimed at the venue.
    Used,
    /// Lapsed; points and stock were returned.
    Expired,
}

/// An operation that touches a redemption's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionAction {
    /// `pending → active`.
    Activate,
    /// Swap to another reward; status is kept.
    Change,
    /// Hand the reward over at the venue.
    Claim,
    /// Lapse after `valid_until`.
    Expire,
}

impl RedemptionStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Used => "used",
            Self::Expired => "expired",
        }
    }

    /// `true` for statuses that can still be claimed, changed or expired.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    /// Validates `action` against the current status and returns the
    /// resulting status.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::AlreadyUsed`] or [`RewardsError::AlreadyExpired`]
    /// from terminal statuses, and [`RewardsError::InvalidRequest`] when
    /// activating a redemption that is already active.
    pub fn apply(self, action: RedemptionAction) -> Result<Self, RewardsError> {
        match (self, action) {
            (Self::Used, _) => Err(RewardsError::AlreadyUsed),
            (Self::Expired, _) => Err(RewardsError::AlreadyExpired),
            (Self::Pending, RedemptionAction::Activate) => Ok(Self::Active),
            (Self::Active, RedemptionAction::Activate) => Err(RewardsError::InvalidRequest(
                "redemption is already active".to_string(),
            )),
            (live, RedemptionAction::Change) => Ok(live),
            (_, RedemptionAction::Claim) => Ok(Self::Used),
            (_, RedemptionAction::Expire) => Ok(Self::Expired),
        }
    }
}

impl FromStr for RedemptionStatus {
    type Err = RewardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "used" => Ok(Self::Used),
            "expired" => Ok(Self::Expired),
            other => Err(RewardsError::PersistenceError(format!(
                "unknown redemption status: {other}"
            ))),
        }
    }
}

/// A user's claim ticket for a reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redemption {
    /// Redemption identifier.
    pub id: RedemptionId,
    /// Owner.
    pub user_id: UserId,
    /// Reward redeemed.
    pub reward_id: RewardId,
    /// Destination the redemption was made for, if any.
    pub destination_id: Option<DestinationId>,
    /// Price paid, frozen at redemption time.
    pub points_spent: i64,
    /// Unique claim token shown to venue staff.
    pub redemption_code: String,
    /// Lifecycle status.
    pub status: RedemptionStatus,
    /// Deadline for claiming.
    pub valid_until: DateTime<Utc>,
    /// Creation timestamp.
    pub redeemed_at: DateTime<Utc>,
    /// Claim timestamp.
    pub used_at: Option<DateTime<Utc>>,
    /// Where the claim happened.
    pub used_location: Option<String>,
    /// Staff member who verified the claim.
    pub verified_by: Option<UserId>,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
}

impl Redemption {
    /// `true` when the redemption is live and past its deadline.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_live() && self.valid_until < now
    }

    /// Marks the redemption used.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::AlreadyUsed`] / [`RewardsError::AlreadyExpired`]
    /// for terminal statuses, and [`RewardsError::AlreadyExpired`] when the
    /// deadline has passed but the sweep has not run yet.
    pub fn claim(
        &mut self,
        now: DateTime<Utc>,
        location: Option<String>,
        verified_by: UserId,
    ) -> Result<(), RewardsError> {
        let next = self.status.apply(RedemptionAction::Claim)?;
        if self.is_overdue(now) {
            return Err(RewardsError::AlreadyExpired);
        }
        self.status = next;
        self.used_at = Some(now);
        self.used_location = location;
        self.verified_by = Some(verified_by);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the redemption expired. Refunds are the caller's job.
    ///
    /// # Errors
    ///
    /// Returns an error from [`RedemptionStatus::apply`] for terminal statuses.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<(), RewardsError> {
        self.status = self.status.apply(RedemptionAction::Expire)?;
        self.updated_at = now;
        Ok(())
    }
}
