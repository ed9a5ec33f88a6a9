//! Redemption DTOs: redeem, change, claim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog_dto::RewardDto;
use crate::domain::{Redemption, RedemptionStatus};
use crate::service::RedemptionReceipt;

/// Request body for `POST /redemptions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RedeemRequest {
    /// Reward to redeem.
    pub reward_id: uuid::Uuid,
    /// Destination the user is redeeming at, for partner-bound rewards.
    #[serde(default)]
    pub destination_id: Option<uuid::Uuid>,
}

/// Request body for `POST /redemptions/{id}/change`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRedemptionRequest {
    /// Replacement reward.
    pub new_reward_id: uuid::Uuid,
}

/// Request body for `POST /redemptions/claim`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClaimRequest {
    /// Redemption code presented by the user.
    pub code: String,
    /// Where the redemption was used.
    #[serde(default)]
    pub location: Option<String>,
}

/// A reward redemption.
#[derive(Debug, Serialize, ToSchema)]
pub struct RedemptionDto {
    /// Redemption identifier.
    pub redemption_id: uuid::Uuid,
    /// Reward redeemed.
    pub reward_id: uuid::Uuid,
    /// Destination the redemption is bound to.
    pub destination_id: Option<uuid::Uuid>,
    /// Points debited.
    pub points_spent: i64,
    /// Code to present at the venue.
    pub redemption_code: String,
    /// Lifecycle status.
    pub status: RedemptionStatus,
    /// Claim deadline.
    pub valid_until: DateTime<Utc>,
    /// Issue timestamp.
    pub redeemed_at: DateTime<Utc>,
    /// Claim timestamp.
    pub used_at: Option<DateTime<Utc>>,
    /// Claim location.
    pub used_location: Option<String>,
}

impl From<&Redemption> for RedemptionDto {
    fn from(redemption: &Redemption) -> Self {
        Self {
            redemption_id: *redemption.id.as_uuid(),
            reward_id: *redemption.reward_id.as_uuid(),
            destination_id: redemption.destination_id.map(uuid::Uuid::from),
            points_spent: redemption.points_spent,
            redemption_code: redemption.redemption_code.clone(),
            status: redemption.status,
            valid_until: redemption.valid_until,
            redeemed_at: redemption.redeemed_at,
            used_at: redemption.used_at,
            used_location: redemption.used_location.clone(),
        }
    }
}

/// Response body for redeem and change.
#[derive(Debug, Serialize, ToSchema)]
pub struct RedemptionReceiptResponse {
    /// The redemption.
    pub redemption: RedemptionDto,
    /// The reward now held.
    pub reward: RewardDto,
    /// Balance after the operation.
    pub total_points: i64,
}

impl From<RedemptionReceipt> for RedemptionReceiptResponse {
    fn from(receipt: RedemptionReceipt) -> Self {
        Self {
            redemption: RedemptionDto::from(&receipt.redemption),
            reward: RewardDto::from(&receipt.reward),
            total_points: receipt.total_points,
        }
    }
}
