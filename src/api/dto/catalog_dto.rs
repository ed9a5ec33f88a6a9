//! Catalog DTOs: destinations, rewards and badges, plus admin writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::badge::Rarity;
use crate::domain::{Badge, Destination, DestinationId, RequirementType, Reward};
use crate::service::{NewDestination, NewReward, RewardUpdate};

/// A check-in destination.
#[derive(Debug, Serialize, ToSchema)]
pub struct DestinationDto {
    /// Destination identifier.
    pub destination_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Lowercase category label.
    pub category: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Own check-in radius in meters, if any.
    pub visit_radius_m: Option<f64>,
    /// Points credited per check-in.
    pub points_reward: i64,
    /// Printed check-in code; only returned to administrators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl DestinationDto {
    /// Public view without the check-in code.
    #[must_use]
    pub fn public(destination: &Destination) -> Self {
        Self {
            destination_id: *destination.id.as_uuid(),
            name: destination.name.clone(),
            category: destination.category.clone(),
            latitude: destination.latitude,
            longitude: destination.longitude,
            visit_radius_m: destination.visit_radius_m,
            points_reward: destination.points_reward,
            qr_code: None,
            created_at: destination.created_at,
        }
    }

    /// Administrator view including the check-in code.
    #[must_use]
    pub fn admin(destination: &Destination) -> Self {
        Self {
            qr_code: Some(destination.qr_code.clone()),
            ..Self::public(destination)
        }
    }
}

/// A redeemable reward.
#[derive(Debug, Serialize, ToSchema)]
pub struct RewardDto {
    /// Reward identifier.
    pub reward_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Partner destination the reward is bound to.
    pub destination_id: Option<uuid::Uuid>,
    /// Price in points.
    pub points_required: i64,
    /// Remaining stock; `null` when unlimited.
    pub stock_quantity: Option<i64>,
    /// Whether stock is unlimited.
    pub stock_unlimited: bool,
    /// Per-user cap on live redemptions.
    pub max_redemptions_per_user: Option<i64>,
    /// Start of the validity window.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window.
    pub valid_until: Option<DateTime<Utc>>,
    /// Days a redemption stays claimable.
    pub redemption_period_days: i64,
    /// Live redemptions issued so far.
    pub total_redeemed: i64,
    /// Whether the reward can be redeemed.
    pub is_active: bool,
}

impl From<&Reward> for RewardDto {
    fn from(reward: &Reward) -> Self {
        Self {
            reward_id: *reward.id.as_uuid(),
            name: reward.name.clone(),
            description: reward.description.clone(),
            destination_id: reward.destination_id.map(uuid::Uuid::from),
            points_required: reward.points_required,
            stock_quantity: reward.stock_quantity,
            stock_unlimited: reward.stock_unlimited,
            max_redemptions_per_user: reward.max_redemptions_per_user,
            valid_from: reward.valid_from,
            valid_until: reward.valid_until,
            redemption_period_days: reward.redemption_period_days,
            total_redeemed: reward.total_redeemed,
            is_active: reward.is_active,
        }
    }
}

/// A badge catalog entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeDto {
    /// Badge identifier.
    pub badge_id: uuid::Uuid,
    /// Stable slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Requirement kind.
    pub requirement_type: RequirementType,
    /// Threshold for the requirement.
    pub requirement_value: i64,
    /// Bonus points granted on award.
    pub points_reward: i64,
    /// Display rarity.
    pub rarity: Rarity,
}

impl From<&Badge> for BadgeDto {
    fn from(badge: &Badge) -> Self {
        Self {
            badge_id: *badge.id.as_uuid(),
            slug: badge.slug.clone(),
            name: badge.name.clone(),
            description: badge.description.clone(),
            requirement_type: badge.requirement_type,
            requirement_value: badge.requirement_value,
            points_reward: badge.points_reward,
            rarity: badge.rarity,
        }
    }
}

/// Request body for `POST /admin/destinations`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDestinationRequest {
    /// Display name.
    pub name: String,
    /// Category label.
    pub category: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Own check-in radius in meters.
    #[serde(default)]
    pub visit_radius_m: Option<f64>,
    /// Points credited per check-in.
    pub points_reward: i64,
    /// Printed check-in code; must be unique.
    pub qr_code: String,
}

impl From<CreateDestinationRequest> for NewDestination {
    fn from(req: CreateDestinationRequest) -> Self {
        Self {
            name: req.name,
            category: req.category,
            latitude: req.latitude,
            longitude: req.longitude,
            visit_radius_m: req.visit_radius_m,
            points_reward: req.points_reward,
            qr_code: req.qr_code,
        }
    }
}

/// Request body for `POST /admin/rewards`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRewardRequest {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Partner destination.
    #[serde(default)]
    pub destination_id: Option<uuid::Uuid>,
    /// Price in points.
    pub points_required: i64,
    /// Initial stock; omit for unlimited.
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    /// Per-user cap on live redemptions.
    #[serde(default)]
    pub max_redemptions_per_user: Option<i64>,
    /// Start of the validity window.
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window.
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    /// Days a redemption stays claimable. Defaults to 7.
    #[serde(default = "default_period_days")]
    pub redemption_period_days: i64,
}

fn default_period_days() -> i64 {
    7
}

impl From<CreateRewardRequest> for NewReward {
    fn from(req: CreateRewardRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            destination_id: req.destination_id.map(DestinationId::from_uuid),
            points_required: req.points_required,
            stock_quantity: req.stock_quantity,
            max_redemptions_per_user: req.max_redemptions_per_user,
            valid_from: req.valid_from,
            valid_until: req.valid_until,
            redemption_period_days: req.redemption_period_days,
        }
    }
}

/// Request body for `PATCH /admin/rewards/{id}`. Omitted fields are left
/// unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateRewardRequest {
    /// Activation toggle.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Units to add to the stock; at least one.
    #[serde(default)]
    pub restock: Option<i64>,
    /// New start of the validity window.
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    /// New end of the validity window.
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

impl From<UpdateRewardRequest> for RewardUpdate {
    fn from(req: UpdateRewardRequest) -> Self {
        Self {
            is_active: req.is_active,
            restock: req.restock,
            valid_from: req.valid_from,
            valid_until: req.valid_until,
        }
    }
}
