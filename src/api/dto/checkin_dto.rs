//! Check-in DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::badge::Rarity;
use crate::domain::{CheckIn, CheckInMethod, DestinationId};
use crate::service::{AwardedBadge, CheckInRequest, Settlement};

/// Request body for `POST /check-ins`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckInRequestDto {
    /// Scanned or typed destination code.
    pub destination_code: String,
    /// Destination the client believes it is at; must match the code.
    #[serde(default)]
    pub destination_id: Option<uuid::Uuid>,
    /// Reported latitude in degrees.
    pub latitude: f64,
    /// Reported longitude in degrees.
    pub longitude: f64,
    /// How the code was captured. Defaults to `qr`.
    #[serde(default)]
    pub method: CheckInMethod,
}

impl From<CheckInRequestDto> for CheckInRequest {
    fn from(dto: CheckInRequestDto) -> Self {
        Self {
            destination_code: dto.destination_code,
            destination_id: dto.destination_id.map(DestinationId::from_uuid),
            latitude: dto.latitude,
            longitude: dto.longitude,
            method: dto.method,
        }
    }
}

/// A persisted check-in.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckInDto {
    /// Check-in identifier.
    pub check_in_id: uuid::Uuid,
    /// Destination visited.
    pub destination_id: uuid::Uuid,
    /// Capture method.
    pub method: CheckInMethod,
    /// Measured distance from the destination in meters.
    pub distance_m: f64,
    /// Base points credited.
    pub points_earned: i64,
    /// First-visit bonus credited.
    pub bonus_points: i64,
    /// Settlement timestamp.
    pub checked_in_at: DateTime<Utc>,
}

impl From<&CheckIn> for CheckInDto {
    fn from(check_in: &CheckIn) -> Self {
        Self {
            check_in_id: *check_in.id.as_uuid(),
            destination_id: *check_in.destination_id.as_uuid(),
            method: check_in.method,
            distance_m: check_in.distance_m,
            points_earned: check_in.points_earned,
            bonus_points: check_in.bonus_points,
            checked_in_at: check_in.checked_in_at,
        }
    }
}

/// A badge awarded by an evaluation.
#[derive(Debug, Serialize, ToSchema)]
pub struct AwardedBadgeDto {
    /// Badge identifier.
    pub badge_id: uuid::Uuid,
    /// Stable slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Display rarity.
    pub rarity: Rarity,
    /// Bonus points credited with the award.
    pub points_awarded: i64,
}

impl From<&AwardedBadge> for AwardedBadgeDto {
    fn from(awarded: &AwardedBadge) -> Self {
        Self {
            badge_id: *awarded.badge.id.as_uuid(),
            slug: awarded.badge.slug.clone(),
            name: awarded.badge.name.clone(),
            rarity: awarded.badge.rarity,
            points_awarded: awarded.points_awarded,
        }
    }
}

/// Response body for `POST /check-ins` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckInResponse {
    /// The new check-in.
    pub check_in: CheckInDto,
    /// Points credited for the check-in, bonus included.
    pub points_earned: i64,
    /// Balance after the whole settlement, badge bonuses included.
    pub total_points: i64,
    /// Badges awarded by this check-in.
    pub new_badges: Vec<AwardedBadgeDto>,
}

impl From<Settlement> for CheckInResponse {
    fn from(settlement: Settlement) -> Self {
        Self {
            check_in: CheckInDto::from(&settlement.check_in),
            points_earned: settlement.points_earned,
            total_points: settlement.total_points,
            new_badges: settlement
                .new_badges
                .iter()
                .map(AwardedBadgeDto::from)
                .collect(),
        }
    }
}
