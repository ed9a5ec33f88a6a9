//! Account DTOs: profile, ledger history and badge progress.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::catalog_dto::BadgeDto;
use super::checkin_dto::AwardedBadgeDto;
use crate::domain::{PointsTransaction, TransactionType, User, UserStatus};
use crate::service::{AwardedBadge, BadgeProgress};

/// Response body for `GET /me`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    /// User identifier.
    pub user_id: uuid::Uuid,
    /// Display name.
    pub display_name: String,
    /// Spendable balance.
    pub total_points: i64,
    /// Points ever earned, spending excluded.
    pub lifetime_points: i64,
    /// Level derived from lifetime points.
    pub level: i32,
    /// Account status.
    pub status: UserStatus,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: *user.id.as_uuid(),
            display_name: user.display_name,
            total_points: user.total_points,
            lifetime_points: user.lifetime_points,
            level: user.level,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

/// One ledger row.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionDto {
    /// Row identifier.
    pub transaction_id: uuid::Uuid,
    /// Signed delta.
    pub points: i64,
    /// Balance after this row.
    pub balance_after: i64,
    /// Why the balance changed.
    pub transaction_type: TransactionType,
    /// Kind of the referenced entity (`check_in`, `badge`, `redemption`).
    pub reference_type: String,
    /// Referenced entity.
    pub reference_id: uuid::Uuid,
    /// Human-readable description.
    pub description: String,
    /// Row timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&PointsTransaction> for TransactionDto {
    fn from(tx: &PointsTransaction) -> Self {
        Self {
            transaction_id: *tx.id.as_uuid(),
            points: tx.points,
            balance_after: tx.balance_after,
            transaction_type: tx.transaction_type,
            reference_type: tx.reference.kind().to_string(),
            reference_id: tx.reference.id(),
            description: tx.description.clone(),
            created_at: tx.created_at,
        }
    }
}

/// Progress toward one badge.
#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeProgressDto {
    /// The badge.
    pub badge: BadgeDto,
    /// Last recorded progress value.
    pub progress: i64,
    /// Whether the badge was earned.
    pub is_earned: bool,
    /// Award timestamp.
    pub earned_at: Option<DateTime<Utc>>,
    /// Bonus points credited with the award.
    pub points_awarded: i64,
}

impl From<&BadgeProgress> for BadgeProgressDto {
    fn from(entry: &BadgeProgress) -> Self {
        let progress = entry.progress.as_ref();
        Self {
            badge: BadgeDto::from(&entry.badge),
            progress: progress.map_or(0, |ub| ub.progress),
            is_earned: progress.is_some_and(|ub| ub.is_earned),
            earned_at: progress.and_then(|ub| ub.earned_at),
            points_awarded: progress.map_or(0, |ub| ub.points_awarded),
        }
    }
}

/// Response body for `POST /me/badges/evaluate`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluateBadgesResponse {
    /// Badges awarded by this evaluation.
    pub new_badges: Vec<AwardedBadgeDto>,
}

impl From<&[AwardedBadge]> for EvaluateBadgesResponse {
    fn from(awarded: &[AwardedBadge]) -> Self {
        Self {
            new_badges: awarded.iter().map(AwardedBadgeDto::from).collect(),
        }
    }
}
