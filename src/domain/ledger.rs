//! Points ledger rows.
//!
//! The ledger is append-only. For every user, the sum of `points` over all
//! rows equals the user's `total_points`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BadgeId, CheckInId, RedemptionId, TransactionId, UserId};
use crate::error::RewardsError;

/// Why a balance changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Points from a check-in.
    Earned,
    /// Points from a badge award.
    Bonus,
    /// Points spent on a reward.
    Redeemed,
    /// Points returned from a changed or expired redemption.
    Refunded,
}

impl TransactionType {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Earned => "earned",
            Self::Bonus => "bonus",
            Self::Redeemed => "redeemed",
            Self::Refunded => "refunded",
        }
    }

    /// Whether the delta counts toward lifetime points.
    #[must_use]
    pub const fn counts_toward_lifetime(&self) -> bool {
        matches!(self, Self::Earned | Self::Bonus)
    }
}

impl FromStr for TransactionType {
    type Err = RewardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earned" => Ok(Self::Earned),
            "bonus" => Ok(Self::Bonus),
            "redeemed" => Ok(Self::Redeemed),
            "refunded" => Ok(Self::Refunded),
            other => Err(RewardsError::PersistenceError(format!(
                "unknown transaction type: {other}"
            ))),
        }
    }
}

/// The entity that caused a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum LedgerReference {
    /// A settled check-in.
    CheckIn(CheckInId),
    /// An awarded badge.
    Badge(BadgeId),
    /// A reward redemption.
    Redemption(RedemptionId),
}

impl LedgerReference {
    /// Storage discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CheckIn(_) => "check_in",
            Self::Badge(_) => "badge",
            Self::Redemption(_) => "redemption",
        }
    }

    /// Referenced id as a raw UUID.
    #[must_use]
    pub const fn id(&self) -> uuid::Uuid {
        match self {
            Self::CheckIn(id) => *id.as_uuid(),
            Self::Badge(id) => *id.as_uuid(),
            Self::Redemption(id) => *id.as_uuid(),
        }
    }

    /// Rebuilds a reference from its stored discriminator and id.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] for an unknown discriminator.
    pub fn from_parts(kind: &str, id: uuid::Uuid) -> Result<Self, RewardsError> {
        match kind {
            "check_in" => Ok(Self::CheckIn(CheckInId::from_uuid(id))),
            "badge" => Ok(Self::Badge(BadgeId::from_uuid(id))),
            "redemption" => Ok(Self::Redemption(RedemptionId::from_uuid(id))),
            other => Err(RewardsError::PersistenceError(format!(
                "unknown ledger reference kind: {other}"
            ))),
        }
    }
}

/// One balance-affecting event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsTransaction {
    /// Row identifier.
    pub id: TransactionId,
    /// Account affected.
    pub user_id: UserId,
    /// Signed delta.
    pub points: i64,
    /// Balance right after this entry.
    pub balance_after: i64,
    /// Entry kind.
    pub transaction_type: TransactionType,
    /// Causing entity.
    pub reference: LedgerReference,
    /// Human-readable note.
    pub description: String,
    /// Append timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_round_trips_through_parts() {
        let refs = [
            LedgerReference::CheckIn(CheckInId::new()),
            LedgerReference::Badge(BadgeId::new()),
            LedgerReference::Redemption(RedemptionId::new()),
        ];
        for reference in refs {
            let rebuilt = LedgerReference::from_parts(reference.kind(), reference.id());
            assert_eq!(rebuilt.ok(), Some(reference));
        }
        assert!(LedgerReference::from_parts("user", uuid::Uuid::new_v4()).is_err());
    }

    #[test]
    fn only_earning_counts_toward_lifetime() {
        assert!(TransactionType::Earned.counts_toward_lifetime());
        assert!(TransactionType::Bonus.counts_toward_lifetime());
        assert!(!TransactionType::Redeemed.counts_toward_lifetime());
        assert!(!TransactionType::Refunded.counts_toward_lifetime());
    }

    #[test]
    fn reference_serializes_tagged() {
        let id = BadgeId::new();
        let json = serde_json::to_value(LedgerReference::Badge(id)).unwrap_or_default();
        assert_eq!(json["type"], "badge");
        assert_eq!(json["id"], id.to_string());
    }
}
