//! Platform users as seen by the rewards core.
//!
//! Users are created by registration elsewhere; this crate only mutates
//! their balance and level through the points ledger.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;
use crate::error::RewardsError;

/// Lifetime-points thresholds for levels 1 through 10.
pub const LEVEL_THRESHOLDS: [i64; 10] = [0, 100, 250, 500, 1_000, 2_000, 3_500, 5_000, 7_500, 10_000];

/// Account status. Only [`UserStatus::Active`] users may mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Normal account.
    Active,
    /// Dormant account, reactivated by the user.
    Inactive,
    /// Temporarily blocked by moderation.
    Suspended,
    /// Permanently blocked.
    Banned,
}

impl UserStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
            Self::Banned => "banned",
        }
    }
}

impl FromStr for UserStatus {
    type Err = RewardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            "banned" => Ok(Self::Banned),
            other => Err(RewardsError::PersistenceError(format!(
                "unknown user status: {other}"
            ))),
        }
    }
}

/// A user with their point balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Public display name.
    pub display_name: String,
    /// Spendable balance. Never negative.
    pub total_points: i64,
    /// Sum of all earned and bonus points, unaffected by spending.
    pub lifetime_points: i64,
    /// Level derived from `lifetime_points`.
    pub level: i32,
    /// Account status.
    pub status: UserStatus,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates an active user with a zero balance.
    #[must_use]
    pub fn new(display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            display_name: display_name.into(),
            total_points: 0,
            lifetime_points: 0,
            level: 1,
            status: UserStatus::Active,
            created_at: now,
        }
    }

    /// Fails unless the account may perform mutating operations.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::AccountInactive`] for any non-active status.
    pub fn ensure_active(&self) -> Result<(), RewardsError> {
        if self.status == UserStatus::Active {
            Ok(())
        } else {
            Err(RewardsError::AccountInactive(self.status.as_str().to_string()))
        }
    }
}

/// Level for a lifetime-points total (step function over [`LEVEL_THRESHOLDS`]).
#[must_use]
pub fn level_for_points(lifetime_points: i64) -> i32 {
    let reached = LEVEL_THRESHOLDS
        .iter()
        .take_while(|threshold| lifetime_points >= **threshold)
        .count();
    i32::try_from(reached.max(1)).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_steps() {
        assert_eq!(level_for_points(-5), 1);
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(999), 4);
        assert_eq!(level_for_points(10_000), 10);
        assert_eq!(level_for_points(1_000_000), 10);
    }

    #[test]
    fn only_active_users_may_mutate() {
        let mut user = User::new("ana", Utc::now());
        assert!(user.ensure_active().is_ok());
        for status in [UserStatus::Inactive, UserStatus::Suspended, UserStatus::Banned] {
            user.status = status;
            assert!(matches!(
                user.ensure_active(),
                Err(RewardsError::AccountInactive(_))
            ));
        }
    }

    #[test]
    fn status_round_trips_through_storage_text() {
        for status in [
            UserStatus::Active,
            UserStatus::Inactive,
            UserStatus::Suspended,
            UserStatus::Banned,
        ] {
            assert_eq!(status.as_str().parse::<UserStatus>().ok(), Some(status));
        }
        assert!("deleted".parse::<UserStatus>().is_err());
    }
}
