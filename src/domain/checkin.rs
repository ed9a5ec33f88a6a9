//! Persisted check-in records.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CheckInId, DestinationId, UserId};
use crate::error::RewardsError;

/// How the destination code reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckInMethod {
    /// The user scanned the QR code.
    #[default]
    Qr,
    /// The user typed the printed code.
    Manual,
}

impl CheckInMethod {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Qr => "qr",
            Self::Manual => "manual",
        }
    }
}

impl FromStr for CheckInMethod {
    type Err = RewardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qr" => Ok(Self::Qr),
            "manual" => Ok(Self::Manual),
            other => Err(RewardsError::PersistenceError(format!(
                "unknown check-in method: {other}"
            ))),
        }
    }
}

/// Immutable record of one settled check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    /// Check-in identifier.
    pub id: CheckInId,
    /// User who checked in.
    pub user_id: UserId,
    /// Destination visited.
    pub destination_id: DestinationId,
    /// Scan method.
    pub method: CheckInMethod,
    /// Reported latitude.
    pub user_latitude: f64,
    /// Reported longitude.
    pub user_longitude: f64,
    /// Measured distance to the destination, in meters.
    pub distance_m: f64,
    /// Base points awarded.
    pub points_earned: i64,
    /// Promotional bonus awarded on top of the base points.
    pub bonus_points: i64,
    /// `true` when confirmed by GPS proximity at settlement time.
    pub is_verified: bool,
    /// Settlement timestamp.
    pub checked_in_at: DateTime<Utc>,
}

impl CheckIn {
    /// Points credited to the ledger for this check-in.
    #[must_use]
    pub const fn total_points(&self) -> i64 {
        self.points_earned + self.bonus_points
    }
}
