//! Error types with HTTP status code mapping.
//!
//! [`RewardsError`] is the central error type. Each variant maps to a
//! specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "out of range: 512.3 m from destination, allowed 100.0 m",
///     "details": { "distance_m": 512.3, "radius_m": 100.0 }
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`RewardsError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional machine-readable details.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                   |
/// |-----------|-------------------|-------------------------------|
/// | 1000–1999 | Validation / auth | 400 / 401 / 403               |
/// | 2000–2999 | Not found / state | 404 Not Found / 409 Conflict  |
/// | 3000–3999 | Server            | 500 Internal Server Error     |
/// | 4000–4999 | Business rules    | 422 Unprocessable Entity      |
#[derive(Debug, thiserror::Error)]
pub enum RewardsError {
    /// Malformed input, rejected before any domain logic.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or malformed caller identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller's account may not perform mutations.
    #[error("account is {0}")]
    AccountInactive(String),

    /// Scanned code does not belong to the expected destination.
    #[error("invalid code: {0}")]
    InvalidCode(String),

    /// User with the given ID was not found.
    #[error("user not found: {0}")]
    UserNotFound(uuid::Uuid),

    /// No destination matches the scanned code or id.
    #[error("destination not found: {0}")]
    DestinationNotFound(String),

    /// Reward with the given ID was not found.
    #[error("reward not found: {0}")]
    RewardNotFound(uuid::Uuid),

    /// Redemption with the given ID or code was not found.
    #[error("redemption not found: {0}")]
    RedemptionNotFound(String),

    /// The user already checked in here within the cooldown window.
    #[error("already checked in here; next check-in allowed at {retry_at}")]
    DuplicateCheckIn {
        /// When the cooldown lapses.
        retry_at: DateTime<Utc>,
    },

    /// The redemption was already claimed.
    #[error("redemption already used")]
    AlreadyUsed,

    /// The redemption already lapsed.
    #[error("redemption already expired")]
    AlreadyExpired,

    /// A manual expiry sweep was requested while one is running.
    #[error("an expiry sweep is already running")]
    SweepInProgress,

    /// The reported position is farther than the destination radius.
    #[error("out of range: {distance_m:.1} m from destination, allowed {radius_m:.1} m")]
    OutOfRange {
        /// Measured distance in meters.
        distance_m: f64,
        /// Allowed radius in meters.
        radius_m: f64,
    },

    /// Balance too low for the operation.
    #[error("insufficient points: {required} required, {available} available")]
    InsufficientPoints {
        /// Points needed.
        required: i64,
        /// Points held.
        available: i64,
    },

    /// The reward has no stock left.
    #[error("reward out of stock: {0}")]
    OutOfStock(uuid::Uuid),

    /// The user reached the reward's per-user redemption cap.
    #[error("redemption limit reached: at most {limit} per user")]
    RedemptionLimit {
        /// Per-user cap.
        limit: i64,
    },

    /// The reward is inactive or outside its validity window.
    #[error("reward unavailable: {0}")]
    RewardUnavailable(String),

    /// Storage failure; the surrounding transaction was rolled back.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RewardsError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidCode(_) => 1002,
            Self::Unauthorized(_) => 1003,
            Self::AccountInactive(_) => 1004,
            Self::UserNotFound(_) => 2001,
            Self::DestinationNotFound(_) => 2002,
            Self::RewardNotFound(_) => 2003,
            Self::RedemptionNotFound(_) => 2004,
            Self::DuplicateCheckIn { .. } => 2101,
            Self::AlreadyUsed => 2102,
            Self::AlreadyExpired => 2103,
            Self::SweepInProgress => 2104,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::OutOfRange { .. } => 4001,
            Self::InsufficientPoints { .. } => 4002,
            Self::OutOfStock(_) => 4003,
            Self::RedemptionLimit { .. } => 4004,
            Self::RewardUnavailable(_) => 4005,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidCode(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::AccountInactive(_) => StatusCode::FORBIDDEN,
            Self::UserNotFound(_)
            | Self::DestinationNotFound(_)
            | Self::RewardNotFound(_)
            | Self::RedemptionNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateCheckIn { .. }
            | Self::AlreadyUsed
            | Self::AlreadyExpired
            | Self::SweepInProgress => StatusCode::CONFLICT,
            Self::OutOfRange { .. }
            | Self::InsufficientPoints { .. }
            | Self::OutOfStock(_)
            | Self::RedemptionLimit { .. }
            | Self::RewardUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable details for variants that carry measurements.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::OutOfRange {
                distance_m,
                radius_m,
            } => Some(serde_json::json!({
                "distance_m": distance_m,
                "radius_m": radius_m,
            })),
            Self::DuplicateCheckIn { retry_at } => Some(serde_json::json!({
                "retry_at": retry_at,
            })),
            Self::InsufficientPoints {
                required,
                available,
            } => Some(serde_json::json!({
                "required": required,
                "available": available,
            })),
            _ => None,
        }
    }
}

/// Maps a driver error into [`RewardsError::PersistenceError`].
pub fn db_err(err: sqlx::Error) -> RewardsError {
    RewardsError::PersistenceError(err.to_string())
}

impl IntoResponse for RewardsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
