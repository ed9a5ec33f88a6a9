//! Check-in settlement endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{CheckInRequestDto, CheckInResponse};
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RewardsError};

/// `POST /check-ins`: Settle a check-in.
///
/// # Errors
///
/// Returns [`RewardsError`] when the code is unknown or mismatched, the
/// position is out of range, or the cooldown has not lapsed.
#[utoipa::path(
    post,
    path = "/api/v1/check-ins",
    tag = "Check-ins",
    summary = "Check in at a destination",
    description = "Verifies the scanned code and the reported position, credits the destination's points (plus any first-visit bonus) and evaluates badges, all in one transaction.",
    request_body = CheckInRequestDto,
    params(("x-user-id" = uuid::Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 201, description = "Check-in settled", body = CheckInResponse),
        (status = 400, description = "Invalid request or code", body = ErrorResponse),
        (status = 401, description = "Missing identity", body = ErrorResponse),
        (status = 403, description = "Account not active", body = ErrorResponse),
        (status = 404, description = "Destination not found", body = ErrorResponse),
        (status = 409, description = "Already checked in within the cooldown", body = ErrorResponse),
        (status = 422, description = "Outside the destination radius", body = ErrorResponse),
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CheckInRequestDto>,
) -> Result<impl IntoResponse, RewardsError> {
    let settlement = state.check_ins.settle(user_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(CheckInResponse::from(settlement))))
}

/// Check-in routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/check-ins", post(check_in))
}
