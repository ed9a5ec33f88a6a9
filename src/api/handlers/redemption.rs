//! Redemption lifecycle handlers: redeem, change, claim.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    ChangeRedemptionRequest, ClaimRequest, RedeemRequest, RedemptionDto, RedemptionReceiptResponse,
};
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::domain::{DestinationId, RedemptionId, RewardId};
use crate::error::{ErrorResponse, RewardsError};

/// `POST /redemptions`: Redeem a reward.
///
/// # Errors
///
/// Returns [`RewardsError`] when the reward is unavailable, out of stock,
/// over the per-user limit, or the balance is too low.
#[utoipa::path(
    post,
    path = "/api/v1/redemptions",
    tag = "Redemptions",
    summary = "Redeem a reward",
    description = "Debits the reward's price, takes one unit of stock and issues a redemption code valid for the reward's redemption period.",
    request_body = RedeemRequest,
    params(("x-user-id" = uuid::Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 201, description = "Reward redeemed", body = RedemptionReceiptResponse),
        (status = 401, description = "Missing identity", body = ErrorResponse),
        (status = 403, description = "Account not active", body = ErrorResponse),
        (status = 404, description = "Reward not found", body = ErrorResponse),
        (status = 422, description = "Insufficient points, out of stock, limit reached or unavailable", body = ErrorResponse),
    )
)]
pub async fn redeem(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<RedeemRequest>,
) -> Result<impl IntoResponse, RewardsError> {
    let receipt = state
        .redemptions
        .redeem(
            user_id,
            RewardId::from_uuid(req.reward_id),
            req.destination_id.map(DestinationId::from_uuid),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RedemptionReceiptResponse::from(receipt)),
    ))
}

/// `POST /redemptions/:id/change`: Swap a live redemption to another reward.
///
/// # Errors
///
/// Returns [`RewardsError`] when the redemption is not live or the new
/// reward cannot be redeemed. The original redemption is untouched on error.
#[utoipa::path(
    post,
    path = "/api/v1/redemptions/{id}/change",
    tag = "Redemptions",
    summary = "Change a redemption",
    description = "Refunds the current reward, restores its stock and redeems the new one atomically. The redemption code is kept.",
    request_body = ChangeRedemptionRequest,
    params(
        ("id" = uuid::Uuid, Path, description = "Redemption UUID"),
        ("x-user-id" = uuid::Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Redemption changed", body = RedemptionReceiptResponse),
        (status = 400, description = "Same reward requested", body = ErrorResponse),
        (status = 404, description = "Redemption or reward not found", body = ErrorResponse),
        (status = 409, description = "Redemption already used or expired", body = ErrorResponse),
        (status = 422, description = "New reward cannot be redeemed", body = ErrorResponse),
    )
)]
pub async fn change(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<ChangeRedemptionRequest>,
) -> Result<impl IntoResponse, RewardsError> {
    let receipt = state
        .redemptions
        .change(
            user_id,
            RedemptionId::from_uuid(id),
            RewardId::from_uuid(req.new_reward_id),
        )
        .await?;
    Ok(Json(RedemptionReceiptResponse::from(receipt)))
}

/// `POST /redemptions/claim`: Mark a redemption as used.
///
/// # Errors
///
/// Returns [`RewardsError`] for unknown codes and redemptions that are not
/// live.
#[utoipa::path(
    post,
    path = "/api/v1/redemptions/claim",
    tag = "Redemptions",
    summary = "Claim a redemption",
    description = "Staff-side: marks the redemption with the given code as used. The caller is recorded as the verifier.",
    request_body = ClaimRequest,
    params(("x-user-id" = uuid::Uuid, Header, description = "Verifying staff member")),
    responses(
        (status = 200, description = "Redemption claimed", body = RedemptionDto),
        (status = 404, description = "Unknown code", body = ErrorResponse),
        (status = 409, description = "Already used or expired", body = ErrorResponse),
    )
)]
pub async fn claim(
    State(state): State<AppState>,
    CurrentUser(verified_by): CurrentUser,
    Json(req): Json<ClaimRequest>,
) -> Result<impl IntoResponse, RewardsError> {
    let redemption = state
        .redemptions
        .claim(verified_by, &req.code, req.location)
        .await?;
    Ok(Json(RedemptionDto::from(&redemption)))
}

/// Redemption routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/redemptions", post(redeem))
        .route("/redemptions/claim", post(claim))
        .route("/redemptions/{id}/change", post(change))
}
