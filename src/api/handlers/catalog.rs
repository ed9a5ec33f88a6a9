//! Catalog reads and administrator writes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::dto::{
    BadgeDto, CreateDestinationRequest, CreateRewardRequest, DestinationDto, RewardDto,
    UpdateRewardRequest,
};
use crate::app_state::AppState;
use crate::domain::RewardId;
use crate::error::{ErrorResponse, RewardsError};
use crate::service::SweepSummary;

/// `GET /destinations`: Active destinations.
///
/// # Errors
///
/// Returns [`RewardsError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/destinations",
    tag = "Catalog",
    summary = "List destinations",
    responses(
        (status = 200, description = "Active destinations", body = Vec<DestinationDto>),
    )
)]
pub async fn list_destinations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RewardsError> {
    let destinations = state.catalog.destinations().await?;
    Ok(Json(
        destinations
            .iter()
            .map(DestinationDto::public)
            .collect::<Vec<_>>(),
    ))
}

/// `GET /rewards`: Active rewards.
///
/// # Errors
///
/// Returns [`RewardsError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/rewards",
    tag = "Catalog",
    summary = "List rewards",
    responses(
        (status = 200, description = "Active rewards", body = Vec<RewardDto>),
    )
)]
pub async fn list_rewards(State(state): State<AppState>) -> Result<impl IntoResponse, RewardsError> {
    let rewards = state.catalog.rewards().await?;
    Ok(Json(rewards.iter().map(RewardDto::from).collect::<Vec<_>>()))
}

/// `GET /badges`: Active, visible badges.
///
/// # Errors
///
/// Returns [`RewardsError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/badges",
    tag = "Catalog",
    summary = "List badges",
    responses(
        (status = 200, description = "Visible badges", body = Vec<BadgeDto>),
    )
)]
pub async fn list_badges(State(state): State<AppState>) -> Result<impl IntoResponse, RewardsError> {
    let badges = state.catalog.visible_badges().await?;
    Ok(Json(badges.iter().map(BadgeDto::from).collect::<Vec<_>>()))
}

/// `POST /admin/destinations`: Add a destination.
///
/// # Errors
///
/// Returns [`RewardsError::InvalidRequest`] for invalid fields or a
/// duplicate code.
#[utoipa::path(
    post,
    path = "/api/v1/admin/destinations",
    tag = "Admin",
    summary = "Create a destination",
    request_body = CreateDestinationRequest,
    responses(
        (status = 201, description = "Destination created", body = DestinationDto),
        (status = 400, description = "Invalid fields or duplicate code", body = ErrorResponse),
    )
)]
pub async fn create_destination(
    State(state): State<AppState>,
    Json(req): Json<CreateDestinationRequest>,
) -> Result<impl IntoResponse, RewardsError> {
    let destination = state.catalog.create_destination(req.into()).await?;
    Ok((StatusCode::CREATED, Json(DestinationDto::admin(&destination))))
}

/// `POST /admin/rewards`: Add a reward.
///
/// # Errors
///
/// Returns [`RewardsError`] for invalid fields or an unknown destination.
#[utoipa::path(
    post,
    path = "/api/v1/admin/rewards",
    tag = "Admin",
    summary = "Create a reward",
    request_body = CreateRewardRequest,
    responses(
        (status = 201, description = "Reward created", body = RewardDto),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Destination not found", body = ErrorResponse),
    )
)]
pub async fn create_reward(
    State(state): State<AppState>,
    Json(req): Json<CreateRewardRequest>,
) -> Result<impl IntoResponse, RewardsError> {
    let reward = state.catalog.create_reward(req.into()).await?;
    Ok((StatusCode::CREATED, Json(RewardDto::from(&reward))))
}

/// `PATCH /admin/rewards/:id`: Toggle, restock or re-window a reward.
///
/// # Errors
///
/// Returns [`RewardsError`] for unknown rewards or invalid fields.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/rewards/{id}",
    tag = "Admin",
    summary = "Update a reward",
    request_body = UpdateRewardRequest,
    params(("id" = uuid::Uuid, Path, description = "Reward UUID")),
    responses(
        (status = 200, description = "Reward updated", body = RewardDto),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Reward not found", body = ErrorResponse),
    )
)]
pub async fn update_reward(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateRewardRequest>,
) -> Result<impl IntoResponse, RewardsError> {
    let reward = state
        .catalog
        .update_reward(RewardId::from_uuid(id), req.into())
        .await?;
    Ok(Json(RewardDto::from(&reward)))
}

/// `POST /admin/redemptions/expire`: Run one expiry sweep now.
///
/// # Errors
///
/// Returns [`RewardsError::SweepInProgress`] if a sweep is already running.
#[utoipa::path(
    post,
    path = "/api/v1/admin/redemptions/expire",
    tag = "Admin",
    summary = "Expire lapsed redemptions",
    description = "Expires and refunds every live redemption past its deadline. Per-item failures are counted, not raised.",
    responses(
        (status = 200, description = "Sweep summary", body = SweepSummary),
        (status = 409, description = "A sweep is already running", body = ErrorResponse),
    )
)]
pub async fn expire_redemptions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RewardsError> {
    let summary = state.sweeper.run_once().await?;
    Ok(Json(summary))
}

/// Catalog and admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/destinations", get(list_destinations))
        .route("/rewards", get(list_rewards))
        .route("/badges", get(list_badges))
        .route("/admin/destinations", post(create_destination))
        .route("/admin/rewards", post(create_reward))
        .route("/admin/rewards/{id}", patch(update_reward))
        .route("/admin/redemptions/expire", post(expire_redemptions))
}
