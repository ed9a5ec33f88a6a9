//! Caller-scoped account views under `/me`.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    BadgeProgressDto, CheckInDto, EvaluateBadgesResponse, HistoryParams, ProfileResponse,
    RedemptionDto, TransactionDto,
};
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RewardsError};

/// `GET /me`: Balance, level and status.
///
/// # Errors
///
/// Returns [`RewardsError::UserNotFound`] for unknown users.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Account",
    summary = "Get the caller's profile",
    params(("x-user-id" = uuid::Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, RewardsError> {
    let user = state.accounts.profile(user_id).await?;
    Ok(Json(ProfileResponse::from(user)))
}

/// `GET /me/transactions`: Ledger history, newest first.
///
/// # Errors
///
/// Returns [`RewardsError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/me/transactions",
    tag = "Account",
    summary = "List ledger rows",
    params(
        HistoryParams,
        ("x-user-id" = uuid::Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Ledger rows, newest first", body = Vec<TransactionDto>),
    )
)]
pub async fn transactions(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, RewardsError> {
    let rows = state.accounts.transactions(user_id, params.limit).await?;
    Ok(Json(rows.iter().map(TransactionDto::from).collect::<Vec<_>>()))
}

/// `GET /me/check-ins`: Check-in history, newest first.
///
/// # Errors
///
/// Returns [`RewardsError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/me/check-ins",
    tag = "Account",
    summary = "List check-ins",
    params(
        HistoryParams,
        ("x-user-id" = uuid::Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Check-ins, newest first", body = Vec<CheckInDto>),
    )
)]
pub async fn check_ins(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, RewardsError> {
    let rows = state.accounts.check_ins(user_id, params.limit).await?;
    Ok(Json(rows.iter().map(CheckInDto::from).collect::<Vec<_>>()))
}

/// `GET /me/redemptions`: The caller's redemptions, newest first.
///
/// # Errors
///
/// Returns [`RewardsError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/me/redemptions",
    tag = "Account",
    summary = "List redemptions",
    params(("x-user-id" = uuid::Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Redemptions", body = Vec<RedemptionDto>),
    )
)]
pub async fn redemptions(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, RewardsError> {
    let rows = state.redemptions.list_for_user(user_id).await?;
    Ok(Json(rows.iter().map(RedemptionDto::from).collect::<Vec<_>>()))
}

/// `GET /me/badges`: Progress toward every visible badge.
///
/// # Errors
///
/// Returns [`RewardsError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/me/badges",
    tag = "Account",
    summary = "Badge progress",
    description = "Lists every active, visible badge with the caller's recorded progress, plus hidden badges the caller already earned.",
    params(("x-user-id" = uuid::Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Badge progress", body = Vec<BadgeProgressDto>),
    )
)]
pub async fn badges(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, RewardsError> {
    let progress = state.accounts.badge_progress(user_id).await?;
    Ok(Json(
        progress.iter().map(BadgeProgressDto::from).collect::<Vec<_>>(),
    ))
}

/// `POST /me/badges/evaluate`: Re-evaluate and award badges.
///
/// # Errors
///
/// Returns [`RewardsError::AccountInactive`] for non-active users.
#[utoipa::path(
    post,
    path = "/api/v1/me/badges/evaluate",
    tag = "Account",
    summary = "Evaluate badges",
    description = "Recomputes progress for every unearned badge and awards those whose requirement is met. Idempotent.",
    params(("x-user-id" = uuid::Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Newly awarded badges", body = EvaluateBadgesResponse),
        (status = 403, description = "Account not active", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn evaluate_badges(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, RewardsError> {
    let awarded = state.badges.evaluate_and_award(user_id).await?;
    Ok(Json(EvaluateBadgesResponse::from(awarded.as_slice())))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(profile))
        .route("/me/transactions", get(transactions))
        .route("/me/check-ins", get(check_ins))
        .route("/me/redemptions", get(redemptions))
        .route("/me/badges", get(badges))
        .route("/me/badges/evaluate", post(evaluate_badges))
}
