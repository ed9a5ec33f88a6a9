//! REST endpoint handlers organized by resource.

pub mod account;
pub mod catalog;
pub mod checkin;
pub mod redemption;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(checkin::routes())
        .merge(redemption::routes())
        .merge(account::routes())
        .merge(catalog::routes())
}
