//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`; `/health` and the
//! `/ws` feed live at the root.

pub mod dto;
pub mod extract;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::config::Config;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "trailpass",
        description = "Check-ins, badges and reward redemptions for a gamified travel rewards platform."
    ),
    paths(
        handlers::checkin::check_in,
        handlers::redemption::redeem,
        handlers::redemption::change,
        handlers::redemption::claim,
        handlers::account::profile,
        handlers::account::transactions,
        handlers::account::check_ins,
        handlers::account::redemptions,
        handlers::account::badges,
        handlers::account::evaluate_badges,
        handlers::catalog::list_destinations,
        handlers::catalog::list_rewards,
        handlers::catalog::list_badges,
        handlers::catalog::create_destination,
        handlers::catalog::create_reward,
        handlers::catalog::update_reward,
        handlers::catalog::expire_redemptions,
        handlers::system::health_handler,
    ),
    components(schemas(crate::error::ErrorResponse, crate::error::ErrorBody)),
    tags(
        (name = "Check-ins", description = "Location-verified check-in settlement"),
        (name = "Redemptions", description = "Reward redemption lifecycle"),
        (name = "Account", description = "The caller's balance, history and badges"),
        (name = "Catalog", description = "Destinations, rewards and badges"),
        (name = "Admin", description = "Catalog maintenance and expiry sweeps"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the full application: REST routes, the `/ws` feed, Swagger UI
/// (with the `swagger-ui` feature) and the tower middleware stack.
pub fn build_app(state: AppState, config: &Config) -> Router {
    let router = build_router().route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route(
        "/api-docs/openapi.json",
        get(|| async { axum::Json(ApiDoc::openapi()) }),
    );

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(config.request_timeout())),
        )
        .with_state(state)
}
