//! Route definitions for the Cropwise advisory platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public, except session restore)
        .nest("/auth", auth_routes(state.clone()))
        // Public market search
        .nest("/market", market_routes())
        // Protected routes - location analysis
        .nest("/analysis", analysis_routes(state.clone()))
        // Protected routes - vendor listings
        .nest("/listings", listing_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/logout", post(handlers::logout))
        .merge(
            Router::new()
                .route("/me", get(handlers::me))
                .route_layer(middleware::from_fn_with_state(state, auth_middleware)),
        )
}

/// Market routes (public)
fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(handlers::search_market))
        .route("/categories/:product_type", get(handlers::get_category_options))
}

/// Analysis pipeline routes (protected)
fn analysis_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::get_analysis).post(handlers::submit_location),
        )
        .route("/soil", post(handlers::select_soil_type))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Listing management routes (protected)
fn listing_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_listings).post(handlers::create_listing),
        )
        .route(
            "/:listing_id",
            put(handlers::update_listing).delete(handlers::delete_listing),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
