//! Market listing HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::listing::{CreateListingInput, MarketListingService, UpdateListingInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// List the current user's listings
pub async fn list_listings(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> impl IntoResponse {
    let service = MarketListingService::new(state.db.clone());

    match service.list_own(current_user.0.user_id).await {
        Ok(listings) => {
            (StatusCode::OK, Json(serde_json::json!({ "listings": listings }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Create a listing
pub async fn create_listing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateListingInput>,
) -> impl IntoResponse {
    let service = MarketListingService::new(state.db.clone());

    match service.create(current_user.0.user_id, input).await {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update one of the current user's listings
pub async fn update_listing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(listing_id): Path<Uuid>,
    Json(input): Json<UpdateListingInput>,
) -> impl IntoResponse {
    let service = MarketListingService::new(state.db.clone());

    match service.update(current_user.0.user_id, listing_id, input).await {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete one of the current user's listings
pub async fn delete_listing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(listing_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = MarketListingService::new(state.db.clone());

    match service.delete(current_user.0.user_id, listing_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Public search across all listings
pub async fn search_market(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let service = MarketListingService::new(state.db.clone());

    match service.search(&query.q).await {
        Ok(listings) => {
            (StatusCode::OK, Json(serde_json::json!({ "listings": listings }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Categories allowed for a product type
pub async fn get_category_options(Path(product_type): Path<String>) -> impl IntoResponse {
    match MarketListingService::category_options(&product_type) {
        Ok(categories) => (
            StatusCode::OK,
            Json(serde_json::json!({ "categories": categories })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
