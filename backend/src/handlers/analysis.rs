//! Location analysis handlers
//!
//! Provider failures come back as a 200 with the failure recorded in the view;
//! only bad input and invalid transitions are HTTP errors.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::pipeline::AnalysisView;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitLocationRequest {
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectSoilTypeRequest {
    pub soil_type_id: String,
}

/// Current analysis for the signed-in user
pub async fn get_analysis(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Json<AnalysisView> {
    let pipeline = state.pipelines.get_or_create(current_user.0.user_id).await;
    Json(pipeline.view().await)
}

/// Analyze a location
pub async fn submit_location(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<SubmitLocationRequest>,
) -> AppResult<Json<AnalysisView>> {
    let pipeline = state.pipelines.get_or_create(current_user.0.user_id).await;
    let view = pipeline.submit(&body.location).await?;
    Ok(Json(view))
}

/// Choose a different soil type from the current analysis
pub async fn select_soil_type(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<SelectSoilTypeRequest>,
) -> AppResult<Json<AnalysisView>> {
    let pipeline = state.pipelines.get_or_create(current_user.0.user_id).await;
    let view = pipeline.select_soil_type(&body.soil_type_id).await?;
    Ok(Json(view))
}
