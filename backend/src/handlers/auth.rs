//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, AuthTokens, Credentials, UserProfile};
use crate::AppState;

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), &state.config.jwt)
}

/// Register endpoint handler
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> AppResult<(StatusCode, Json<AuthTokens>)> {
    let tokens = auth_service(&state).register(body).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> AppResult<Json<AuthTokens>> {
    let tokens = auth_service(&state).login(body).await?;
    Ok(Json(tokens))
}

/// Refresh token endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<AuthTokens>> {
    let tokens = auth_service(&state).refresh(&body.refresh_token).await?;
    Ok(Json(tokens))
}

/// Logout endpoint handler; the user's in-memory analysis ends with the session
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<StatusCode> {
    if let Some(user_id) = auth_service(&state).logout(&body.refresh_token).await? {
        state.pipelines.remove(user_id).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Session restore: the user behind the access token
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserProfile>> {
    let profile = auth_service(&state).get_user(current_user.0.user_id).await?;
    Ok(Json(profile))
}
