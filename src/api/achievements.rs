use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Serialize;
use sqlx::PgPool;

use super::{internal_error, ApiError};
use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::models::AchievementWithProgress;
use crate::services::AchievementService;

#[derive(Clone)]
pub struct AchievementsAppState {
    pub achievement_service: AchievementService,
}

pub fn achievement_routes(db: PgPool, auth_service: AuthService) -> Router {
    let shared_state = AchievementsAppState {
        achievement_service: AchievementService::new(db),
    };

    Router::new()
        .route("/", get(list_achievements))
        .route("/recalculate", post(recalculate_achievements))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(shared_state)
}

#[derive(Debug, Serialize)]
pub struct RecalculateResponse {
    pub newly_unlocked: Vec<AchievementWithProgress>,
}

/// Every achievement definition joined with the caller's progress
pub async fn list_achievements(
    State(state): State<AchievementsAppState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<Vec<AchievementWithProgress>>, (StatusCode, Json<ApiError>)> {
    let achievements = state
        .achievement_service
        .get_achievements_for_user(session.user_id)
        .await
        .map_err(internal_error)?;

    Ok(Json(achievements))
}

/// On-demand recompute of the caller's progress
pub async fn recalculate_achievements(
    State(state): State<AchievementsAppState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<RecalculateResponse>, (StatusCode, Json<ApiError>)> {
    let newly_unlocked = state
        .achievement_service
        .recalculate_for_user(session.user_id)
        .await
        .map_err(internal_error)?;

    Ok(Json(RecalculateResponse { newly_unlocked }))
}
