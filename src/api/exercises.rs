use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{internal_error, ApiError, PageQuery, PagedResponse};
use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::models::{CreateExerciseRequest, Exercise, MuscleGroup, UpdateExerciseRequest};
use crate::services::ExerciseService;

#[derive(Clone)]
pub struct ExercisesAppState {
    pub exercise_service: ExerciseService,
}

pub fn exercise_routes(db: PgPool, auth_service: AuthService) -> Router {
    let shared_state = ExercisesAppState {
        exercise_service: ExerciseService::new(db),
    };

    Router::new()
        .route("/", get(list_exercises).post(create_exercise))
        .route(
            "/:id",
            get(get_exercise)
                .put(update_exercise)
                .delete(delete_exercise),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(shared_state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseListQuery {
    pub muscle_group: Option<MuscleGroup>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List the built-in catalog plus the caller's custom exercises
pub async fn list_exercises(
    State(state): State<ExercisesAppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<ExerciseListQuery>,
) -> Result<Json<PagedResponse<Exercise>>, (StatusCode, Json<ApiError>)> {
    let page = PageQuery {
        page: query.page,
        page_size: query.page_size,
    };
    if let Err(message) = page.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("INVALID_PAGINATION", message)),
        ));
    }

    let (exercises, total) = state
        .exercise_service
        .list_exercises(
            session.user_id,
            query.muscle_group,
            page.get_limit(),
            page.get_offset(),
        )
        .await
        .map_err(internal_error)?;

    Ok(Json(PagedResponse::new(exercises, &page, total)))
}

pub async fn get_exercise(
    State(state): State<ExercisesAppState>,
    Extension(session): Extension<UserSession>,
    Path(exercise_id): Path<Uuid>,
) -> Result<Json<Exercise>, (StatusCode, Json<ApiError>)> {
    let exercise = state
        .exercise_service
        .get_exercise(exercise_id, session.user_id)
        .await
        .map_err(internal_error)?;

    match exercise {
        Some(exercise) => Ok(Json(exercise)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("EXERCISE_NOT_FOUND", "Exercise not found")),
        )),
    }
}

/// Create a custom exercise owned by the caller
pub async fn create_exercise(
    State(state): State<ExercisesAppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): WithRejection<Json<CreateExerciseRequest>, ApiError>,
) -> Result<(StatusCode, Json<Exercise>), (StatusCode, Json<ApiError>)> {
    if request.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "VALIDATION_ERROR",
                "Exercise name must not be empty",
            )),
        ));
    }

    let exercise = state
        .exercise_service
        .create_exercise(session.user_id, request)
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(exercise)))
}

/// Update a custom exercise. Built-in rows are not editable and fall
/// through to 404.
pub async fn update_exercise(
    State(state): State<ExercisesAppState>,
    Extension(session): Extension<UserSession>,
    Path(exercise_id): Path<Uuid>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateExerciseRequest>, ApiError>,
) -> Result<Json<Exercise>, (StatusCode, Json<ApiError>)> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ApiError::new(
                    "VALIDATION_ERROR",
                    "Exercise name must not be empty",
                )),
            ));
        }
    }

    let exercise = state
        .exercise_service
        .update_exercise(exercise_id, session.user_id, request)
        .await
        .map_err(internal_error)?;

    match exercise {
        Some(exercise) => Ok(Json(exercise)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("EXERCISE_NOT_FOUND", "Exercise not found")),
        )),
    }
}

/// Delete a custom exercise unless a workout template still references it
pub async fn delete_exercise(
    State(state): State<ExercisesAppState>,
    Extension(session): Extension<UserSession>,
    Path(exercise_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ApiError>)> {
    let exercise = state
        .exercise_service
        .get_exercise(exercise_id, session.user_id)
        .await
        .map_err(internal_error)?;

    // Built-ins are immutable; treat them the same as missing rows
    let owned = matches!(exercise, Some(ref exercise) if exercise.created_by == Some(session.user_id));
    if !owned {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("EXERCISE_NOT_FOUND", "Exercise not found")),
        ));
    }

    let in_use = state
        .exercise_service
        .exercise_in_use(exercise_id)
        .await
        .map_err(internal_error)?;
    if in_use {
        return Err((
            StatusCode::CONFLICT,
            Json(ApiError::new(
                "EXERCISE_IN_USE",
                "Exercise is referenced by a workout and cannot be deleted",
            )),
        ));
    }

    let deleted = state
        .exercise_service
        .delete_exercise(exercise_id, session.user_id)
        .await
        .map_err(internal_error)?;

    if !deleted {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("EXERCISE_NOT_FOUND", "Exercise not found")),
        ));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Exercise deleted successfully"
    })))
}
