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
use crate::models::{
    CreateWorkoutRequest, UpdateWorkoutRequest, WorkoutDetail, WorkoutExerciseInput,
    WorkoutSummary,
};
use crate::services::{ExerciseService, WorkoutService};

#[derive(Clone)]
pub struct WorkoutsAppState {
    pub workout_service: WorkoutService,
    pub exercise_service: ExerciseService,
}

pub fn workout_routes(db: PgPool, auth_service: AuthService) -> Router {
    let shared_state = WorkoutsAppState {
        workout_service: WorkoutService::new(db.clone()),
        exercise_service: ExerciseService::new(db),
    };

    Router::new()
        .route("/", get(list_workouts).post(create_workout))
        .route(
            "/:id",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(shared_state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

pub async fn list_workouts(
    State(state): State<WorkoutsAppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<WorkoutListQuery>,
) -> Result<Json<PagedResponse<WorkoutSummary>>, (StatusCode, Json<ApiError>)> {
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

    let (workouts, total) = state
        .workout_service
        .list_workouts(session.user_id, page.get_limit(), page.get_offset())
        .await
        .map_err(internal_error)?;

    Ok(Json(PagedResponse::new(workouts, &page, total)))
}

pub async fn get_workout(
    State(state): State<WorkoutsAppState>,
    Extension(session): Extension<UserSession>,
    Path(workout_id): Path<Uuid>,
) -> Result<Json<WorkoutDetail>, (StatusCode, Json<ApiError>)> {
    let workout = state
        .workout_service
        .get_workout(workout_id, session.user_id)
        .await
        .map_err(internal_error)?;

    match workout {
        Some(workout) => Ok(Json(workout)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("WORKOUT_NOT_FOUND", "Workout not found")),
        )),
    }
}

/// Create a workout template together with its ordered exercise entries
pub async fn create_workout(
    State(state): State<WorkoutsAppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): WithRejection<Json<CreateWorkoutRequest>, ApiError>,
) -> Result<(StatusCode, Json<WorkoutDetail>), (StatusCode, Json<ApiError>)> {
    if let Err(message) = validate_workout_entries(&request.name, &request.exercises) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("VALIDATION_ERROR", message)),
        ));
    }
    check_exercises_visible(&state, session.user_id, &request.exercises).await?;

    let workout = state
        .workout_service
        .create_workout(session.user_id, request)
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(workout)))
}

/// Replace the template metadata and its entire exercise list
pub async fn update_workout(
    State(state): State<WorkoutsAppState>,
    Extension(session): Extension<UserSession>,
    Path(workout_id): Path<Uuid>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateWorkoutRequest>, ApiError>,
) -> Result<Json<WorkoutDetail>, (StatusCode, Json<ApiError>)> {
    if let Err(message) = validate_workout_entries(&request.name, &request.exercises) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("VALIDATION_ERROR", message)),
        ));
    }
    check_exercises_visible(&state, session.user_id, &request.exercises).await?;

    let workout = state
        .workout_service
        .update_workout(workout_id, session.user_id, request)
        .await
        .map_err(internal_error)?;

    match workout {
        Some(workout) => Ok(Json(workout)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("WORKOUT_NOT_FOUND", "Workout not found")),
        )),
    }
}

/// Delete a template. Finished sessions keep their snapshots.
pub async fn delete_workout(
    State(state): State<WorkoutsAppState>,
    Extension(session): Extension<UserSession>,
    Path(workout_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ApiError>)> {
    let deleted = state
        .workout_service
        .delete_workout(workout_id, session.user_id)
        .await
        .map_err(internal_error)?;

    if !deleted {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("WORKOUT_NOT_FOUND", "Workout not found")),
        ));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Workout deleted successfully"
    })))
}

async fn check_exercises_visible(
    state: &WorkoutsAppState,
    user_id: Uuid,
    exercises: &[WorkoutExerciseInput],
) -> Result<(), (StatusCode, Json<ApiError>)> {
    let mut ids: Vec<Uuid> = exercises.iter().map(|entry| entry.exercise_id).collect();
    ids.sort();
    ids.dedup();

    let expected = ids.len() as i64;
    let visible = state
        .exercise_service
        .count_visible(ids, user_id)
        .await
        .map_err(internal_error)?;

    if visible != expected {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "UNKNOWN_EXERCISE",
                "One or more exercise ids do not exist or are not visible",
            )),
        ));
    }

    Ok(())
}

fn validate_workout_entries(
    name: &str,
    exercises: &[WorkoutExerciseInput],
) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Workout name must not be empty");
    }
    if exercises.is_empty() {
        return Err("A workout needs at least one exercise");
    }

    for entry in exercises {
        if entry.sets < 1 {
            return Err("Each exercise needs at least one set");
        }
        if entry.reps < 1 {
            return Err("Each exercise needs at least one rep");
        }
        if entry.rest_seconds.map_or(false, |rest| rest < 0) {
            return Err("Rest seconds must not be negative");
        }
        if entry.target_weight_kg.map_or(false, |weight| weight < 0.0) {
            return Err("Target weight must not be negative");
        }
    }

    Ok(())
}
