use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{internal_error, ApiError, PageQuery, PagedResponse};
use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::models::{
    RecordSetRequest, SetLog, StartWorkoutLogRequest, UpdateWorkoutLogRequest, WorkoutLog,
    WorkoutLogDetail, WorkoutLogStatus,
};
use crate::services::{AchievementService, WorkoutLogService};

#[derive(Clone)]
pub struct WorkoutLogsAppState {
    pub workout_log_service: WorkoutLogService,
    pub achievement_service: AchievementService,
}

pub fn workout_log_routes(db: PgPool, auth_service: AuthService) -> Router {
    let shared_state = WorkoutLogsAppState {
        workout_log_service: WorkoutLogService::new(db.clone()),
        achievement_service: AchievementService::new(db),
    };

    Router::new()
        .route("/", get(list_workout_logs).post(start_workout_log))
        .route("/:id", get(get_workout_log).patch(update_workout_log))
        .route("/:id/sets", post(record_set))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(shared_state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLogListQuery {
    pub status: Option<WorkoutLogStatus>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Open a session from a workout template
pub async fn start_workout_log(
    State(state): State<WorkoutLogsAppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): WithRejection<Json<StartWorkoutLogRequest>, ApiError>,
) -> Result<(StatusCode, Json<WorkoutLogDetail>), (StatusCode, Json<ApiError>)> {
    let detail = state
        .workout_log_service
        .start_workout(session.user_id, request.workout_id)
        .await
        .map_err(internal_error)?;

    match detail {
        Some(detail) => Ok((StatusCode::CREATED, Json(detail))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("WORKOUT_NOT_FOUND", "Workout not found")),
        )),
    }
}

pub async fn list_workout_logs(
    State(state): State<WorkoutLogsAppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<WorkoutLogListQuery>,
) -> Result<Json<PagedResponse<WorkoutLog>>, (StatusCode, Json<ApiError>)> {
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

    let (logs, total) = state
        .workout_log_service
        .list_logs(
            session.user_id,
            query.status,
            page.get_limit(),
            page.get_offset(),
        )
        .await
        .map_err(internal_error)?;

    Ok(Json(PagedResponse::new(logs, &page, total)))
}

/// Full session detail: the log plus exercise snapshots and recorded sets
pub async fn get_workout_log(
    State(state): State<WorkoutLogsAppState>,
    Extension(session): Extension<UserSession>,
    Path(log_id): Path<Uuid>,
) -> Result<Json<WorkoutLogDetail>, (StatusCode, Json<ApiError>)> {
    let detail = state
        .workout_log_service
        .get_log_detail(log_id, session.user_id)
        .await
        .map_err(internal_error)?;

    match detail {
        Some(detail) => Ok(Json(detail)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("LOG_NOT_FOUND", "Workout log not found")),
        )),
    }
}

/// Partial session-state update: indexes, rest timer, notes, status.
/// Last write wins; concurrent clients of the same session race by design.
pub async fn update_workout_log(
    State(state): State<WorkoutLogsAppState>,
    Extension(session): Extension<UserSession>,
    Path(log_id): Path<Uuid>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateWorkoutLogRequest>, ApiError>,
) -> Result<Json<WorkoutLog>, (StatusCode, Json<ApiError>)> {
    if request.current_exercise_index.map_or(false, |index| index < 0)
        || request.current_set_index.map_or(false, |index| index < 0)
    {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "VALIDATION_ERROR",
                "Session indexes must not be negative",
            )),
        ));
    }

    let log = state
        .workout_log_service
        .get_log(log_id, session.user_id)
        .await
        .map_err(internal_error)?;

    let log = match log {
        Some(log) => log,
        None => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ApiError::new("LOG_NOT_FOUND", "Workout log not found")),
            ))
        }
    };

    if log.status != WorkoutLogStatus::InProgress {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "INVALID_STATE",
                "Workout log is no longer in progress",
            )),
        ));
    }

    let updated = state
        .workout_log_service
        .update_log(&log, request)
        .await
        .map_err(internal_error)?;

    let updated = match updated {
        Some(updated) => updated,
        None => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ApiError::new("LOG_NOT_FOUND", "Workout log not found")),
            ))
        }
    };

    // A finished session feeds the achievement metrics; failures here must
    // never fail the PATCH itself
    if updated.status == WorkoutLogStatus::Completed {
        if let Err(e) = state
            .achievement_service
            .recalculate_for_user(session.user_id)
            .await
        {
            tracing::warn!(
                "Achievement recalculation failed for user {}: {:#}",
                session.user_id,
                e
            );
        }
    }

    Ok(Json(updated))
}

/// Record the performance of one set. Re-submitting the same set number
/// overwrites the previous entry.
pub async fn record_set(
    State(state): State<WorkoutLogsAppState>,
    Extension(session): Extension<UserSession>,
    Path(log_id): Path<Uuid>,
    WithRejection(Json(request), _): WithRejection<Json<RecordSetRequest>, ApiError>,
) -> Result<Json<SetLog>, (StatusCode, Json<ApiError>)> {
    if request.set_number < 1 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "VALIDATION_ERROR",
                "Set number must be at least 1",
            )),
        ));
    }
    if request.reps < 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "VALIDATION_ERROR",
                "Reps must not be negative",
            )),
        ));
    }
    if request.weight_kg.map_or(false, |weight| weight < 0.0) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "VALIDATION_ERROR",
                "Weight must not be negative",
            )),
        ));
    }

    let log = state
        .workout_log_service
        .get_log(log_id, session.user_id)
        .await
        .map_err(internal_error)?;

    let log = match log {
        Some(log) => log,
        None => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ApiError::new("LOG_NOT_FOUND", "Workout log not found")),
            ))
        }
    };

    if log.status != WorkoutLogStatus::InProgress {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "INVALID_STATE",
                "Sets can only be recorded while the session is in progress",
            )),
        ));
    }

    let set = state
        .workout_log_service
        .record_set(log_id, request)
        .await
        .map_err(internal_error)?;

    match set {
        Some(set) => Ok(Json(set)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new(
                "EXERCISE_LOG_NOT_FOUND",
                "Exercise log does not belong to this workout log",
            )),
        )),
    }
}
