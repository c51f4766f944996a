use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workout_log_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkoutLogStatus {
    InProgress,
    Completed,
    Abandoned,
}

/// A workout session. While in progress it carries the live session state:
/// which exercise and set the user is on, and the rest-timer deadline a
/// reconnecting client should resume counting down from.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkoutLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workout_id: Option<Uuid>,
    pub workout_name: String,
    pub status: WorkoutLogStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub current_exercise_index: i32,
    pub current_set_index: i32,
    pub rest_timer_ends_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-exercise snapshot taken from the template when the session starts
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExerciseLog {
    pub id: Uuid,
    pub workout_log_id: Uuid,
    pub exercise_id: Option<Uuid>,
    pub exercise_name: String,
    pub position: i32,
    pub target_sets: i32,
    pub target_reps: i32,
    pub target_rest_seconds: i32,
    pub target_weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SetLog {
    pub id: Uuid,
    pub exercise_log_id: Uuid,
    pub set_number: i32,
    pub reps: i32,
    pub weight_kg: Option<f64>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ExerciseLogDetail {
    pub exercise_log: ExerciseLog,
    pub sets: Vec<SetLog>,
}

#[derive(Debug, Serialize)]
pub struct WorkoutLogDetail {
    pub log: WorkoutLog,
    pub exercises: Vec<ExerciseLogDetail>,
}

#[derive(Debug, Deserialize)]
pub struct StartWorkoutLogRequest {
    pub workout_id: Uuid,
}

/// Partial session-state update. Absent fields stay untouched; moving to a
/// new exercise or set clears a stale rest timer unless the request sets one.
#[derive(Debug, Deserialize)]
pub struct UpdateWorkoutLogRequest {
    pub current_exercise_index: Option<i32>,
    pub current_set_index: Option<i32>,
    pub rest_timer_ends_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub status: Option<WorkoutLogStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RecordSetRequest {
    pub exercise_log_id: Uuid,
    pub set_number: i32,
    pub reps: i32,
    pub weight_kg: Option<f64>,
}
