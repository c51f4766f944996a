use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::MuscleGroup;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "difficulty", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// Workout template
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Template list row with its exercise count
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkoutSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub exercise_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Template entry joined with the exercise it references
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkoutExerciseDetail {
    pub id: Uuid,
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub muscle_group: MuscleGroup,
    pub position: i32,
    pub sets: i32,
    pub reps: i32,
    pub rest_seconds: i32,
    pub target_weight_kg: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct WorkoutDetail {
    pub workout: Workout,
    pub exercises: Vec<WorkoutExerciseDetail>,
}

#[derive(Debug, Deserialize)]
pub struct WorkoutExerciseInput {
    pub exercise_id: Uuid,
    pub sets: i32,
    pub reps: i32,
    pub rest_seconds: Option<i32>,
    pub target_weight_kg: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkoutRequest {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    /// Ordered list; a template without exercises is rejected
    pub exercises: Vec<WorkoutExerciseInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkoutRequest {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    /// Replaces the entire exercise list
    pub exercises: Vec<WorkoutExerciseInput>,
}
