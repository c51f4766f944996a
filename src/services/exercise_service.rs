use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateExerciseRequest, Exercise, MuscleGroup, UpdateExerciseRequest};

#[derive(Clone)]
pub struct ExerciseService {
    db: PgPool,
}

impl ExerciseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Built-in exercises plus the user's own, optionally filtered by muscle group
    pub async fn list_exercises(
        &self,
        user_id: Uuid,
        muscle_group: Option<MuscleGroup>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Exercise>, i64)> {
        let exercises = sqlx::query_as::<_, Exercise>(
            "SELECT id, name, description, muscle_group, equipment, created_by, created_at, updated_at
             FROM exercises
             WHERE (created_by IS NULL OR created_by = $1)
               AND ($2::muscle_group IS NULL OR muscle_group = $2)
             ORDER BY name
             LIMIT $3 OFFSET $4"
        )
        .bind(user_id)
        .bind(&muscle_group)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM exercises
             WHERE (created_by IS NULL OR created_by = $1)
               AND ($2::muscle_group IS NULL OR muscle_group = $2)"
        )
        .bind(user_id)
        .bind(&muscle_group)
        .fetch_one(&self.db)
        .await?;

        Ok((exercises, total))
    }

    pub async fn get_exercise(&self, exercise_id: Uuid, user_id: Uuid) -> Result<Option<Exercise>> {
        let exercise = sqlx::query_as::<_, Exercise>(
            "SELECT id, name, description, muscle_group, equipment, created_by, created_at, updated_at
             FROM exercises
             WHERE id = $1 AND (created_by IS NULL OR created_by = $2)"
        )
        .bind(exercise_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(exercise)
    }

    pub async fn create_exercise(
        &self,
        user_id: Uuid,
        request: CreateExerciseRequest,
    ) -> Result<Exercise> {
        let exercise = sqlx::query_as::<_, Exercise>(
            "INSERT INTO exercises (id, name, description, muscle_group, equipment, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
             RETURNING id, name, description, muscle_group, equipment, created_by, created_at, updated_at"
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.muscle_group)
        .bind(&request.equipment)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(exercise)
    }

    /// Partial update; only custom exercises owned by the user are touched,
    /// so built-ins fall through to a 404 at the handler.
    pub async fn update_exercise(
        &self,
        exercise_id: Uuid,
        user_id: Uuid,
        request: UpdateExerciseRequest,
    ) -> Result<Option<Exercise>> {
        let exercise = sqlx::query_as::<_, Exercise>(
            "UPDATE exercises SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                muscle_group = COALESCE($5, muscle_group),
                equipment = COALESCE($6, equipment),
                updated_at = NOW()
             WHERE id = $1 AND created_by = $2
             RETURNING id, name, description, muscle_group, equipment, created_by, created_at, updated_at"
        )
        .bind(exercise_id)
        .bind(user_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.muscle_group)
        .bind(&request.equipment)
        .fetch_optional(&self.db)
        .await?;

        Ok(exercise)
    }

    /// Count how many of the given ids resolve to exercises visible to the user
    pub async fn count_visible(&self, exercise_ids: Vec<Uuid>, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM exercises
             WHERE id = ANY($1) AND (created_by IS NULL OR created_by = $2)",
        )
        .bind(exercise_ids)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// True when a workout template still references the exercise.
    /// Historical logs keep their own snapshot and do not block deletion.
    pub async fn exercise_in_use(&self, exercise_id: Uuid) -> Result<bool> {
        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM workout_exercises WHERE exercise_id = $1)"
        )
        .bind(exercise_id)
        .fetch_one(&self.db)
        .await?;

        Ok(in_use)
    }

    pub async fn delete_exercise(&self, exercise_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1 AND created_by = $2")
            .bind(exercise_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
