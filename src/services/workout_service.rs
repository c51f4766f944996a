use anyhow::Result;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{
    CreateWorkoutRequest, UpdateWorkoutRequest, Workout, WorkoutDetail, WorkoutExerciseDetail,
    WorkoutExerciseInput, WorkoutSummary,
};

const DEFAULT_REST_SECONDS: i32 = 60;

#[derive(Clone)]
pub struct WorkoutService {
    db: PgPool,
}

impl WorkoutService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_workouts(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<WorkoutSummary>, i64)> {
        let workouts = sqlx::query_as::<_, WorkoutSummary>(
            "SELECT w.id, w.user_id, w.name, w.description, w.difficulty,
                    COUNT(we.id) AS exercise_count,
                    w.created_at, w.updated_at
             FROM workouts w
             LEFT JOIN workout_exercises we ON we.workout_id = w.id
             WHERE w.user_id = $1
             GROUP BY w.id
             ORDER BY w.created_at DESC
             LIMIT $2 OFFSET $3"
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM workouts WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok((workouts, total))
    }

    pub async fn get_workout(&self, workout_id: Uuid, user_id: Uuid) -> Result<Option<WorkoutDetail>> {
        let workout = sqlx::query_as::<_, Workout>(
            "SELECT id, user_id, name, description, difficulty, created_at, updated_at
             FROM workouts
             WHERE id = $1 AND user_id = $2"
        )
        .bind(workout_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        let workout = match workout {
            Some(workout) => workout,
            None => return Ok(None),
        };

        let mut conn = self.db.acquire().await?;
        let exercises = Self::workout_entries(&mut conn, workout.id).await?;

        Ok(Some(WorkoutDetail { workout, exercises }))
    }

    /// Insert the template and its ordered exercise list in one transaction
    pub async fn create_workout(
        &self,
        user_id: Uuid,
        request: CreateWorkoutRequest,
    ) -> Result<WorkoutDetail> {
        let mut tx = self.db.begin().await?;

        let workout = sqlx::query_as::<_, Workout>(
            "INSERT INTO workouts (id, user_id, name, description, difficulty, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
             RETURNING id, user_id, name, description, difficulty, created_at, updated_at"
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.difficulty)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_entries(&mut tx, workout.id, &request.exercises).await?;
        let exercises = Self::workout_entries(&mut tx, workout.id).await?;

        tx.commit().await?;

        Ok(WorkoutDetail { workout, exercises })
    }

    /// Full replace: template fields plus the whole exercise list
    pub async fn update_workout(
        &self,
        workout_id: Uuid,
        user_id: Uuid,
        request: UpdateWorkoutRequest,
    ) -> Result<Option<WorkoutDetail>> {
        let mut tx = self.db.begin().await?;

        let workout = sqlx::query_as::<_, Workout>(
            "UPDATE workouts SET name = $3, description = $4, difficulty = $5, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING id, user_id, name, description, difficulty, created_at, updated_at"
        )
        .bind(workout_id)
        .bind(user_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.difficulty)
        .fetch_optional(&mut *tx)
        .await?;

        let workout = match workout {
            Some(workout) => workout,
            None => return Ok(None),
        };

        sqlx::query("DELETE FROM workout_exercises WHERE workout_id = $1")
            .bind(workout_id)
            .execute(&mut *tx)
            .await?;

        Self::insert_entries(&mut tx, workout.id, &request.exercises).await?;
        let exercises = Self::workout_entries(&mut tx, workout.id).await?;

        tx.commit().await?;

        Ok(Some(WorkoutDetail { workout, exercises }))
    }

    /// Logs pointing at the template keep their snapshot; the FK nulls out.
    pub async fn delete_workout(&self, workout_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = $1 AND user_id = $2")
            .bind(workout_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_entries(
        tx: &mut Transaction<'_, Postgres>,
        workout_id: Uuid,
        entries: &[WorkoutExerciseInput],
    ) -> Result<()> {
        for (position, entry) in entries.iter().enumerate() {
            sqlx::query(
                "INSERT INTO workout_exercises
                    (id, workout_id, exercise_id, position, sets, reps, rest_seconds, target_weight_kg, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())"
            )
            .bind(Uuid::new_v4())
            .bind(workout_id)
            .bind(entry.exercise_id)
            .bind(position as i32)
            .bind(entry.sets)
            .bind(entry.reps)
            .bind(entry.rest_seconds.unwrap_or(DEFAULT_REST_SECONDS))
            .bind(entry.target_weight_kg)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn workout_entries(
        conn: &mut PgConnection,
        workout_id: Uuid,
    ) -> Result<Vec<WorkoutExerciseDetail>> {
        let entries = sqlx::query_as::<_, WorkoutExerciseDetail>(
            "SELECT we.id, we.exercise_id, e.name AS exercise_name, e.muscle_group,
                    we.position, we.sets, we.reps, we.rest_seconds, we.target_weight_kg
             FROM workout_exercises we
             JOIN exercises e ON e.id = we.exercise_id
             WHERE we.workout_id = $1
             ORDER BY we.position"
        )
        .bind(workout_id)
        .fetch_all(conn)
        .await?;

        Ok(entries)
    }
}
