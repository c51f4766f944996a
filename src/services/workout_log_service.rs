use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    ExerciseLog, ExerciseLogDetail, RecordSetRequest, SetLog, UpdateWorkoutLogRequest, WorkoutLog,
    WorkoutLogDetail, WorkoutLogStatus,
};

#[derive(Clone)]
pub struct WorkoutLogService {
    db: PgPool,
}

impl WorkoutLogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open a session from a template: the workout name and every exercise
    /// entry are copied into the log so later template edits or deletions
    /// cannot rewrite history. Returns None when the template is not visible.
    pub async fn start_workout(
        &self,
        user_id: Uuid,
        workout_id: Uuid,
    ) -> Result<Option<WorkoutLogDetail>> {
        let mut tx = self.db.begin().await?;

        let workout_name = sqlx::query_scalar::<_, String>(
            "SELECT name FROM workouts WHERE id = $1 AND user_id = $2"
        )
        .bind(workout_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let workout_name = match workout_name {
            Some(name) => name,
            None => return Ok(None),
        };

        let log = sqlx::query_as::<_, WorkoutLog>(
            "INSERT INTO workout_logs
                (id, user_id, workout_id, workout_name, status, started_at,
                 current_exercise_index, current_set_index, created_at, updated_at)
             VALUES ($1, $2, $3, $4, 'in_progress', NOW(), 0, 0, NOW(), NOW())
             RETURNING id, user_id, workout_id, workout_name, status, started_at, completed_at,
                       current_exercise_index, current_set_index, rest_timer_ends_at, notes,
                       created_at, updated_at"
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(workout_id)
        .bind(&workout_name)
        .fetch_one(&mut *tx)
        .await?;

        let snapshots = sqlx::query_as::<_, ExerciseLog>(
            "INSERT INTO exercise_logs
                (id, workout_log_id, exercise_id, exercise_name, position,
                 target_sets, target_reps, target_rest_seconds, target_weight_kg)
             SELECT gen_random_uuid(), $1, we.exercise_id, e.name, we.position,
                    we.sets, we.reps, we.rest_seconds, we.target_weight_kg
             FROM workout_exercises we
             JOIN exercises e ON e.id = we.exercise_id
             WHERE we.workout_id = $2
             RETURNING id, workout_log_id, exercise_id, exercise_name, position,
                       target_sets, target_reps, target_rest_seconds, target_weight_kg"
        )
        .bind(log.id)
        .bind(workout_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut exercises: Vec<ExerciseLogDetail> = snapshots
            .into_iter()
            .map(|exercise_log| ExerciseLogDetail { exercise_log, sets: Vec::new() })
            .collect();
        exercises.sort_by_key(|detail| detail.exercise_log.position);

        Ok(Some(WorkoutLogDetail { log, exercises }))
    }

    pub async fn list_logs(
        &self,
        user_id: Uuid,
        status: Option<WorkoutLogStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<WorkoutLog>, i64)> {
        let logs = sqlx::query_as::<_, WorkoutLog>(
            "SELECT id, user_id, workout_id, workout_name, status, started_at, completed_at,
                    current_exercise_index, current_set_index, rest_timer_ends_at, notes,
                    created_at, updated_at
             FROM workout_logs
             WHERE user_id = $1
               AND ($2::workout_log_status IS NULL OR status = $2)
             ORDER BY started_at DESC
             LIMIT $3 OFFSET $4"
        )
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM workout_logs
             WHERE user_id = $1
               AND ($2::workout_log_status IS NULL OR status = $2)"
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        Ok((logs, total))
    }

    pub async fn get_log(&self, log_id: Uuid, user_id: Uuid) -> Result<Option<WorkoutLog>> {
        let log = sqlx::query_as::<_, WorkoutLog>(
            "SELECT id, user_id, workout_id, workout_name, status, started_at, completed_at,
                    current_exercise_index, current_set_index, rest_timer_ends_at, notes,
                    created_at, updated_at
             FROM workout_logs
             WHERE id = $1 AND user_id = $2"
        )
        .bind(log_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(log)
    }

    pub async fn get_log_detail(
        &self,
        log_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<WorkoutLogDetail>> {
        let log = match self.get_log(log_id, user_id).await? {
            Some(log) => log,
            None => return Ok(None),
        };

        let exercise_logs = sqlx::query_as::<_, ExerciseLog>(
            "SELECT id, workout_log_id, exercise_id, exercise_name, position,
                    target_sets, target_reps, target_rest_seconds, target_weight_kg
             FROM exercise_logs
             WHERE workout_log_id = $1
             ORDER BY position"
        )
        .bind(log.id)
        .fetch_all(&self.db)
        .await?;

        let exercise_log_ids: Vec<Uuid> = exercise_logs.iter().map(|e| e.id).collect();
        let sets = sqlx::query_as::<_, SetLog>(
            "SELECT id, exercise_log_id, set_number, reps, weight_kg, completed_at
             FROM set_logs
             WHERE exercise_log_id = ANY($1)
             ORDER BY set_number"
        )
        .bind(&exercise_log_ids)
        .fetch_all(&self.db)
        .await?;

        let mut sets_by_exercise: HashMap<Uuid, Vec<SetLog>> = HashMap::new();
        for set in sets {
            sets_by_exercise.entry(set.exercise_log_id).or_default().push(set);
        }

        let exercises = exercise_logs
            .into_iter()
            .map(|exercise_log| {
                let sets = sets_by_exercise.remove(&exercise_log.id).unwrap_or_default();
                ExerciseLogDetail { exercise_log, sets }
            })
            .collect();

        Ok(Some(WorkoutLogDetail { log, exercises }))
    }

    /// Apply a partial session-state update to a non-terminal log. The caller
    /// has already fetched the log and rejected terminal sessions; writes are
    /// last-write-wins, so concurrent updates simply race.
    pub async fn update_log(
        &self,
        log: &WorkoutLog,
        request: UpdateWorkoutLogRequest,
    ) -> Result<Option<WorkoutLog>> {
        let patch = resolve_session_patch(log, &request, Utc::now());
        let notes = request.notes.or_else(|| log.notes.clone());

        let updated = sqlx::query_as::<_, WorkoutLog>(
            "UPDATE workout_logs SET
                current_exercise_index = $3,
                current_set_index = $4,
                rest_timer_ends_at = $5,
                notes = $6,
                status = $7,
                completed_at = $8,
                updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING id, user_id, workout_id, workout_name, status, started_at, completed_at,
                       current_exercise_index, current_set_index, rest_timer_ends_at, notes,
                       created_at, updated_at"
        )
        .bind(log.id)
        .bind(log.user_id)
        .bind(patch.current_exercise_index)
        .bind(patch.current_set_index)
        .bind(patch.rest_timer_ends_at)
        .bind(notes)
        .bind(patch.status)
        .bind(patch.completed_at)
        .fetch_optional(&self.db)
        .await?;

        Ok(updated)
    }

    /// Record one set, overwriting any earlier submission for the same slot.
    /// Returns None when the exercise log does not belong to the session.
    pub async fn record_set(
        &self,
        log_id: Uuid,
        request: RecordSetRequest,
    ) -> Result<Option<SetLog>> {
        let belongs = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM exercise_logs WHERE id = $1 AND workout_log_id = $2)"
        )
        .bind(request.exercise_log_id)
        .bind(log_id)
        .fetch_one(&self.db)
        .await?;

        if !belongs {
            return Ok(None);
        }

        let set = sqlx::query_as::<_, SetLog>(
            "INSERT INTO set_logs (id, exercise_log_id, set_number, reps, weight_kg, completed_at)
             VALUES ($1, $2, $3, $4, $5, NOW())
             ON CONFLICT (exercise_log_id, set_number) DO UPDATE SET
                reps = EXCLUDED.reps,
                weight_kg = EXCLUDED.weight_kg,
                completed_at = NOW()
             RETURNING id, exercise_log_id, set_number, reps, weight_kg, completed_at"
        )
        .bind(Uuid::new_v4())
        .bind(request.exercise_log_id)
        .bind(request.set_number)
        .bind(request.reps)
        .bind(request.weight_kg)
        .fetch_one(&self.db)
        .await?;

        Ok(Some(set))
    }
}

/// Resolved field values for a session-state UPDATE
struct SessionPatch {
    current_exercise_index: i32,
    current_set_index: i32,
    status: WorkoutLogStatus,
    rest_timer_ends_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

fn resolve_session_patch(
    log: &WorkoutLog,
    request: &UpdateWorkoutLogRequest,
    now: DateTime<Utc>,
) -> SessionPatch {
    let current_exercise_index = request
        .current_exercise_index
        .unwrap_or(log.current_exercise_index);
    let current_set_index = request.current_set_index.unwrap_or(log.current_set_index);
    let status = request.status.unwrap_or(log.status);

    let index_moved = current_exercise_index != log.current_exercise_index
        || current_set_index != log.current_set_index;
    let terminal = matches!(
        status,
        WorkoutLogStatus::Completed | WorkoutLogStatus::Abandoned
    );

    // A finished session has no pending rest; an index move invalidates
    // whatever deadline the previous set left behind.
    let rest_timer_ends_at = if terminal {
        None
    } else {
        match request.rest_timer_ends_at {
            Some(deadline) => Some(deadline),
            None if index_moved => None,
            None => log.rest_timer_ends_at,
        }
    };

    let completed_at = if terminal { Some(now) } else { None };

    SessionPatch {
        current_exercise_index,
        current_set_index,
        status,
        rest_timer_ends_at,
        completed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn in_progress_log() -> WorkoutLog {
        WorkoutLog {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            workout_id: Some(Uuid::new_v4()),
            workout_name: "Push Day".to_string(),
            status: WorkoutLogStatus::InProgress,
            started_at: Utc::now(),
            completed_at: None,
            current_exercise_index: 1,
            current_set_index: 2,
            rest_timer_ends_at: Some(Utc::now() + Duration::seconds(90)),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn empty_request() -> UpdateWorkoutLogRequest {
        UpdateWorkoutLogRequest {
            current_exercise_index: None,
            current_set_index: None,
            rest_timer_ends_at: None,
            notes: None,
            status: None,
        }
    }

    #[test]
    fn test_index_move_clears_rest_timer() {
        let log = in_progress_log();
        let request = UpdateWorkoutLogRequest {
            current_exercise_index: Some(2),
            current_set_index: Some(0),
            ..empty_request()
        };

        let patch = resolve_session_patch(&log, &request, Utc::now());
        assert_eq!(patch.current_exercise_index, 2);
        assert_eq!(patch.current_set_index, 0);
        assert!(patch.rest_timer_ends_at.is_none());
        assert!(patch.completed_at.is_none());
    }

    #[test]
    fn test_index_move_with_new_deadline_keeps_it() {
        let log = in_progress_log();
        let deadline = Utc::now() + Duration::seconds(120);
        let request = UpdateWorkoutLogRequest {
            current_set_index: Some(3),
            rest_timer_ends_at: Some(deadline),
            ..empty_request()
        };

        let patch = resolve_session_patch(&log, &request, Utc::now());
        assert_eq!(patch.rest_timer_ends_at, Some(deadline));
    }

    #[test]
    fn test_unrelated_update_keeps_rest_timer() {
        let log = in_progress_log();
        let request = empty_request();

        let patch = resolve_session_patch(&log, &request, Utc::now());
        assert_eq!(patch.rest_timer_ends_at, log.rest_timer_ends_at);
        assert_eq!(patch.status, WorkoutLogStatus::InProgress);
    }

    #[test]
    fn test_completion_stamps_and_clears() {
        let log = in_progress_log();
        let now = Utc::now();
        let request = UpdateWorkoutLogRequest {
            status: Some(WorkoutLogStatus::Completed),
            ..empty_request()
        };

        let patch = resolve_session_patch(&log, &request, now);
        assert_eq!(patch.status, WorkoutLogStatus::Completed);
        assert_eq!(patch.completed_at, Some(now));
        assert!(patch.rest_timer_ends_at.is_none());
    }

    #[test]
    fn test_abandon_stamps_completed_at() {
        let log = in_progress_log();
        let now = Utc::now();
        let request = UpdateWorkoutLogRequest {
            status: Some(WorkoutLogStatus::Abandoned),
            ..empty_request()
        };

        let patch = resolve_session_patch(&log, &request, now);
        assert_eq!(patch.status, WorkoutLogStatus::Abandoned);
        assert_eq!(patch.completed_at, Some(now));
    }
}
