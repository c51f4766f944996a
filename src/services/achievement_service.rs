use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::models::{Achievement, AchievementMetric, AchievementWithProgress, UserAchievement};

/// Weekly session count that makes a week "consistent"
const MIN_SESSIONS_PER_WEEK: i64 = 3;

/// Raw history inputs for metric computation
struct UserStats {
    workouts_completed: i64,
    total_volume_kg: f64,
    /// Completion date of every completed session, duplicates preserved
    workout_days: Vec<NaiveDate>,
    nutrition_days_logged: i64,
}

/// Progress is always recomputed from history, never incremented in place,
/// so a recalculation can run any number of times. Once unlocked, an
/// achievement stays unlocked even if the underlying metric later drops.
#[derive(Clone)]
pub struct AchievementService {
    db: PgPool,
}

impl AchievementService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All definitions joined with the user's progress, zeros where the user
    /// has no row yet
    pub async fn get_achievements_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AchievementWithProgress>> {
        let achievements = sqlx::query_as::<_, AchievementWithProgress>(
            "SELECT a.id, a.code, a.name, a.description, a.metric, a.tier, a.target,
                    COALESCE(ua.progress, 0) AS progress,
                    COALESCE(ua.unlocked, FALSE) AS unlocked,
                    ua.unlocked_at
             FROM achievements a
             LEFT JOIN user_achievements ua
               ON ua.achievement_id = a.id AND ua.user_id = $1
             ORDER BY a.metric, a.target"
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(achievements)
    }

    /// Recompute every metric for the user and upsert progress rows.
    /// Returns the achievements that this pass unlocked for the first time.
    pub async fn recalculate_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AchievementWithProgress>> {
        let stats = self.collect_user_stats(user_id).await?;
        let today = Utc::now().date_naive();

        let definitions = sqlx::query_as::<_, Achievement>(
            "SELECT id, code, name, description, metric, tier, target
             FROM achievements
             ORDER BY metric, target"
        )
        .fetch_all(&self.db)
        .await?;

        let previously_unlocked: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
            "SELECT achievement_id FROM user_achievements
             WHERE user_id = $1 AND unlocked = TRUE"
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .collect();

        let mut newly_unlocked = Vec::new();

        for definition in definitions {
            let progress = metric_progress(&definition.metric, &stats, today);
            let unlocked = progress >= definition.target;

            let row = sqlx::query_as::<_, UserAchievement>(
                "INSERT INTO user_achievements
                    (id, user_id, achievement_id, progress, unlocked, unlocked_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN NOW() END, NOW())
                 ON CONFLICT (user_id, achievement_id) DO UPDATE SET
                    progress = EXCLUDED.progress,
                    unlocked = user_achievements.unlocked OR EXCLUDED.unlocked,
                    unlocked_at = COALESCE(user_achievements.unlocked_at, EXCLUDED.unlocked_at),
                    updated_at = NOW()
                 RETURNING id, user_id, achievement_id, progress, unlocked, unlocked_at, updated_at"
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(definition.id)
            .bind(progress)
            .bind(unlocked)
            .fetch_one(&self.db)
            .await?;

            if row.unlocked && !previously_unlocked.contains(&definition.id) {
                newly_unlocked.push(AchievementWithProgress {
                    id: definition.id,
                    code: definition.code,
                    name: definition.name,
                    description: definition.description,
                    metric: definition.metric,
                    tier: definition.tier,
                    target: definition.target,
                    progress: row.progress,
                    unlocked: row.unlocked,
                    unlocked_at: row.unlocked_at,
                });
            }
        }

        Ok(newly_unlocked)
    }

    /// Batch pass over every user; per-user failures are logged and skipped
    /// so one bad account cannot stall the sweep.
    pub async fn recalculate_all(&self) -> Result<usize> {
        let user_ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users")
            .fetch_all(&self.db)
            .await?;

        let results = futures::future::join_all(
            user_ids.iter().map(|user_id| self.recalculate_for_user(*user_id)),
        )
        .await;

        let mut recalculated = 0;
        for (user_id, result) in user_ids.iter().zip(results) {
            match result {
                Ok(_) => recalculated += 1,
                Err(e) => {
                    error!("Achievement recalculation failed for user {}: {}", user_id, e);
                }
            }
        }

        Ok(recalculated)
    }

    async fn collect_user_stats(&self, user_id: Uuid) -> Result<UserStats> {
        let workouts_completed = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM workout_logs
             WHERE user_id = $1 AND status = 'completed'"
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        let total_volume_kg = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(s.reps * s.weight_kg), 0)
             FROM set_logs s
             JOIN exercise_logs e ON e.id = s.exercise_log_id
             JOIN workout_logs w ON w.id = e.workout_log_id
             WHERE w.user_id = $1 AND w.status = 'completed' AND s.weight_kg IS NOT NULL"
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        let workout_days = sqlx::query_scalar::<_, NaiveDate>(
            "SELECT (completed_at AT TIME ZONE 'UTC')::date
             FROM workout_logs
             WHERE user_id = $1 AND status = 'completed' AND completed_at IS NOT NULL
             ORDER BY 1"
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let nutrition_days_logged = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT log_date) FROM nutrition_logs WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(UserStats {
            workouts_completed,
            total_volume_kg,
            workout_days,
            nutrition_days_logged,
        })
    }
}

fn metric_progress(metric: &AchievementMetric, stats: &UserStats, today: NaiveDate) -> f64 {
    match metric {
        AchievementMetric::WorkoutsCompleted => stats.workouts_completed as f64,
        AchievementMetric::TotalVolumeKg => stats.total_volume_kg,
        AchievementMetric::CurrentStreakDays => {
            current_streak_days(&stats.workout_days, today) as f64
        }
        AchievementMetric::LongestStreakDays => longest_streak_days(&stats.workout_days) as f64,
        AchievementMetric::ConsistentWeeks => consistent_weeks(&stats.workout_days, today) as f64,
        AchievementMetric::NutritionDaysLogged => stats.nutrition_days_logged as f64,
    }
}

/// Consecutive workout days ending today or yesterday; a streak whose last
/// day is older has already been broken.
pub fn current_streak_days(workout_days: &[NaiveDate], today: NaiveDate) -> i64 {
    let mut days = workout_days.to_vec();
    days.sort();
    days.dedup();

    let last = match days.last() {
        Some(&day) => day,
        None => return 0,
    };
    if (today - last).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    let mut cursor = last;
    for &day in days.iter().rev().skip(1) {
        if (cursor - day).num_days() == 1 {
            streak += 1;
            cursor = day;
        } else {
            break;
        }
    }

    streak
}

pub fn longest_streak_days(workout_days: &[NaiveDate]) -> i64 {
    let mut days = workout_days.to_vec();
    days.sort();
    days.dedup();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &day in &days {
        run = match previous {
            Some(p) if (day - p).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }

    longest
}

fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// Consecutive ISO weeks with at least MIN_SESSIONS_PER_WEEK completed
/// sessions. The run may end at the current week (still in progress) or the
/// previous one; an older run no longer counts.
pub fn consistent_weeks(workout_days: &[NaiveDate], today: NaiveDate) -> i64 {
    let mut sessions_per_week: HashMap<NaiveDate, i64> = HashMap::new();
    for &day in workout_days {
        *sessions_per_week.entry(week_start(day)).or_insert(0) += 1;
    }
    let qualifies =
        |week: NaiveDate| sessions_per_week.get(&week).copied().unwrap_or(0) >= MIN_SESSIONS_PER_WEEK;

    let this_week = week_start(today);
    let last_week = this_week - Duration::days(7);

    let mut cursor = if qualifies(this_week) {
        this_week
    } else if qualifies(last_week) {
        last_week
    } else {
        return 0;
    };

    let mut weeks = 1;
    while qualifies(cursor - Duration::days(7)) {
        cursor -= Duration::days(7);
        weeks += 1;
    }

    weeks
}
