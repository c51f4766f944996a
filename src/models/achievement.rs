use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "achievement_metric", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AchievementMetric {
    WorkoutsCompleted,
    TotalVolumeKg,
    CurrentStreakDays,
    LongestStreakDays,
    ConsistentWeeks,
    NutritionDaysLogged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "achievement_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AchievementTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Achievement definition, seeded by migration
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Achievement {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    pub metric: AchievementMetric,
    pub tier: AchievementTier,
    pub target: f64,
}

/// Per-user progress row
#[derive(Debug, Clone, FromRow)]
pub struct UserAchievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub progress: f64,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Definition joined with the caller's progress; users with no computed
/// progress yet see zeros.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AchievementWithProgress {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    pub metric: AchievementMetric,
    pub tier: AchievementTier,
    pub target: f64,
    pub progress: f64,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}
