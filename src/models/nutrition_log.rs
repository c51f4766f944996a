use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::EnergyTargets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "meal_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

/// One logged food entry. Macros are denormalized totals for the entry so
/// history survives catalog edits and deletions.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NutritionLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Option<Uuid>,
    pub food_name: String,
    pub log_date: NaiveDate,
    pub meal_type: MealType,
    pub quantity: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub created_at: DateTime<Utc>,
}

/// Either references a catalog food (`food_id` + `quantity`) or provides the
/// entry inline (`food_name` + macros), e.g. from an AI estimate.
#[derive(Debug, Deserialize)]
pub struct CreateNutritionLogRequest {
    pub food_id: Option<Uuid>,
    pub food_name: Option<String>,
    pub meal_type: MealType,
    pub log_date: Option<NaiveDate>,
    pub quantity: Option<f64>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Serialize)]
pub struct MealBreakdown {
    pub meal_type: MealType,
    pub totals: MacroTotals,
    pub entry_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DailyNutritionSummary {
    pub date: NaiveDate,
    pub totals: MacroTotals,
    pub meals: Vec<MealBreakdown>,
    /// Targets from the profile, when one with complete data exists
    pub targets: Option<EnergyTargets>,
    pub remaining_kcal: Option<f64>,
}
