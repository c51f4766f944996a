use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    DailyNutritionSummary, EnergyTargets, MacroTotals, MealBreakdown, MealType, NutritionLog,
};

/// Free-form entry with caller-supplied macros, e.g. from an AI estimate
#[derive(Debug)]
pub struct ManualEntry {
    pub food_name: String,
    pub meal_type: MealType,
    pub log_date: NaiveDate,
    pub quantity: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Clone)]
pub struct NutritionLogService {
    db: PgPool,
}

impl NutritionLogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Log a catalog food. Entry macros are the food's per-serving macros
    /// scaled by quantity and stored denormalized. Returns None when the food
    /// is not visible to the user.
    pub async fn log_food(
        &self,
        user_id: Uuid,
        food_id: Uuid,
        quantity: f64,
        meal_type: MealType,
        log_date: NaiveDate,
    ) -> Result<Option<NutritionLog>> {
        let food = sqlx::query_as::<_, (String, f64, f64, f64, f64)>(
            "SELECT name, calories, protein_g, carbs_g, fat_g
             FROM foods
             WHERE id = $1 AND (created_by IS NULL OR created_by = $2)"
        )
        .bind(food_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        let (name, calories, protein_g, carbs_g, fat_g) = match food {
            Some(food) => food,
            None => return Ok(None),
        };

        let entry = ManualEntry {
            food_name: name,
            meal_type,
            log_date,
            quantity,
            calories: calories * quantity,
            protein_g: protein_g * quantity,
            carbs_g: carbs_g * quantity,
            fat_g: fat_g * quantity,
        };
        let log = self.insert_entry(user_id, Some(food_id), entry).await?;

        Ok(Some(log))
    }

    pub async fn log_manual(&self, user_id: Uuid, entry: ManualEntry) -> Result<NutritionLog> {
        self.insert_entry(user_id, None, entry).await
    }

    pub async fn list_entries(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<NutritionLog>> {
        let entries = sqlx::query_as::<_, NutritionLog>(
            "SELECT id, user_id, food_id, food_name, log_date, meal_type, quantity,
                    calories, protein_g, carbs_g, fat_g, created_at
             FROM nutrition_logs
             WHERE user_id = $1 AND log_date = $2
             ORDER BY meal_type, created_at"
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    pub async fn delete_entry(&self, entry_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM nutrition_logs WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn daily_summary(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        targets: Option<EnergyTargets>,
    ) -> Result<DailyNutritionSummary> {
        let entries = self.list_entries(user_id, date).await?;
        Ok(build_daily_summary(date, &entries, targets))
    }

    async fn insert_entry(
        &self,
        user_id: Uuid,
        food_id: Option<Uuid>,
        entry: ManualEntry,
    ) -> Result<NutritionLog> {
        let log = sqlx::query_as::<_, NutritionLog>(
            "INSERT INTO nutrition_logs
                (id, user_id, food_id, food_name, log_date, meal_type, quantity,
                 calories, protein_g, carbs_g, fat_g, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
             RETURNING id, user_id, food_id, food_name, log_date, meal_type, quantity,
                       calories, protein_g, carbs_g, fat_g, created_at"
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(food_id)
        .bind(&entry.food_name)
        .bind(entry.log_date)
        .bind(entry.meal_type)
        .bind(entry.quantity)
        .bind(entry.calories)
        .bind(entry.protein_g)
        .bind(entry.carbs_g)
        .bind(entry.fat_g)
        .fetch_one(&self.db)
        .await?;

        Ok(log)
    }
}

const MEAL_ORDER: [MealType; 4] = [
    MealType::Breakfast,
    MealType::Lunch,
    MealType::Dinner,
    MealType::Snack,
];

fn build_daily_summary(
    date: NaiveDate,
    entries: &[NutritionLog],
    targets: Option<EnergyTargets>,
) -> DailyNutritionSummary {
    let mut totals = MacroTotals::default();
    for entry in entries {
        totals.calories += entry.calories;
        totals.protein_g += entry.protein_g;
        totals.carbs_g += entry.carbs_g;
        totals.fat_g += entry.fat_g;
    }

    let meals = MEAL_ORDER
        .iter()
        .filter_map(|meal_type| {
            let mut meal_totals = MacroTotals::default();
            let mut entry_count = 0;
            for entry in entries.iter().filter(|e| e.meal_type == *meal_type) {
                meal_totals.calories += entry.calories;
                meal_totals.protein_g += entry.protein_g;
                meal_totals.carbs_g += entry.carbs_g;
                meal_totals.fat_g += entry.fat_g;
                entry_count += 1;
            }
            if entry_count == 0 {
                return None;
            }
            Some(MealBreakdown {
                meal_type: *meal_type,
                totals: meal_totals,
                entry_count,
            })
        })
        .collect();

    let remaining_kcal = targets
        .as_ref()
        .map(|t| t.calorie_target_kcal - totals.calories);

    DailyNutritionSummary {
        date,
        totals,
        meals,
        targets,
        remaining_kcal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(meal_type: MealType, calories: f64, protein_g: f64) -> NutritionLog {
        NutritionLog {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            food_id: None,
            food_name: "Test Food".to_string(),
            log_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            meal_type,
            quantity: 1.0,
            calories,
            protein_g,
            carbs_g: 0.0,
            fat_g: 0.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_totals_and_meal_order() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let entries = vec![
            entry(MealType::Dinner, 600.0, 40.0),
            entry(MealType::Breakfast, 350.0, 20.0),
            entry(MealType::Breakfast, 150.0, 5.0),
        ];

        let summary = build_daily_summary(date, &entries, None);

        assert_eq!(summary.totals.calories, 1100.0);
        assert_eq!(summary.totals.protein_g, 65.0);
        assert_eq!(summary.meals.len(), 2);
        assert_eq!(summary.meals[0].meal_type, MealType::Breakfast);
        assert_eq!(summary.meals[0].entry_count, 2);
        assert_eq!(summary.meals[0].totals.calories, 500.0);
        assert_eq!(summary.meals[1].meal_type, MealType::Dinner);
        assert!(summary.targets.is_none());
        assert!(summary.remaining_kcal.is_none());
    }

    #[test]
    fn test_summary_remaining_budget() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let entries = vec![entry(MealType::Lunch, 800.0, 50.0)];
        let targets = EnergyTargets {
            bmr_kcal: 1700.0,
            tdee_kcal: 2400.0,
            calorie_target_kcal: 2200.0,
            protein_g: 150.0,
            carbs_g: 220.0,
            fat_g: 61.0,
        };

        let summary = build_daily_summary(date, &entries, Some(targets));

        assert_eq!(summary.remaining_kcal, Some(1400.0));
    }

    #[test]
    fn test_summary_empty_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let summary = build_daily_summary(date, &[], None);

        assert_eq!(summary.totals.calories, 0.0);
        assert!(summary.meals.is_empty());
    }
}
