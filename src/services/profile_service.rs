use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ActivityLevel, EnergyTargets, Gender, NutritionGoal, Profile, UpdateProfileRequest};

/// Energy targets never drop below this floor, however aggressive the
/// deficit would otherwise be.
const MIN_DAILY_KCAL: f64 = 1000.0;

#[derive(Clone)]
pub struct ProfileService {
    db: PgPool,
}

impl ProfileService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, display_name, gender, birth_date, weight_kg, height_cm,
                    activity_level, goal, created_at, updated_at
             FROM profiles
             WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(profile)
    }

    /// Create or partially update the user's profile
    pub async fn upsert_profile(&self, user_id: Uuid, request: UpdateProfileRequest) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (
                id, user_id, display_name, gender, birth_date, weight_kg, height_cm,
                activity_level, goal, created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7,
                     COALESCE($8, 'sedentary'), COALESCE($9, 'maintain'), NOW(), NOW())
             ON CONFLICT (user_id) DO UPDATE SET
                display_name = COALESCE($3, profiles.display_name),
                gender = COALESCE($4, profiles.gender),
                birth_date = COALESCE($5, profiles.birth_date),
                weight_kg = COALESCE($6, profiles.weight_kg),
                height_cm = COALESCE($7, profiles.height_cm),
                activity_level = COALESCE($8, profiles.activity_level),
                goal = COALESCE($9, profiles.goal),
                updated_at = NOW()
             RETURNING id, user_id, display_name, gender, birth_date, weight_kg, height_cm,
                       activity_level, goal, created_at, updated_at"
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&request.display_name)
        .bind(&request.gender)
        .bind(request.birth_date)
        .bind(request.weight_kg)
        .bind(request.height_cm)
        .bind(&request.activity_level)
        .bind(&request.goal)
        .fetch_one(&self.db)
        .await?;

        Ok(profile)
    }

    /// Derive energy targets for a profile; None until the profile has
    /// weight, height, birth date and gender.
    pub fn energy_targets(&self, profile: &Profile) -> Option<EnergyTargets> {
        calculate_energy_targets(profile, Utc::now().date_naive())
    }
}

/// Mifflin-St Jeor basal metabolic rate, kcal/day
pub fn calculate_bmr(gender: &Gender, weight_kg: f64, height_cm: f64, age_years: f64) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years;
    let bmr = match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    };

    bmr.max(MIN_DAILY_KCAL)
}

pub fn activity_factor(activity_level: &ActivityLevel) -> f64 {
    match activity_level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::LightlyActive => 1.375,
        ActivityLevel::ModeratelyActive => 1.55,
        ActivityLevel::VeryActive => 1.725,
        ActivityLevel::ExtraActive => 1.9,
    }
}

/// Daily calorie adjustment applied on top of TDEE
pub fn goal_calorie_adjustment(goal: &NutritionGoal) -> f64 {
    match goal {
        NutritionGoal::LoseWeight => -500.0,
        NutritionGoal::Maintain => 0.0,
        NutritionGoal::GainMuscle => 300.0,
    }
}

/// Protein target in grams per kilogram of body weight
pub fn goal_protein_per_kg(goal: &NutritionGoal) -> f64 {
    match goal {
        NutritionGoal::LoseWeight => 2.0,
        NutritionGoal::Maintain => 1.6,
        NutritionGoal::GainMuscle => 1.8,
    }
}

pub fn age_years(birth_date: NaiveDate, today: NaiveDate) -> f64 {
    (today - birth_date).num_days() as f64 / 365.25
}

pub fn calculate_energy_targets(profile: &Profile, today: NaiveDate) -> Option<EnergyTargets> {
    let gender = profile.gender.as_ref()?;
    let weight_kg = profile.weight_kg?;
    let height_cm = profile.height_cm?;
    let birth_date = profile.birth_date?;

    let age = age_years(birth_date, today);
    let bmr = calculate_bmr(gender, weight_kg, height_cm, age);
    let tdee = bmr * activity_factor(&profile.activity_level);
    let calorie_target = (tdee + goal_calorie_adjustment(&profile.goal)).max(MIN_DAILY_KCAL);

    let protein_g = goal_protein_per_kg(&profile.goal) * weight_kg;
    // 25% of calories from fat, carbs fill the rest
    let fat_g = calorie_target * 0.25 / 9.0;
    let carbs_g = ((calorie_target - protein_g * 4.0 - fat_g * 9.0) / 4.0).max(0.0);

    Some(EnergyTargets {
        bmr_kcal: bmr,
        tdee_kcal: tdee,
        calorie_target_kcal: calorie_target,
        protein_g,
        carbs_g,
        fat_g,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            display_name: Some("Test".to_string()),
            gender: Some(Gender::Male),
            birth_date: NaiveDate::from_ymd_opt(1990, 6, 15),
            weight_kg: Some(80.0),
            height_cm: Some(180.0),
            activity_level: ActivityLevel::ModeratelyActive,
            goal: NutritionGoal::Maintain,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bmr_mifflin_st_jeor() {
        // 10*80 + 6.25*180 - 5*30 + 5 = 1780
        let bmr = calculate_bmr(&Gender::Male, 80.0, 180.0, 30.0);
        assert_eq!(bmr, 1780.0);

        // 10*60 + 6.25*165 - 5*28 - 161 = 1330.25
        let bmr = calculate_bmr(&Gender::Female, 60.0, 165.0, 28.0);
        assert_eq!(bmr, 1330.25);
    }

    #[test]
    fn test_bmr_floor() {
        let bmr = calculate_bmr(&Gender::Female, 35.0, 140.0, 80.0);
        assert_eq!(bmr, MIN_DAILY_KCAL);
    }

    #[test]
    fn test_tdee_uses_activity_factor() {
        let bmr = calculate_bmr(&Gender::Male, 80.0, 180.0, 30.0);
        assert_eq!(bmr * activity_factor(&ActivityLevel::Sedentary), 2136.0);
        assert_eq!(bmr * activity_factor(&ActivityLevel::ExtraActive), 3382.0);
    }

    #[test]
    fn test_energy_targets_complete_profile() {
        let profile = test_profile();
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        let targets = calculate_energy_targets(&profile, today).unwrap();

        // Age 35: BMR = 10*80 + 6.25*180 - 5*35 + 5 = 1755
        assert_eq!(targets.bmr_kcal, 1755.0);
        assert_eq!(targets.tdee_kcal, 1755.0 * 1.55);
        assert_eq!(targets.calorie_target_kcal, targets.tdee_kcal);
        assert_eq!(targets.protein_g, 1.6 * 80.0);

        // Macro calories add back up to the target
        let macro_kcal = targets.protein_g * 4.0 + targets.carbs_g * 4.0 + targets.fat_g * 9.0;
        assert!((macro_kcal - targets.calorie_target_kcal).abs() < 1.0);
    }

    #[test]
    fn test_energy_targets_goal_adjustments() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        let mut profile = test_profile();
        profile.goal = NutritionGoal::LoseWeight;
        let cut = calculate_energy_targets(&profile, today).unwrap();

        profile.goal = NutritionGoal::GainMuscle;
        let bulk = calculate_energy_targets(&profile, today).unwrap();

        assert_eq!(bulk.calorie_target_kcal - cut.calorie_target_kcal, 800.0);
        assert_eq!(cut.protein_g, 2.0 * 80.0);
        assert_eq!(bulk.protein_g, 1.8 * 80.0);
    }

    #[test]
    fn test_energy_targets_incomplete_profile() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        let mut profile = test_profile();
        profile.weight_kg = None;
        assert!(calculate_energy_targets(&profile, today).is_none());

        let mut profile = test_profile();
        profile.gender = None;
        assert!(calculate_energy_targets(&profile, today).is_none());

        let mut profile = test_profile();
        profile.birth_date = None;
        assert!(calculate_energy_targets(&profile, today).is_none());
    }

    #[test]
    fn test_age_years() {
        let birth = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let age = age_years(birth, today);
        assert!((age - 35.0).abs() < 0.05);
    }
}
