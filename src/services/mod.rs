// Business logic services

pub mod profile_service;
pub mod exercise_service;
pub mod workout_service;
pub mod workout_log_service;
pub mod food_service;
pub mod nutrition_log_service;
pub mod nutrition_estimation_service;
pub mod achievement_service;
pub mod achievement_scheduler;

pub use profile_service::ProfileService;
pub use exercise_service::ExerciseService;
pub use workout_service::WorkoutService;
pub use workout_log_service::WorkoutLogService;
pub use food_service::FoodService;
pub use nutrition_log_service::{ManualEntry, NutritionLogService};
pub use nutrition_estimation_service::{NutritionEstimate, NutritionEstimationService};
pub use achievement_service::AchievementService;
pub use achievement_scheduler::AchievementScheduler;
