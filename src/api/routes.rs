use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use super::achievements::achievement_routes;
use super::auth::{admin_routes, auth_routes};
use super::exercises::exercise_routes;
use super::foods::food_routes;
use super::health::health_check;
use super::nutrition::nutrition_routes;
use super::nutrition_logs::nutrition_log_routes;
use super::profile::profile_routes;
use super::workout_logs::workout_log_routes;
use super::workouts::workout_routes;
use crate::auth::{cors_layer, security_headers_layer, AuthService};
use crate::config::AppConfig;
use crate::services::NutritionEstimationService;

pub fn create_routes(db: PgPool, config: &AppConfig) -> Result<Router> {
    let auth_service = AuthService::new(db.clone(), &config.jwt_secret);
    let estimation_service = NutritionEstimationService::new(config)?;

    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes(auth_service.clone()))
        .nest("/api/admin", admin_routes(auth_service.clone()))
        .nest(
            "/api/profile",
            profile_routes(db.clone(), auth_service.clone()),
        )
        .nest(
            "/api/exercises",
            exercise_routes(db.clone(), auth_service.clone()),
        )
        .nest(
            "/api/workouts",
            workout_routes(db.clone(), auth_service.clone()),
        )
        .nest(
            "/api/workout-logs",
            workout_log_routes(db.clone(), auth_service.clone()),
        )
        .nest("/api/foods", food_routes(db.clone(), auth_service.clone()))
        .nest(
            "/api/nutrition-logs",
            nutrition_log_routes(db.clone(), auth_service.clone()),
        )
        .nest(
            "/api/nutrition",
            nutrition_routes(estimation_service, auth_service.clone()),
        )
        .nest("/api/achievements", achievement_routes(db, auth_service))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(security_headers_layer());

    Ok(router)
}
