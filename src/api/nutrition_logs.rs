use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get},
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{internal_error, ApiError};
use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::models::{CreateNutritionLogRequest, DailyNutritionSummary, NutritionLog};
use crate::services::{AchievementService, ManualEntry, NutritionLogService, ProfileService};

#[derive(Clone)]
pub struct NutritionLogsAppState {
    pub nutrition_log_service: NutritionLogService,
    pub profile_service: ProfileService,
    pub achievement_service: AchievementService,
}

pub fn nutrition_log_routes(db: PgPool, auth_service: AuthService) -> Router {
    let shared_state = NutritionLogsAppState {
        nutrition_log_service: NutritionLogService::new(db.clone()),
        profile_service: ProfileService::new(db.clone()),
        achievement_service: AchievementService::new(db),
    };

    Router::new()
        .route("/", get(list_nutrition_logs).post(create_nutrition_log))
        .route("/summary", get(daily_summary))
        .route("/:id", delete(delete_nutrition_log))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(shared_state)
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

/// Either a catalog reference or a free-form entry, never both
enum EntryShape {
    Catalog {
        food_id: Uuid,
        quantity: f64,
    },
    Manual {
        food_name: String,
        quantity: f64,
        calories: f64,
        protein_g: f64,
        carbs_g: f64,
        fat_g: f64,
    },
}

/// Log a food entry for a day. Catalog entries scale the food's macros by
/// quantity; free-form entries carry their own macros.
pub async fn create_nutrition_log(
    State(state): State<NutritionLogsAppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): WithRejection<Json<CreateNutritionLogRequest>, ApiError>,
) -> Result<(StatusCode, Json<NutritionLog>), (StatusCode, Json<ApiError>)> {
    let shape = match resolve_entry_shape(&request) {
        Ok(shape) => shape,
        Err(message) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ApiError::new("VALIDATION_ERROR", message)),
            ))
        }
    };

    let log_date = request.log_date.unwrap_or_else(|| Utc::now().date_naive());

    let entry = match shape {
        EntryShape::Catalog { food_id, quantity } => {
            let logged = state
                .nutrition_log_service
                .log_food(session.user_id, food_id, quantity, request.meal_type, log_date)
                .await
                .map_err(internal_error)?;

            match logged {
                Some(logged) => logged,
                None => {
                    return Err((
                        StatusCode::NOT_FOUND,
                        Json(ApiError::new("FOOD_NOT_FOUND", "Food not found")),
                    ))
                }
            }
        }
        EntryShape::Manual {
            food_name,
            quantity,
            calories,
            protein_g,
            carbs_g,
            fat_g,
        } => {
            state
                .nutrition_log_service
                .log_manual(
                    session.user_id,
                    ManualEntry {
                        food_name,
                        meal_type: request.meal_type,
                        log_date,
                        quantity,
                        calories,
                        protein_g,
                        carbs_g,
                        fat_g,
                    },
                )
                .await
                .map_err(internal_error)?
        }
    };

    // Nutrition history feeds the achievement metrics; failures here must
    // never fail the logging itself
    if let Err(e) = state
        .achievement_service
        .recalculate_for_user(session.user_id)
        .await
    {
        tracing::warn!(
            "Achievement recalculation failed for user {}: {:#}",
            session.user_id,
            e
        );
    }

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Entries for one day, ordered by meal type then logging time
pub async fn list_nutrition_logs(
    State(state): State<NutritionLogsAppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<NutritionLog>>, (StatusCode, Json<ApiError>)> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let entries = state
        .nutrition_log_service
        .list_entries(session.user_id, date)
        .await
        .map_err(internal_error)?;

    Ok(Json(entries))
}

pub async fn delete_nutrition_log(
    State(state): State<NutritionLogsAppState>,
    Extension(session): Extension<UserSession>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ApiError>)> {
    let deleted = state
        .nutrition_log_service
        .delete_entry(entry_id, session.user_id)
        .await
        .map_err(internal_error)?;

    if !deleted {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("ENTRY_NOT_FOUND", "Nutrition entry not found")),
        ));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Nutrition entry deleted successfully"
    })))
}

/// Daily totals, per-meal breakdown and the remaining calorie budget when
/// the profile is complete enough to compute targets
pub async fn daily_summary(
    State(state): State<NutritionLogsAppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DailyNutritionSummary>, (StatusCode, Json<ApiError>)> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let profile = state
        .profile_service
        .get_profile(session.user_id)
        .await
        .map_err(internal_error)?;
    let targets = profile
        .as_ref()
        .and_then(|profile| state.profile_service.energy_targets(profile));

    let summary = state
        .nutrition_log_service
        .daily_summary(session.user_id, date, targets)
        .await
        .map_err(internal_error)?;

    Ok(Json(summary))
}

fn resolve_entry_shape(request: &CreateNutritionLogRequest) -> Result<EntryShape, &'static str> {
    let has_manual_macros = request.calories.is_some()
        || request.protein_g.is_some()
        || request.carbs_g.is_some()
        || request.fat_g.is_some();

    match (request.food_id, &request.food_name) {
        (Some(_), Some(_)) => Err("Provide either a food id or a free-form entry, not both"),
        (None, None) => Err("Provide either a food id or a free-form entry"),
        (Some(food_id), None) => {
            if has_manual_macros {
                return Err("Macro fields are not allowed when logging a catalog food");
            }
            let quantity = match request.quantity {
                Some(quantity) => quantity,
                None => return Err("Quantity is required when logging a catalog food"),
            };
            if quantity <= 0.0 {
                return Err("Quantity must be positive");
            }
            Ok(EntryShape::Catalog { food_id, quantity })
        }
        (None, Some(food_name)) => {
            if food_name.trim().is_empty() {
                return Err("Food name must not be empty");
            }
            let quantity = request.quantity.unwrap_or(1.0);
            if quantity <= 0.0 {
                return Err("Quantity must be positive");
            }
            let (calories, protein_g, carbs_g, fat_g) = match (
                request.calories,
                request.protein_g,
                request.carbs_g,
                request.fat_g,
            ) {
                (Some(calories), Some(protein_g), Some(carbs_g), Some(fat_g)) => {
                    (calories, protein_g, carbs_g, fat_g)
                }
                _ => return Err("A free-form entry needs calories, protein, carbs and fat"),
            };
            if calories < 0.0 || protein_g < 0.0 || carbs_g < 0.0 || fat_g < 0.0 {
                return Err("Nutrition values must not be negative");
            }
            Ok(EntryShape::Manual {
                food_name: food_name.trim().to_string(),
                quantity,
                calories,
                protein_g,
                carbs_g,
                fat_g,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;

    fn base_request() -> CreateNutritionLogRequest {
        CreateNutritionLogRequest {
            food_id: None,
            food_name: None,
            meal_type: MealType::Lunch,
            log_date: None,
            quantity: None,
            calories: None,
            protein_g: None,
            carbs_g: None,
            fat_g: None,
        }
    }

    #[test]
    fn test_catalog_shape_requires_positive_quantity() {
        let request = CreateNutritionLogRequest {
            food_id: Some(Uuid::new_v4()),
            quantity: Some(1.5),
            ..base_request()
        };
        assert!(matches!(
            resolve_entry_shape(&request),
            Ok(EntryShape::Catalog { quantity, .. }) if quantity == 1.5
        ));

        let request = CreateNutritionLogRequest {
            food_id: Some(Uuid::new_v4()),
            quantity: Some(0.0),
            ..base_request()
        };
        assert!(resolve_entry_shape(&request).is_err());

        let request = CreateNutritionLogRequest {
            food_id: Some(Uuid::new_v4()),
            ..base_request()
        };
        assert!(resolve_entry_shape(&request).is_err());
    }

    #[test]
    fn test_manual_shape_requires_all_macros() {
        let request = CreateNutritionLogRequest {
            food_name: Some("Grilled chicken salad".to_string()),
            calories: Some(420.0),
            protein_g: Some(35.0),
            carbs_g: Some(18.0),
            fat_g: Some(22.0),
            ..base_request()
        };
        let shape = resolve_entry_shape(&request).unwrap();
        assert!(matches!(shape, EntryShape::Manual { quantity, .. } if quantity == 1.0));

        let request = CreateNutritionLogRequest {
            food_name: Some("Grilled chicken salad".to_string()),
            calories: Some(420.0),
            ..base_request()
        };
        assert!(resolve_entry_shape(&request).is_err());
    }

    #[test]
    fn test_rejects_both_and_neither_shape() {
        assert!(resolve_entry_shape(&base_request()).is_err());

        let request = CreateNutritionLogRequest {
            food_id: Some(Uuid::new_v4()),
            food_name: Some("Oatmeal".to_string()),
            ..base_request()
        };
        assert!(resolve_entry_shape(&request).is_err());
    }

    #[test]
    fn test_rejects_catalog_entry_with_macro_overrides() {
        let request = CreateNutritionLogRequest {
            food_id: Some(Uuid::new_v4()),
            quantity: Some(1.0),
            calories: Some(100.0),
            ..base_request()
        };
        assert!(resolve_entry_shape(&request).is_err());
    }

    #[test]
    fn test_rejects_negative_macros() {
        let request = CreateNutritionLogRequest {
            food_name: Some("Oatmeal".to_string()),
            calories: Some(150.0),
            protein_g: Some(-5.0),
            carbs_g: Some(27.0),
            fat_g: Some(2.5),
            ..base_request()
        };
        assert!(resolve_entry_shape(&request).is_err());
    }
}
