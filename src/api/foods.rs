use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{internal_error, ApiError, PageQuery, PagedResponse};
use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::models::{CreateFoodRequest, Food};
use crate::services::FoodService;

#[derive(Clone)]
pub struct FoodsAppState {
    pub food_service: FoodService,
}

pub fn food_routes(db: PgPool, auth_service: AuthService) -> Router {
    let shared_state = FoodsAppState {
        food_service: FoodService::new(db),
    };

    Router::new()
        .route("/", post(create_food))
        .route("/search", get(search_foods))
        .route("/:id", get(get_food))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(shared_state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSearchQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Substring search over the catalog plus the caller's custom foods.
/// An empty query browses the whole catalog.
pub async fn search_foods(
    State(state): State<FoodsAppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<FoodSearchQuery>,
) -> Result<Json<PagedResponse<Food>>, (StatusCode, Json<ApiError>)> {
    let page = PageQuery {
        page: query.page,
        page_size: query.page_size,
    };
    if let Err(message) = page.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("INVALID_PAGINATION", message)),
        ));
    }

    let search_term = query.q.unwrap_or_default();
    let (foods, total) = state
        .food_service
        .search_foods(
            session.user_id,
            &search_term,
            page.get_limit(),
            page.get_offset(),
        )
        .await
        .map_err(internal_error)?;

    Ok(Json(PagedResponse::new(foods, &page, total)))
}

pub async fn get_food(
    State(state): State<FoodsAppState>,
    Extension(session): Extension<UserSession>,
    Path(food_id): Path<Uuid>,
) -> Result<Json<Food>, (StatusCode, Json<ApiError>)> {
    let food = state
        .food_service
        .get_food(food_id, session.user_id)
        .await
        .map_err(internal_error)?;

    match food {
        Some(food) => Ok(Json(food)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("FOOD_NOT_FOUND", "Food not found")),
        )),
    }
}

/// Add a custom food owned by the caller
pub async fn create_food(
    State(state): State<FoodsAppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): WithRejection<Json<CreateFoodRequest>, ApiError>,
) -> Result<(StatusCode, Json<Food>), (StatusCode, Json<ApiError>)> {
    if let Err(message) = validate_food(&request) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("VALIDATION_ERROR", message)),
        ));
    }

    let food = state
        .food_service
        .create_food(session.user_id, request)
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(food)))
}

fn validate_food(request: &CreateFoodRequest) -> Result<(), &'static str> {
    if request.name.trim().is_empty() {
        return Err("Food name must not be empty");
    }
    if request.serving_unit.trim().is_empty() {
        return Err("Serving unit must not be empty");
    }
    if request.serving_size <= 0.0 {
        return Err("Serving size must be positive");
    }
    if request.calories < 0.0
        || request.protein_g < 0.0
        || request.carbs_g < 0.0
        || request.fat_g < 0.0
    {
        return Err("Nutrition values must not be negative");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oatmeal() -> CreateFoodRequest {
        CreateFoodRequest {
            name: "Oatmeal".to_string(),
            brand: None,
            serving_size: 40.0,
            serving_unit: "g".to_string(),
            calories: 150.0,
            protein_g: 5.0,
            carbs_g: 27.0,
            fat_g: 2.5,
        }
    }

    #[test]
    fn test_validate_accepts_complete_food() {
        assert!(validate_food(&oatmeal()).is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut food = oatmeal();
        food.name = "  ".to_string();
        assert!(validate_food(&food).is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_serving() {
        let mut food = oatmeal();
        food.serving_size = 0.0;
        assert!(validate_food(&food).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_macros() {
        let mut food = oatmeal();
        food.fat_g = -1.0;
        assert!(validate_food(&food).is_err());
    }
}
