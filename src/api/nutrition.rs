use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::post,
    Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use super::ApiError;
use crate::auth::{jwt_auth_middleware, AuthService};
use crate::services::{NutritionEstimate, NutritionEstimationService};

#[derive(Clone)]
pub struct NutritionAppState {
    pub estimation_service: NutritionEstimationService,
}

pub fn nutrition_routes(
    estimation_service: NutritionEstimationService,
    auth_service: AuthService,
) -> Router {
    let shared_state = NutritionAppState { estimation_service };

    Router::new()
        .route("/estimate", post(estimate_nutrition))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(shared_state)
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub description: String,
}

/// Estimate the macros of a described meal with the configured AI model.
/// Upstream failures are surfaced as 502; there is no retry.
pub async fn estimate_nutrition(
    State(state): State<NutritionAppState>,
    WithRejection(Json(request), _): WithRejection<Json<EstimateRequest>, ApiError>,
) -> Result<Json<NutritionEstimate>, (StatusCode, Json<ApiError>)> {
    if request.description.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "VALIDATION_ERROR",
                "Description must not be empty",
            )),
        ));
    }

    if !state.estimation_service.is_configured() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(
                "SERVICE_UNAVAILABLE",
                "Nutrition estimation is not configured",
            )),
        ));
    }

    match state.estimation_service.estimate(&request.description).await {
        Ok(estimate) => Ok(Json(estimate)),
        Err(e) => {
            tracing::error!("Nutrition estimation failed: {:#}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ApiError::new(
                    "ESTIMATION_FAILED",
                    "Could not estimate nutrition for the description",
                )),
            ))
        }
    }
}
