use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use sqlx::PgPool;

use super::{internal_error, ApiError};
use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::models::{ProfileResponse, UpdateProfileRequest};
use crate::services::{profile_service::age_years, ProfileService};

#[derive(Clone)]
pub struct ProfileAppState {
    pub profile_service: ProfileService,
}

pub fn profile_routes(db: PgPool, auth_service: AuthService) -> Router {
    let shared_state = ProfileAppState {
        profile_service: ProfileService::new(db),
    };

    Router::new()
        .route("/", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(shared_state)
}

/// Get the authenticated user's profile with computed energy targets
pub async fn get_profile(
    State(state): State<ProfileAppState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<ProfileResponse>, (StatusCode, Json<ApiError>)> {
    let profile = state
        .profile_service
        .get_profile(session.user_id)
        .await
        .map_err(internal_error)?;

    let profile = match profile {
        Some(profile) => profile,
        None => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ApiError::new(
                    "PROFILE_NOT_FOUND",
                    "Profile has not been created yet",
                )),
            ))
        }
    };

    let energy = state.profile_service.energy_targets(&profile);

    Ok(Json(ProfileResponse { profile, energy }))
}

/// Create or partially update the profile
pub async fn update_profile(
    State(state): State<ProfileAppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateProfileRequest>, ApiError>,
) -> Result<Json<ProfileResponse>, (StatusCode, Json<ApiError>)> {
    if let Err(message) = validate_profile_update(&request) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("VALIDATION_ERROR", message)),
        ));
    }

    let profile = state
        .profile_service
        .upsert_profile(session.user_id, request)
        .await
        .map_err(internal_error)?;

    let energy = state.profile_service.energy_targets(&profile);

    Ok(Json(ProfileResponse { profile, energy }))
}

fn validate_profile_update(request: &UpdateProfileRequest) -> Result<(), &'static str> {
    if let Some(display_name) = &request.display_name {
        if display_name.trim().is_empty() {
            return Err("Display name must not be empty");
        }
    }

    if let Some(weight) = request.weight_kg {
        if weight < 20.0 || weight > 300.0 {
            return Err("Weight must be between 20 and 300 kg");
        }
    }

    if let Some(height) = request.height_cm {
        if height < 100.0 || height > 250.0 {
            return Err("Height must be between 100 and 250 cm");
        }
    }

    if let Some(birth_date) = request.birth_date {
        let today = Utc::now().date_naive();
        if birth_date >= today {
            return Err("Birth date must be in the past");
        }
        if age_years(birth_date, today) > 120.0 {
            return Err("Birth date implies an age over 120");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn empty_request() -> UpdateProfileRequest {
        UpdateProfileRequest {
            display_name: None,
            gender: None,
            birth_date: None,
            weight_kg: None,
            height_cm: None,
            activity_level: None,
            goal: None,
        }
    }

    #[test]
    fn test_validate_accepts_partial_update() {
        let request = UpdateProfileRequest {
            weight_kg: Some(82.5),
            ..empty_request()
        };
        assert!(validate_profile_update(&request).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_measurements() {
        let request = UpdateProfileRequest {
            weight_kg: Some(10.0),
            ..empty_request()
        };
        assert!(validate_profile_update(&request).is_err());

        let request = UpdateProfileRequest {
            height_cm: Some(400.0),
            ..empty_request()
        };
        assert!(validate_profile_update(&request).is_err());
    }

    #[test]
    fn test_validate_rejects_future_birth_date() {
        let request = UpdateProfileRequest {
            birth_date: NaiveDate::from_ymd_opt(2999, 1, 1),
            ..empty_request()
        };
        assert!(validate_profile_update(&request).is_err());
    }

    #[test]
    fn test_validate_rejects_implausible_age() {
        let request = UpdateProfileRequest {
            birth_date: NaiveDate::from_ymd_opt(1850, 1, 1),
            ..empty_request()
        };
        assert!(validate_profile_update(&request).is_err());
    }
}
