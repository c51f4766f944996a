use axum::{
    extract::{Path, Query, Request, State},
    middleware::{self, Next},
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{
    admin_only_middleware, jwt_auth_middleware, rate_limit_middleware, AuthError, AuthResponse,
    AuthService, LoginRequest, MessageResponse, RateLimitConfig, RateLimiter, RefreshTokenRequest,
    RegisterRequest, TokenResponse, UserInfo, UserRole, UserSession,
};

/// Authentication routes. Credential endpoints are rate limited per client;
/// the rest of the router is open (logout validates its own token).
pub fn auth_routes(auth_service: AuthService) -> Router {
    let rate_limiter = RateLimiter::from_config(&RateLimitConfig::default());

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(middleware::from_fn(move |request: Request, next: Next| {
            let limiter = rate_limiter.clone();
            async move { rate_limit_middleware(request, next, limiter).await }
        }))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route(
            "/me",
            get(me).route_layer(middleware::from_fn_with_state(
                auth_service.clone(),
                jwt_auth_middleware,
            )),
        )
        .with_state(auth_service)
}

/// Register a new user
#[tracing::instrument(skip(auth_service, request))]
async fn register(
    State(auth_service): State<AuthService>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = auth_service.register(request).await?;
    Ok(Json(response))
}

/// Login user
#[tracing::instrument(skip(auth_service, request))]
async fn login(
    State(auth_service): State<AuthService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = auth_service.login(request).await?;
    Ok(Json(response))
}

/// Refresh access token
#[tracing::instrument(skip(auth_service, request))]
async fn refresh_token(
    State(auth_service): State<AuthService>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let response = auth_service.refresh_token(request).await?;
    Ok(Json(response))
}

/// Logout user
#[tracing::instrument(skip(auth_service, request))]
async fn logout(
    State(auth_service): State<AuthService>,
    request: Request,
) -> Result<Json<MessageResponse>, AuthError> {
    let auth_header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = crate::auth::extract_bearer_token(auth_header)?;
    let response = auth_service.logout(token).await?;
    Ok(Json(response))
}

/// Current user info
#[tracing::instrument(skip(auth_service, session))]
async fn me(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<UserInfo>, AuthError> {
    let user_info = auth_service.get_user_info(session.user_id).await?;
    Ok(Json(user_info))
}

/// Admin endpoints. The JWT layer is added last so it runs first and the
/// admin check sees the session it inserted.
pub fn admin_routes(auth_service: AuthService) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/role", put(update_user_role))
        .route_layer(middleware::from_fn(admin_only_middleware))
        .route_layer(middleware::from_fn_with_state(
            auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(auth_service)
}

#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct UserListResponse {
    users: Vec<UserInfo>,
    page: i64,
    limit: i64,
    total: i64,
}

/// List all users (admin only)
async fn list_users(
    State(auth_service): State<AuthService>,
    Query(params): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>, AuthError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 100);
    let page = params.page.unwrap_or(1).max(1);
    let offset = (page - 1) * limit;

    let (users, total) = auth_service.list_users(limit, offset).await?;

    Ok(Json(UserListResponse {
        users,
        page,
        limit,
        total,
    }))
}

#[derive(Debug, Deserialize)]
struct UpdateRoleRequest {
    role: UserRole,
}

/// Update user role (admin only)
async fn update_user_role(
    State(auth_service): State<AuthService>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<UserInfo>, AuthError> {
    let user_info = auth_service.set_user_role(user_id, request.role).await?;
    Ok(Json(user_info))
}
