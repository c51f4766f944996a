// API routes and handlers

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

pub mod health;
pub mod routes;
pub mod auth;
pub mod profile;
pub mod exercises;
pub mod workouts;
pub mod workout_logs;
pub mod foods;
pub mod nutrition_logs;
pub mod nutrition;
pub mod achievements;

#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub error_code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error_code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(code: &str, message: &str, details: serde_json::Value) -> Self {
        Self {
            error_code: code.to_string(),
            message: message.to_string(),
            details: Some(details),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new("INVALID_BODY", &rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

/// 500 with a generic body; the underlying error is logged, never leaked
pub(crate) fn internal_error(err: anyhow::Error) -> (StatusCode, Json<ApiError>) {
    tracing::error!("Internal error: {:#}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new("INTERNAL_ERROR", "Internal server error")),
    )
}

/// Page-number pagination, accepted as `?page=&pageSize=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: 20, max: 100)
    pub page_size: Option<i64>,
}

impl PageQuery {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err("Page must be at least 1");
            }
        }
        if let Some(page_size) = self.page_size {
            if page_size < 1 || page_size > 100 {
                return Err("Page size must be between 1 and 100");
            }
        }
        Ok(())
    }

    pub fn get_page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn get_page_size(&self) -> i64 {
        self.page_size.unwrap_or(20).min(100).max(1)
    }

    pub fn get_limit(&self) -> i64 {
        self.get_page_size()
    }

    pub fn get_offset(&self) -> i64 {
        (self.get_page() - 1) * self.get_page_size()
    }
}

/// Paginated list envelope
#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

impl<T> PagedResponse<T> {
    pub fn new(items: Vec<T>, query: &PageQuery, total: i64) -> Self {
        Self {
            items,
            page: query.get_page(),
            page_size: query.get_page_size(),
            total,
        }
    }
}
