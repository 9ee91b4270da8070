use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

/// Custom error type for API endpoints
///
/// Each variant maps to one HTTP status and one fixed message. Variants that
/// wrap a cause log it here; the cause is never sent to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Request body is not JSON or has the wrong field types
    MalformedBody(JsonRejection),
    /// Signup or signin without both username and password
    MissingCredentials,
    /// Signup for an email that is already registered
    UserExists,
    MissingCoordinates,
    MissingComment,
    /// A coordinate element is not a `[lng, lat]` numeric pair
    MalformedCoordinates,
    /// Connectivity check failed
    DatabaseUnavailable(StoreError),
    /// Signup failed while looking up, hashing or saving
    SignupFailed(anyhow::Error),
    SaveRouteFailed(StoreError),
    FetchRoutesFailed(StoreError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MalformedBody(_) => (StatusCode::BAD_REQUEST, "Invalid JSON body"),
            ApiError::MissingCredentials => {
                (StatusCode::BAD_REQUEST, "Username and password are required")
            }
            ApiError::UserExists => (StatusCode::CONFLICT, "User already exists"),
            ApiError::MissingCoordinates => {
                (StatusCode::BAD_REQUEST, "Route coordinates are required.")
            }
            ApiError::MissingComment => (StatusCode::BAD_REQUEST, "Route comment is required."),
            ApiError::MalformedCoordinates => (
                StatusCode::BAD_REQUEST,
                "Coordinates must be an array of [lng, lat] pairs.",
            ),
            ApiError::DatabaseUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database connection failed")
            }
            ApiError::SignupFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
            ApiError::SaveRouteFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error saving route.")
            }
            ApiError::FetchRoutesFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error fetching routes")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            ApiError::MalformedBody(rejection) => {
                // body_text() can echo field values, passwords included
                tracing::debug!("Rejected request body with status {}", rejection.status());
            }
            ApiError::DatabaseUnavailable(err) => {
                tracing::error!("Database connectivity check failed: {:#}", err);
            }
            ApiError::SignupFailed(err) => tracing::error!("Signup error: {:#}", err),
            ApiError::SaveRouteFailed(err) => tracing::error!("Error saving route: {:#}", err),
            ApiError::FetchRoutesFailed(err) => tracing::error!("Error fetching routes: {:#}", err),
            _ => tracing::debug!("Request rejected with {}: {}", status, message),
        }

        let body = Json(ErrorResponse {
            message: message.to_string(),
        });

        (status, body).into_response()
    }
}

/// Unwrap a JSON body, treating a missing JSON content type as an empty object
///
/// Clients that post without `Content-Type: application/json` then get the
/// endpoint's missing-field message rather than a parse error.
pub fn json_body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection)
    }
}
