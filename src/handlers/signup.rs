use crate::error::{json_body, ApiError, ErrorResponse};
use crate::models::{CredentialsRequest, NewUser, SignupResponse};
use crate::password;
use crate::routes;
use crate::state::AppState;
use crate::store::StoreError;
use crate::validation::{self, Credentials};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

/// POST /signup handler - Register a new user
///
/// The lookup before the insert gives a friendly 409 in the common case. Two
/// concurrent signups can both pass it; the store's unique email constraint
/// then rejects the second insert, which also maps to 409.
#[utoipa::path(
    post,
    path = routes::SIGNUP,
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created", body = SignupResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Database or hashing error", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn signup_handler(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let request = json_body(payload)?;
    let Credentials { username, password } = validation::credentials(request)?;

    let existing = state
        .timed(state.store.find_user_by_email(&username))
        .await
        .map_err(|e| ApiError::SignupFailed(e.into()))?;
    if existing.is_some() {
        tracing::info!("Signup rejected, user already exists: {}", username);
        return Err(ApiError::UserExists);
    }

    let password_hash = password::hash_password_blocking(password)
        .await
        .map_err(ApiError::SignupFailed)?;

    let new_user = NewUser {
        email: username,
        password_hash,
    };
    let user = match state.timed(state.store.insert_user(new_user)).await {
        Ok(user) => user,
        Err(StoreError::Duplicate) => {
            tracing::warn!("Concurrent signup lost the race on unique email");
            return Err(ApiError::UserExists);
        }
        Err(e) => return Err(ApiError::SignupFailed(e.into())),
    };

    tracing::info!("Created user {} with id: {} at {}", user.email, user.id, user.created_at);
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Signup successful".to_string(),
            username: user.email,
            user_id: user.id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::{NewRoute, Route, User};
    use crate::password::verify_password;
    use crate::store::{Store, StoreResult};
    use crate::test_support::{
        app_with_store, capture_logs, memory_app, read_json, send_empty, send_json, FailingStore,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_signup_success() {
        let (app, store) = memory_app();

        let response = send_json(&app, "POST", routes::SIGNUP,
            r#"{"username":"a@b.com","password":"secret"}"#).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: SignupResponse = read_json(response).await;
        assert_eq!(body.message, "Signup successful");
        assert_eq!(body.username, "a@b.com");

        let user = store.find_user_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(user.id, body.user_id);
        assert_ne!(user.password_hash, "secret");
        assert!(verify_password("secret", &user.password_hash));
    }

    #[tokio::test]
    async fn test_signup_twice_conflicts() {
        let (app, store) = memory_app();
        let body = r#"{"username":"a@b.com","password":"secret"}"#;

        let first = send_json(&app, "POST", routes::SIGNUP, body).await;
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = send_json(&app, "POST", routes::SIGNUP, body).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let error: ErrorResponse = read_json(second).await;
        assert_eq!(error.message, "User already exists");

        assert_eq!(store.sample_users(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_signup_missing_fields() {
        let (app, store) = memory_app();

        for body in [
            r#"{}"#,
            r#"{"username":"a@b.com"}"#,
            r#"{"password":"secret"}"#,
            r#"{"username":"","password":"secret"}"#,
            r#"{"username":"a@b.com","password":""}"#,
        ] {
            let response = send_json(&app, "POST", routes::SIGNUP, body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
            let error: ErrorResponse = read_json(response).await;
            assert_eq!(error.message, "Username and password are required");
        }

        assert!(store.sample_users(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signup_invalid_json() {
        let (app, _store) = memory_app();

        let response = send_json(&app, "POST", routes::SIGNUP, "{invalid json}").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = read_json(response).await;
        assert_eq!(error.message, "Invalid JSON body");
    }

    #[tokio::test]
    async fn test_signup_wrong_field_type_keeps_value_out_of_logs() {
        let (logs, _guard) = capture_logs();
        let (app, store) = memory_app();

        let response = send_json(&app, "POST", routes::SIGNUP,
            r#"{"username":"a@b.com","password":918273645}"#).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = read_json(response).await;
        assert_eq!(error.message, "Invalid JSON body");
        assert!(store.sample_users(10).await.unwrap().is_empty());

        let output = logs.contents();
        assert!(output.contains("Rejected request body"));
        assert!(!output.contains("918273645"));
    }

    #[tokio::test]
    async fn test_signup_without_json_content_type() {
        let (app, store) = memory_app();

        let response = send_empty(&app, "POST", routes::SIGNUP).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = read_json(response).await;
        assert_eq!(error.message, "Username and password are required");
        assert!(store.sample_users(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signup_store_failure() {
        let app = app_with_store(Arc::new(FailingStore));

        let response = send_json(&app, "POST", routes::SIGNUP,
            r#"{"username":"a@b.com","password":"secret"}"#).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = read_json(response).await;
        assert_eq!(error.message, "Internal server error");
    }

    /// Misses on lookup but reports a unique violation on insert, like a lost race
    struct RacingStore(MemoryStore);

    #[async_trait]
    impl Store for RacingStore {
        async fn sample_users(&self, limit: usize) -> StoreResult<Vec<User>> {
            self.0.sample_users(limit).await
        }

        async fn find_user_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn insert_user(&self, _user: NewUser) -> StoreResult<User> {
            Err(StoreError::Duplicate)
        }

        async fn insert_route(&self, route: NewRoute) -> StoreResult<Route> {
            self.0.insert_route(route).await
        }

        async fn list_routes(&self) -> StoreResult<Vec<Route>> {
            self.0.list_routes().await
        }
    }

    #[tokio::test]
    async fn test_signup_race_maps_to_conflict() {
        let app = app_with_store(Arc::new(RacingStore(MemoryStore::new())));

        let response = send_json(&app, "POST", routes::SIGNUP,
            r#"{"username":"a@b.com","password":"secret"}"#).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
