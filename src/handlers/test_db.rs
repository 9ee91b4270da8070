use crate::error::{ApiError, ErrorResponse};
use crate::models::TestDbResponse;
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// GET /test-db handler - Database connectivity check
///
/// Reads at most one user to prove the store answers.
#[utoipa::path(
    get,
    path = routes::TEST_DB,
    responses(
        (status = 200, description = "Database is reachable", body = TestDbResponse),
        (status = 500, description = "Database is unreachable", body = ErrorResponse)
    ),
    tag = "health"
)]
pub async fn test_db_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TestDbResponse>), ApiError> {
    let users = state
        .timed(state.store.sample_users(1))
        .await
        .map_err(ApiError::DatabaseUnavailable)?;

    tracing::debug!("Connectivity check passed");
    Ok((
        StatusCode::OK,
        Json(TestDbResponse {
            message: "Database connection is working!".to_string(),
            users_found: users.len(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::store::Store;
    use crate::test_support::{
        app_with_deadline, app_with_store, memory_app, read_json, send_empty, FailingStore,
        HangingStore,
    };
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_empty_database() {
        let (app, _store) = memory_app();

        let response = send_empty(&app, "GET", routes::TEST_DB).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: TestDbResponse = read_json(response).await;
        assert_eq!(body.message, "Database connection is working!");
        assert_eq!(body.users_found, 0);
    }

    #[tokio::test]
    async fn test_reports_at_most_one_user() {
        let (app, store) = memory_app();
        for email in ["a@b.com", "c@d.com"] {
            store
                .insert_user(NewUser {
                    email: email.to_string(),
                    password_hash: "$argon2id$x".to_string(),
                })
                .await
                .unwrap();
        }

        let response = send_empty(&app, "GET", routes::TEST_DB).await;

        let body: TestDbResponse = read_json(response).await;
        assert_eq!(body.users_found, 1);
    }

    #[tokio::test]
    async fn test_store_failure() {
        let app = app_with_store(Arc::new(FailingStore));

        let response = send_empty(&app, "GET", routes::TEST_DB).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.message, "Database connection failed");
    }

    #[tokio::test]
    async fn test_hung_store_hits_deadline() {
        let app = app_with_deadline(Arc::new(HangingStore), Duration::from_millis(50));

        let response = send_empty(&app, "GET", routes::TEST_DB).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
