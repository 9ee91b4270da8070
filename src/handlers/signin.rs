use crate::error::{json_body, ApiError, ErrorResponse};
use crate::models::{CredentialsRequest, SigninData, SigninResponse};
use crate::routes;
use crate::validation::{self, Credentials};
use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};

/// POST /signin handler - Placeholder sign-in
///
/// Known gap: the password is not checked against the stored hash and the
/// user need not exist. Any request carrying both fields succeeds.
#[utoipa::path(
    post,
    path = routes::SIGNIN,
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Placeholder success, no credential check", body = SigninResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn signin_handler(
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SigninResponse>), ApiError> {
    let request = json_body(payload)?;
    let Credentials { username, .. } = validation::credentials(request)?;

    tracing::warn!("Placeholder signin accepted without credential check: {}", username);
    Ok((
        StatusCode::OK,
        Json(SigninResponse {
            message: "Signin successful (placeholder)".to_string(),
            data: SigninData { username },
        }),
    ))
}
