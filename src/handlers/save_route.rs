use crate::error::{json_body, ApiError, ErrorResponse};
use crate::models::{SaveRouteRequest, SaveRouteResponse};
use crate::routes;
use crate::state::AppState;
use crate::validation;
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

/// POST /routes handler - Save a route with a comment
///
/// All shape checks run before the write, so a bad pair is a 400 and
/// nothing is stored.
#[utoipa::path(
    post,
    path = routes::SAVE_ROUTE,
    request_body = SaveRouteRequest,
    responses(
        (status = 201, description = "Route saved", body = SaveRouteResponse),
        (status = 400, description = "Missing or malformed coordinates or comment", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "routes"
)]
pub async fn save_route_handler(
    State(state): State<AppState>,
    payload: Result<Json<SaveRouteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SaveRouteResponse>), ApiError> {
    let request = json_body(payload)?;
    let new_route = validation::new_route(request)?;

    let route = state
        .timed(state.store.insert_route(new_route))
        .await
        .map_err(ApiError::SaveRouteFailed)?;

    tracing::info!(
        "Saved route {} with {} points",
        route.id,
        route.coordinates.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(SaveRouteResponse {
            message: "Route saved successfully!".to_string(),
            route,
        }),
    ))
}
