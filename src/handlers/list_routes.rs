use crate::error::{ApiError, ErrorResponse};
use crate::models::ListRoutesResponse;
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// GET /api/routes handler - List every saved route, newest first
///
/// Unpaginated: the response holds every stored route.
#[utoipa::path(
    get,
    path = routes::LIST_ROUTES,
    responses(
        (status = 200, description = "All routes, most recent first", body = ListRoutesResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "routes"
)]
pub async fn list_routes_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ListRoutesResponse>), ApiError> {
    let routes = state
        .timed(state.store.list_routes())
        .await
        .map_err(ApiError::FetchRoutesFailed)?;

    tracing::info!("Listed {} routes", routes.len());
    Ok((StatusCode::OK, Json(ListRoutesResponse { routes })))
}
