use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::handlers::{
    list_routes_handler, save_route_handler, signin_handler, signup_handler, test_db_handler,
};
use crate::routes;
use crate::state::AppState;

/// Build the service router: every endpoint, Swagger UI, CORS and tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(routes::TEST_DB, get(test_db_handler))
        .route(routes::SIGNUP, post(signup_handler))
        .route(routes::SIGNIN, post(signin_handler))
        .route(routes::SAVE_ROUTE, post(save_route_handler))
        .route(routes::LIST_ROUTES, get(list_routes_handler))
        .merge(SwaggerUi::new(routes::SWAGGER_UI).url(routes::OPENAPI_JSON, ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
