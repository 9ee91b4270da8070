use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use crate::models::{
    CredentialsRequest, ListRoutesResponse, Route, SaveRouteRequest, SaveRouteResponse,
    SigninData, SigninResponse, SignupResponse, TestDbResponse,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "routes-api",
        version = "1.0.0",
        description = "User signup and saved map routes backed by Google Cloud Spanner"
    ),
    paths(
        handlers::test_db::test_db_handler,
        handlers::signup::signup_handler,
        handlers::signin::signin_handler,
        handlers::save_route::save_route_handler,
        handlers::list_routes::list_routes_handler
    ),
    components(
        schemas(
            CredentialsRequest,
            SignupResponse,
            SigninResponse,
            SigninData,
            SaveRouteRequest,
            SaveRouteResponse,
            ListRoutesResponse,
            Route,
            TestDbResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "health", description = "Database connectivity"),
        (name = "users", description = "Signup and placeholder signin"),
        (name = "routes", description = "Saved map routes")
    )
)]
pub struct ApiDoc;
