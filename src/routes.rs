// Route path constants - single source of truth for all API paths

pub const TEST_DB: &str = "/test-db";
pub const SIGNUP: &str = "/signup";
pub const SIGNIN: &str = "/signin";
pub const SAVE_ROUTE: &str = "/routes";
pub const LIST_ROUTES: &str = "/api/routes";
pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";
