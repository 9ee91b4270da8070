use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A `[longitude, latitude]` pair
pub type Coordinate = [f64; 2];

/// A stored user account
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user about to be inserted; the store assigns `id` and `created_at`
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// A stored route, serialized as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[schema(value_type = Vec<Vec<f64>>)]
    pub coordinates: Vec<Coordinate>,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A validated route about to be inserted
#[derive(Debug, Clone)]
pub struct NewRoute {
    pub coordinates: Vec<Coordinate>,
    pub comment: String,
}

/// Body of POST /signup and POST /signin
///
/// Fields are optional so that a missing field is reported with the
/// endpoint's own message instead of a body parse failure.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Body of POST /routes, kept loosely typed so shape errors map to specific messages
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct SaveRouteRequest {
    #[schema(value_type = Option<Vec<Vec<f64>>>)]
    pub coordinates: Option<JsonValue>,
    #[schema(value_type = Option<String>)]
    pub comment: Option<JsonValue>,
}

/// Response type for GET /test-db
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestDbResponse {
    pub message: String,
    pub users_found: usize,
}

/// Response type for successful signups
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub username: String,
    pub user_id: Uuid,
}

/// Response type for POST /signin
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SigninResponse {
    pub message: String,
    pub data: SigninData,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SigninData {
    pub username: String,
}

/// Response type for a saved route
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SaveRouteResponse {
    pub message: String,
    pub route: Route,
}

/// Response type for GET /api/routes
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ListRoutesResponse {
    pub routes: Vec<Route>,
}
