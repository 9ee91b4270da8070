use serde_json::Value as JsonValue;

use crate::error::ApiError;
use crate::models::{Coordinate, CredentialsRequest, NewRoute, SaveRouteRequest};

/// Username and password, both present and non-empty
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub fn credentials(request: CredentialsRequest) -> Result<Credentials, ApiError> {
    match (request.username, request.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok(Credentials { username, password })
        }
        _ => Err(ApiError::MissingCredentials),
    }
}

/// Parse one `[lng, lat]` element; anything but exactly two JSON numbers is rejected
fn coordinate(value: &JsonValue) -> Option<Coordinate> {
    match value.as_array()?.as_slice() {
        [lng, lat] => Some([lng.as_f64()?, lat.as_f64()?]),
        _ => None,
    }
}

/// Validate a route body in order: coordinates present, comment present, pair shape
pub fn new_route(request: SaveRouteRequest) -> Result<NewRoute, ApiError> {
    let pairs = match request.coordinates {
        Some(JsonValue::Array(pairs)) if !pairs.is_empty() => pairs,
        _ => return Err(ApiError::MissingCoordinates),
    };

    let comment = match request.comment {
        Some(JsonValue::String(comment)) if !comment.trim().is_empty() => comment.trim().to_string(),
        _ => return Err(ApiError::MissingComment),
    };

    let coordinates = pairs
        .iter()
        .map(coordinate)
        .collect::<Option<Vec<_>>>()
        .ok_or(ApiError::MalformedCoordinates)?;

    Ok(NewRoute { coordinates, comment })
}
