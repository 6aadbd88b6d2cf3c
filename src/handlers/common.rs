use crate::errors::{ApiError, ServiceError};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the id of the user performing the request. Order and
/// inventory writes record it as `user_id` / `created_by`.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Extractor for the acting user's id, taken from the `x-actor-id` header.
#[derive(Debug, Clone, Copy)]
pub struct ActorId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Missing required header '{}'", ACTOR_ID_HEADER))
            })?
            .to_str()
            .map_err(|_| {
                ApiError::BadRequest(format!("Header '{}' is not valid text", ACTOR_ID_HEADER))
            })?;

        let actor_id = Uuid::parse_str(value).map_err(|_| {
            ApiError::BadRequest(format!("Header '{}' must be a UUID", ACTOR_ID_HEADER))
        })?;

        Ok(ActorId(actor_id))
    }
}

/// Pagination parameters for list operations
#[derive(Debug, Deserialize, Serialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}
