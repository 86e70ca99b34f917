//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use super::ApiError;
use crate::{
    constants::{USER_HEADER, USER_NAME_HEADER, USER_QUERY_PARAM},
    model::{UserId, UserSummary},
};

/// The user on whose behalf a request runs.
///
/// Read from the `x-user-id` header, falling back to the `userId` query
/// parameter. The display name comes from `x-user-name` when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser {
    pub id: UserId,
    pub name: Option<String>,
}

impl ActingUser {
    /// The identity recorded when this user creates a board.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone().unwrap_or_else(|| self.id.to_string()),
            email: None,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ActingUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = match parts.headers.get(USER_HEADER) {
            Some(value) => value
                .to_str()
                .map_err(|_| ApiError::Unauthorized(format!("Invalid {USER_HEADER} header")))?
                .to_string(),
            None => parts
                .uri
                .query()
                .and_then(|query| {
                    url::form_urlencoded::parse(query.as_bytes())
                        .find(|(key, _)| key == USER_QUERY_PARAM)
                        .map(|(_, value)| value.into_owned())
                })
                .ok_or_else(|| ApiError::Unauthorized(format!("Missing {USER_HEADER} header")))?,
        };
        let id = raw
            .parse::<UserId>()
            .map_err(|err| ApiError::Unauthorized(err.to_string()))?;
        let name = parts
            .headers
            .get(USER_NAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        Ok(Self { id, name })
    }
}

/// `Json` with rejections rendered as [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Path` with rejections rendered as [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// `Query` with rejections rendered as [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}
