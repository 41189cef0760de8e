//! Request extractors for credentials, sessions and JSON bodies.
//!
//! Authentication runs in `FromRequestParts` extractors, so a request with bad
//! credentials is rejected before its body is read.

use super::AppState;
use crate::{
    core::credentials::{Session, Submitter, load_session},
    errors::Error,
};
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use serde::de::DeserializeOwned;

/// Header carrying the WebSMS API key
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header carrying the user id authenticated by the login service
pub const USER_ID_HEADER: &str = "x-user-id";

const BEARER_PREFIX: &str = "bearer ";

/// API key from `x-api-key`, else from `Authorization: Bearer <key>`.
#[must_use]
pub fn api_key_from_headers(headers: &HeaderMap) -> Option<&str> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if from_header.is_some() {
        return from_header;
    }

    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let prefix = auth.get(..BEARER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    Some(auth.get(BEARER_PREFIX.len()..)?.trim()).filter(|v| !v.is_empty())
}

fn invalid_api_key() -> Error {
    Error::Unauthorized {
        message: "invalid api key".to_string(),
    }
}

/// Submitter identified by a WebSMS API key
#[derive(Debug, Clone)]
pub struct ApiSubmitter(pub Submitter);

#[async_trait]
impl FromRequestParts<AppState> for ApiSubmitter {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = api_key_from_headers(&parts.headers).ok_or_else(invalid_api_key)?;
        let submitter = state
            .resolver
            .resolve(&*state.db, key)
            .await?
            .ok_or_else(invalid_api_key)?;
        Ok(Self(submitter))
    }
}

/// Reviewer forwarded by the login service
#[derive(Debug, Clone)]
pub struct SessionUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthenticated = || Error::Unauthorized {
            message: "authentication required".to_string(),
        };
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or_else(unauthenticated)?;

        let session = load_session(&*state.db, user_id)
            .await?
            .ok_or_else(unauthenticated)?;
        Ok(Self(session))
    }
}

/// Reviewer with the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionUser(session) = SessionUser::from_request_parts(parts, state).await?;
        if !session.is_admin() {
            return Err(Error::Forbidden {
                message: "admin only".to_string(),
            });
        }
        Ok(Self(session))
    }
}

/// `Json` whose rejections become `Validation` errors with a JSON body
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}
