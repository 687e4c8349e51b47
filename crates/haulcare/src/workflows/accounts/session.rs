//! Bearer-token extractors enforcing login at the HTTP boundary.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, warn};

use super::service::{AccountService, Session};
use crate::outcome::{ApiError, ApiResult};
use crate::records::CaseRepository;

/// Resolves bearer tokens to sessions.
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str) -> ApiResult<Session>;
}

impl<R> SessionVerifier for AccountService<R>
where
    R: CaseRepository + 'static,
{
    fn verify(&self, token: &str) -> ApiResult<Session> {
        self.session(token)
    }
}

pub type SharedSessions = Arc<dyn SessionVerifier>;

/// Any logged-in user.
///
/// Reads `Authorization: Bearer <token>` and resolves it through the
/// [`SharedSessions`] held in router state.
pub struct AuthenticatedSession(pub Session);

/// A logged-in user whose role is `admin`.
pub struct AdminSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedSession
where
    S: Send + Sync,
    SharedSessions: FromRef<S>,
{
    type Rejection = SessionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let sessions = SharedSessions::from_ref(state);
        let session = sessions.verify(token).map_err(|err| match err {
            ApiError::Generic => SessionError::Unavailable,
            other => {
                debug!(error = %other, "session validation failed");
                SessionError::InvalidSession
            }
        })?;
        Ok(Self(session))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    SharedSessions: FromRef<S>,
{
    type Rejection = SessionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedSession(session) =
            AuthenticatedSession::from_request_parts(parts, state).await?;
        if !session.is_admin() {
            warn!(user_id = %session.user_id, "non-admin session rejected");
            return Err(SessionError::NotAdmin);
        }
        Ok(Self(session))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, SessionError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(SessionError::MissingAuthorizationHeader)?
        .to_str()
        .map_err(|_| SessionError::InvalidAuthorizationHeader)?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(SessionError::InvalidAuthorizationHeader)
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("missing Authorization header")]
    MissingAuthorizationHeader,
    #[error("expected 'Bearer <token>'")]
    InvalidAuthorizationHeader,
    #[error("session is invalid or expired")]
    InvalidSession,
    #[error("admin role required")]
    NotAdmin,
    #[error("session store unavailable")]
    Unavailable,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SessionError::Unavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            _ => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
