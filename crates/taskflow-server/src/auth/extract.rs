//! Bearer-token extractor for protected routes

use crate::http::ApiError;
use crate::state::AppState;
use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;
use taskflow_core::{Actor, WorkflowError};

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Credential from `Authorization: Bearer <token>`, falling back to a
/// `?token=` query parameter (browsers cannot set headers on a socket
/// handshake)
fn bearer_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer"))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token)
            .filter(|token| !token.is_empty())
    })
}

/// The authenticated caller of a protected route
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Actor);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            WorkflowError::Authentication(
                "You are not logged in! Please log in to get access.".to_string(),
            )
        })?;
        let actor = state.accounts.authenticate(&token).await?;
        Ok(Self(actor))
    }
}
