//! `/auth` handlers

use super::error::ApiResult;
use super::response::{list, ApiJson, ApiPath};
use crate::auth::{Authenticated, LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleLogin {
    credential: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForgotPassword {
    email: Option<String>,
}

pub(crate) async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<Response> {
    let user = state.accounts.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "User registered successfully",
            "user": { "name": user.name, "email": user.email, "role": user.role },
        })),
    )
        .into_response())
}

pub(crate) async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let session = state.accounts.login(request).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "User logged in successfully",
        "token": session.token,
    }))
    .into_response())
}

pub(crate) async fn google(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GoogleLogin>,
) -> ApiResult<Response> {
    let session = state.accounts.federated_login(request.credential).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "User logged in successfully",
        "token": session.token,
        "user": session.user.summary(),
    }))
    .into_response())
}

pub(crate) async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ForgotPassword>,
) -> ApiResult<Response> {
    state.accounts.forgot_password(request.email).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "If that email is registered, a reset link has been sent",
    }))
    .into_response())
}

pub(crate) async fn validate_reset_token(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> ApiResult<Response> {
    state.accounts.validate_reset_token(&token).await?;
    Ok(Json(json!({ "status": "success", "message": "Token is valid" })).into_response())
}

pub(crate) async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Response> {
    state.accounts.reset_password(request).await?;
    Ok(Json(json!({ "status": "success", "message": "Password has been reset" })).into_response())
}

pub(crate) async fn users(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
) -> ApiResult<Response> {
    list("users", &state.accounts.list_users().await?)
}
