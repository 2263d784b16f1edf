//! Success envelope and request extractors with enveloped rejections

use super::error::{ApiError, ApiResult};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};
use taskflow_core::WorkflowError;

/// JSON body; malformed input answers 400 in the error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; unparsable ids answer 400 in the error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string; unparsable filters answer 400 in the error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

fn encode<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError(WorkflowError::Internal(format!("response encoding failed: {e}"))))
}

fn envelope(status: StatusCode, results: Option<usize>, key: &str, value: Value) -> Response {
    let mut data = Map::new();
    data.insert(key.to_string(), value);
    let mut body = json!({ "status": "success", "data": data });
    if let Some(results) = results {
        body["results"] = json!(results);
    }
    (status, Json(body)).into_response()
}

/// `200 {status, data: {key: value}}`
pub(crate) fn ok<T: Serialize>(key: &str, value: &T) -> ApiResult<Response> {
    Ok(envelope(StatusCode::OK, None, key, encode(value)?))
}

/// `201 {status, data: {key: value}}`
pub(crate) fn created<T: Serialize>(key: &str, value: &T) -> ApiResult<Response> {
    Ok(envelope(StatusCode::CREATED, None, key, encode(value)?))
}

/// `200 {status, results, data: {key: [...]}}`
pub(crate) fn list<T: Serialize>(key: &str, items: &[T]) -> ApiResult<Response> {
    Ok(envelope(StatusCode::OK, Some(items.len()), key, encode(&items)?))
}

/// `204` without body
pub(crate) fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
