//! `/notifications` handlers; every route acts on the caller's own inbox

use super::error::ApiResult;
use super::response::{list, no_content, ok, ApiPath};
use crate::auth::Authenticated;
use crate::state::AppState;
use axum::extract::State;
use axum::response::Response;
use taskflow_core::NotificationId;

pub(crate) async fn index(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<Response> {
    list("notifications", &state.services.inbox.list(&actor).await?)
}

pub(crate) async fn mark_as_read(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<Response> {
    ok("notification", &state.services.inbox.mark_as_read(id, &actor).await?)
}

pub(crate) async fn destroy(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<Response> {
    state.services.inbox.delete(id, &actor).await?;
    Ok(no_content())
}
