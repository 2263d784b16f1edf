//! `/issues` handlers

use super::error::ApiResult;
use super::response::{created, list, no_content, ok, ApiJson, ApiPath, ApiQuery};
use crate::auth::Authenticated;
use crate::state::AppState;
use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use taskflow_core::types::deserialize_opt_ref;
use taskflow_core::{IssueDraft, IssueFilter, IssueId, IssuePatch, IssueStatus, Priority, TaskId};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IssueQuery {
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    task: Option<TaskId>,
    status: Option<IssueStatus>,
    priority: Option<Priority>,
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiJson(draft): ApiJson<IssueDraft>,
) -> ApiResult<Response> {
    created("issue", &state.services.issues.create_issue(draft, &actor).await?)
}

pub(crate) async fn index(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    ApiQuery(query): ApiQuery<IssueQuery>,
) -> ApiResult<Response> {
    let filter = IssueFilter {
        task: query.task,
        status: query.status,
        priority: query.priority,
    };
    list("issues", &state.services.issues.list_issues(filter).await?)
}

pub(crate) async fn show(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    ApiPath(id): ApiPath<IssueId>,
) -> ApiResult<Response> {
    ok("issue", &state.services.issues.get_issue(id).await?)
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(id): ApiPath<IssueId>,
    ApiJson(patch): ApiJson<IssuePatch>,
) -> ApiResult<Response> {
    ok("issue", &state.services.issues.update_issue(id, patch, &actor).await?)
}

pub(crate) async fn destroy(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(id): ApiPath<IssueId>,
) -> ApiResult<Response> {
    state.services.issues.delete_issue(id, &actor).await?;
    Ok(no_content())
}
