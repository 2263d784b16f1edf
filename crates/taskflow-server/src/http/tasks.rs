//! `/tasks` handlers

use super::error::ApiResult;
use super::response::{created, list, no_content, ok, ApiJson, ApiPath, ApiQuery};
use crate::auth::Authenticated;
use crate::state::AppState;
use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use taskflow_core::types::deserialize_opt_ref;
use taskflow_core::{Priority, ProjectId, TaskDraft, TaskFilter, TaskId, TaskPatch, TaskStatus, UserId};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskQuery {
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    project: Option<ProjectId>,
    status: Option<TaskStatus>,
    priority: Option<Priority>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    assigned_to: Option<UserId>,
}

impl From<TaskQuery> for TaskFilter {
    fn from(query: TaskQuery) -> Self {
        TaskFilter {
            project: query.project,
            status: query.status,
            priority: query.priority,
            assigned_to: query.assigned_to,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignBody {
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    assigned_to: Option<UserId>,
}

/// Status stays a raw name so a non-assignee is refused before it is parsed
#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    #[serde(default)]
    status: Option<serde_json::Value>,
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiJson(draft): ApiJson<TaskDraft>,
) -> ApiResult<Response> {
    let task = state.services.tasks.create_task(draft, &actor).await?;
    created("task", &task)
}

pub(crate) async fn index(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    ApiQuery(query): ApiQuery<TaskQuery>,
) -> ApiResult<Response> {
    list("tasks", &state.services.tasks.list_tasks(query.into()).await?)
}

pub(crate) async fn by_project(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    ApiPath(project): ApiPath<ProjectId>,
) -> ApiResult<Response> {
    list("tasks", &state.services.tasks.project_tasks(project).await?)
}

pub(crate) async fn show(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    ApiPath(id): ApiPath<TaskId>,
) -> ApiResult<Response> {
    ok("task", &state.services.tasks.get_task(id).await?)
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> ApiResult<Response> {
    ok("task", &state.services.tasks.update_task(id, patch, &actor).await?)
}

pub(crate) async fn assign(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(body): ApiJson<AssignBody>,
) -> ApiResult<Response> {
    let task = state.services.tasks.assign_task(id, body.assigned_to, &actor).await?;
    ok("task", &task)
}

pub(crate) async fn update_status(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(body): ApiJson<StatusBody>,
) -> ApiResult<Response> {
    let name = body.status.as_ref().map(|v| v.as_str().unwrap_or_default());
    let task = state
        .services
        .tasks
        .update_task_status_named(id, name, &actor)
        .await?;
    ok("task", &task)
}

pub(crate) async fn destroy(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(id): ApiPath<TaskId>,
) -> ApiResult<Response> {
    state.services.tasks.delete_task(id, &actor).await?;
    Ok(no_content())
}
