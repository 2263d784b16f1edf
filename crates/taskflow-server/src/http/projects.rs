//! `/project` handlers

use super::error::ApiResult;
use super::response::{created, list, no_content, ok, ApiJson, ApiPath};
use crate::auth::Authenticated;
use crate::state::AppState;
use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use taskflow_core::types::deserialize_opt_ref;
use taskflow_core::{ProjectDraft, ProjectId, ProjectPatch, UserId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MemberBody {
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    user_id: Option<UserId>,
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiJson(draft): ApiJson<ProjectDraft>,
) -> ApiResult<Response> {
    let project = state.services.projects.create_project(draft, &actor).await?;
    created("project", &project)
}

pub(crate) async fn index(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
) -> ApiResult<Response> {
    list("projects", &state.services.projects.list_projects().await?)
}

pub(crate) async fn show(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    ApiPath(id): ApiPath<ProjectId>,
) -> ApiResult<Response> {
    ok("project", &state.services.projects.get_project(id).await?)
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(id): ApiPath<ProjectId>,
    ApiJson(patch): ApiJson<ProjectPatch>,
) -> ApiResult<Response> {
    let project = state.services.projects.update_project(id, patch, &actor).await?;
    ok("project", &project)
}

pub(crate) async fn destroy(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(id): ApiPath<ProjectId>,
) -> ApiResult<Response> {
    state.services.projects.delete_project(id, &actor).await?;
    Ok(no_content())
}

pub(crate) async fn add_member(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    ApiPath(id): ApiPath<ProjectId>,
    ApiJson(body): ApiJson<MemberBody>,
) -> ApiResult<Response> {
    let project = state.services.membership.add_member(id, body.user_id).await?;
    ok("project", &project)
}

pub(crate) async fn remove_member(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    ApiPath(id): ApiPath<ProjectId>,
    ApiJson(body): ApiJson<MemberBody>,
) -> ApiResult<Response> {
    let project = state.services.membership.remove_member(id, body.user_id).await?;
    ok("project", &project)
}

pub(crate) async fn team_members(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    ApiPath(id): ApiPath<ProjectId>,
) -> ApiResult<Response> {
    ok("members", &state.services.membership.list_members(id).await?)
}
