use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::AdminIdentity;
use super::{ApiError, ApiResponse};
use crate::api::types::{
    ProjectCreateRequest, ProjectCreatedDto, ProjectDetailDto, ProjectSummaryDto,
};
use crate::db::{ProjectInput, QuestionInput};
use crate::state::AppState;

fn build_input(payload: ProjectCreateRequest) -> Result<ProjectInput, ApiError> {
    let mut questions = Vec::with_capacity(payload.questions.len());
    for question in payload.questions {
        if !matches!(question.kind, 0 | 1) {
            return Err(ApiError::validation(
                "question kind must be 0 (single-choice) or 1 (multi-choice)",
            ));
        }
        questions.push(QuestionInput {
            kind: question.kind,
            text: question.text,
            option_a: question.option_a,
            option_b: question.option_b,
            option_c: question.option_c,
            option_d: question.option_d,
            answer: question.answer,
        });
    }

    Ok(ProjectInput {
        name: payload.name,
        issue_num: payload.issue_num,
        start_time: payload.start_time,
        deadline: payload.deadline,
        questions,
    })
}

/// POST /admin/project
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Json(payload): Json<ProjectCreateRequest>,
) -> Result<ApiResponse<ProjectCreatedDto>, ApiError> {
    let input = build_input(payload)?;
    let project_uuid = state.store.create_project(admin.id, input).await?;

    Ok(ApiResponse::created(
        "project created",
        ProjectCreatedDto { project_uuid },
    ))
}

/// GET /admin/project/{uuid}: detail including questions and answers.
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(uuid): Path<String>,
) -> Result<ApiResponse<ProjectDetailDto>, ApiError> {
    let project = state
        .store
        .get_project(&uuid)
        .await?
        .ok_or_else(|| ApiError::project_not_found(&uuid))?;

    let questions = state.store.questions_for_project(&project.uuid).await?;

    Ok(ApiResponse::ok(
        "project detail",
        ProjectDetailDto::from_parts(project, questions),
    ))
}

/// PUT /admin/project/{uuid}: full replace under the same uuid.
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Path(uuid): Path<String>,
    Json(payload): Json<ProjectCreateRequest>,
) -> Result<ApiResponse<ProjectCreatedDto>, ApiError> {
    let input = build_input(payload)?;

    if !state.store.replace_project(&uuid, admin.id, input).await? {
        return Err(ApiError::project_not_found(&uuid));
    }

    Ok(ApiResponse::ok(
        "project updated",
        ProjectCreatedDto { project_uuid: uuid },
    ))
}

/// GET /admin/projects: the administrator's own projects.
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
) -> Result<ApiResponse<Vec<ProjectSummaryDto>>, ApiError> {
    let projects = state.store.list_projects_for_admin(admin.id).await?;

    let summaries = projects
        .into_iter()
        .map(|p| ProjectSummaryDto::from_model(p, None))
        .collect();

    Ok(ApiResponse::ok("project list", summaries))
}

/// DELETE /admin/project/{uuid}: cascades to questions and records.
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(uuid): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    if !state.store.delete_project(&uuid).await? {
        return Err(ApiError::project_not_found(&uuid));
    }

    Ok(ApiResponse::ok("project deleted", ()))
}
