use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse};
use crate::api::types::{
    MemberProjectDetailDto, MemberQuery, ParticipatedProjectDto, ProjectDetailDto,
    ProjectSummaryDto, SubmitRequest, format_wire_datetime,
};
use crate::entities::projects;
use crate::state::AppState;

async fn resolve_project(
    state: &AppState,
    selector: &str,
) -> Result<projects::Model, ApiError> {
    if selector == "latest" {
        state
            .store
            .latest_project()
            .await?
            .ok_or_else(|| ApiError::NotFound("no projects available".to_string()))
    } else {
        state
            .store
            .get_project(selector)
            .await?
            .ok_or_else(|| ApiError::project_not_found(selector))
    }
}

/// GET /user/project/{uuid|"latest"}?student_id=
///
/// Questions and answers for a project; when the member has already
/// submitted, their stored answers and score ride along.
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(selector): Path<String>,
    Query(query): Query<MemberQuery>,
) -> Result<ApiResponse<MemberProjectDetailDto>, ApiError> {
    let project = resolve_project(&state, &selector).await?;

    if state.store.get_member(&query.student_id).await?.is_none() {
        return Err(ApiError::member_not_found(&query.student_id));
    }

    let questions = state.store.questions_for_project(&project.uuid).await?;
    let record = state
        .store
        .find_record(&query.student_id, &project.uuid)
        .await?;

    let detail = ProjectDetailDto::from_parts(project, questions);
    let response = match record {
        Some(record) => MemberProjectDetailDto {
            project: detail,
            participate_status: 1,
            record: Some(
                serde_json::from_str(&record.answers)
                    .map_err(|e| ApiError::internal(format!("stored answers corrupt: {e}")))?,
            ),
            correct_num: Some(record.correct_num),
            time_used_seconds: Some(record.time_used_seconds),
        },
        None => MemberProjectDetailDto {
            project: detail,
            participate_status: 0,
            record: None,
            correct_num: None,
            time_used_seconds: None,
        },
    };

    Ok(ApiResponse::ok("project detail", response))
}

/// POST /user/project: submit one answer set.
pub async fn submit_answers(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    let project = state
        .store
        .get_project(&payload.project_uuid)
        .await?
        .ok_or_else(|| ApiError::project_not_found(&payload.project_uuid))?;

    if state.store.get_member(&payload.student_id).await?.is_none() {
        return Err(ApiError::member_not_found(&payload.student_id));
    }

    let answers = serde_json::to_string(&payload.answers)
        .map_err(|e| ApiError::internal(format!("failed to serialize answers: {e}")))?;

    state
        .store
        .submit_record(
            &project,
            &payload.student_id,
            answers,
            payload.correct_num,
            payload.time_used_seconds,
        )
        .await?;

    Ok(ApiResponse::created("submission recorded", ()))
}

/// GET /user/projects/all: every project that has started.
pub async fn list_started_projects(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<Vec<ProjectSummaryDto>>, ApiError> {
    let projects = state.store.list_started_projects().await?;

    let summaries = projects
        .into_iter()
        .map(|(project, owner_username)| ProjectSummaryDto::from_model(project, owner_username))
        .collect();

    Ok(ApiResponse::ok("project list", summaries))
}

/// GET /user/projects?student_id=: the member's participation history.
pub async fn list_participated(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MemberQuery>,
) -> Result<ApiResponse<Vec<ParticipatedProjectDto>>, ApiError> {
    if state.store.get_member(&query.student_id).await?.is_none() {
        return Err(ApiError::member_not_found(&query.student_id));
    }

    let rows = state.store.records_for_member(&query.student_id).await?;

    let history = rows
        .into_iter()
        .filter_map(|(record, project)| {
            let project = project?;
            Some(ParticipatedProjectDto {
                project_uuid: project.uuid,
                name: project.name,
                issue_num: project.issue_num,
                start_time: format_wire_datetime(project.start_time),
                deadline: format_wire_datetime(project.deadline),
                status: project.status,
                correct_num: record.correct_num,
                time_used_seconds: record.time_used_seconds,
            })
        })
        .collect();

    Ok(ApiResponse::ok("participation history", history))
}
