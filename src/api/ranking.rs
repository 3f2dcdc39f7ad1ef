use axum::extract::{Query, State};
use std::collections::HashMap;
use std::sync::Arc;

use super::{ApiError, ApiResponse};
use crate::api::types::{CumulativeRankingDto, CurrentRankingDto, MemberQuery};
use crate::services::ranking::{self, CurrentRow};
use crate::state::AppState;

/// GET /ranking?student_id=: leaderboard for the current campaign round.
pub async fn current_ranking(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MemberQuery>,
) -> Result<ApiResponse<CurrentRankingDto>, ApiError> {
    let project = state
        .store
        .latest_project()
        .await?
        .ok_or_else(|| ApiError::NotFound("no projects available".to_string()))?;

    let rows: Vec<CurrentRow> = state
        .store
        .valid_records_for_project(&project.uuid)
        .await?
        .into_iter()
        .filter_map(|(record, member)| {
            let member = member?;
            Some(CurrentRow {
                student_id: member.student_id,
                name: member.name,
                org_unit: member.org_unit,
                correct_num: record.correct_num,
                time_used_seconds: record.time_used_seconds,
            })
        })
        .collect();

    let (top, own) = ranking::rank_current(rows, &query.student_id);
    let owner_username = state.store.admin_username(project.admin_id).await?;

    Ok(ApiResponse::ok(
        "current ranking",
        CurrentRankingDto {
            project_uuid: project.uuid,
            project_name: project.name,
            issue_num: project.issue_num,
            owner_username,
            self_ranking: own,
            ranking: top,
        },
    ))
}

/// GET /ranking/all?student_id=: cumulative leaderboard over every member
/// and all their valid submissions.
pub async fn cumulative_ranking(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MemberQuery>,
) -> Result<ApiResponse<CumulativeRankingDto>, ApiError> {
    let members = state.store.list_members().await?;
    let records = state.store.all_valid_records().await?;

    let mut scores: HashMap<String, Vec<(i32, f64)>> = HashMap::new();
    for record in records {
        scores
            .entry(record.student_id)
            .or_default()
            .push((record.correct_num, record.time_used_seconds));
    }

    let rows = members
        .into_iter()
        .map(|member| {
            let member_scores = scores.remove(&member.student_id).unwrap_or_default();
            ranking::accumulate(member.student_id, member.name, member.org_unit, &member_scores)
        })
        .collect();

    let (top, own) = ranking::rank_cumulative(rows, &query.student_id);

    Ok(ApiResponse::ok(
        "cumulative ranking",
        CumulativeRankingDto {
            self_ranking: own,
            ranking: top,
        },
    ))
}
