use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse};
use crate::api::types::{MemberDto, MemberUpsertRequest};
use crate::state::AppState;

/// POST /user: self-declared member profile.
///
/// First call creates the member; later calls update the organizational-unit
/// label only. No credential is checked: any caller claiming a given
/// identifying number is trusted.
pub async fn upsert_member(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MemberUpsertRequest>,
) -> Result<ApiResponse<MemberDto>, ApiError> {
    if payload.student_id.is_empty() {
        return Err(ApiError::validation("student_id is required"));
    }
    if payload.name.is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    if payload.org_unit.is_empty() {
        return Err(ApiError::validation("org_unit is required"));
    }

    let (member, created) = state
        .store
        .upsert_member(&payload.student_id, &payload.name, &payload.org_unit)
        .await?;

    let dto = MemberDto::from(member);
    if created {
        Ok(ApiResponse::created("member profile created", dto))
    } else {
        Ok(ApiResponse::ok("member profile updated", dto))
    }
}
