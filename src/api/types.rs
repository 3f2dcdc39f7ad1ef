use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::entities::{projects, questions};
use crate::services::ranking::{CumulativeEntry, RankedEntry};

/// Uniform response envelope. The HTTP status is mirrored in `code`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub status: &'static str,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            code: 200,
            status: "success",
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            code: 201,
            status: "success",
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_u16(),
            status: "failure",
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Wire format for project timestamps: naive local `YYYY-MM-DD HH:MM:SS`.
pub mod wire_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let value = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&value, FORMAT).map_err(de::Error::custom)
    }
}

#[must_use]
pub fn format_wire_datetime(dt: chrono::NaiveDateTime) -> String {
    dt.format(wire_datetime::FORMAT).to_string()
}

// ============================================================================
// Administrator auth
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminCreatedDto {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPairDto {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub username: String,
}

// ============================================================================
// Members
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MemberUpsertRequest {
    pub student_id: String,
    pub name: String,
    pub org_unit: String,
}

#[derive(Debug, Serialize)]
pub struct MemberDto {
    pub student_id: String,
    pub name: String,
    pub org_unit: String,
}

impl From<crate::entities::members::Model> for MemberDto {
    fn from(model: crate::entities::members::Model) -> Self {
        Self {
            student_id: model.student_id,
            name: model.name,
            org_unit: model.org_unit,
        }
    }
}

/// Query parameter carried by every member-facing read.
#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    pub student_id: String,
}

// ============================================================================
// Projects and questions
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QuestionCreateRequest {
    pub kind: i32,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectCreateRequest {
    pub name: String,
    pub issue_num: i32,
    #[serde(with = "wire_datetime")]
    pub start_time: chrono::NaiveDateTime,
    #[serde(with = "wire_datetime")]
    pub deadline: chrono::NaiveDateTime,
    #[serde(default)]
    pub questions: Vec<QuestionCreateRequest>,
}

#[derive(Debug, Serialize)]
pub struct ProjectCreatedDto {
    pub project_uuid: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionDto {
    pub id: i32,
    pub kind: i32,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub answer: String,
}

impl From<questions::Model> for QuestionDto {
    fn from(model: questions::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            text: model.text,
            option_a: model.option_a,
            option_b: model.option_b,
            option_c: model.option_c,
            option_d: model.option_d,
            answer: model.answer,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailDto {
    pub project_uuid: String,
    pub name: String,
    pub issue_num: i32,
    pub start_time: String,
    pub deadline: String,
    pub status: i32,
    pub participant_count: i32,
    pub questions: Vec<QuestionDto>,
}

impl ProjectDetailDto {
    #[must_use]
    pub fn from_parts(project: projects::Model, questions: Vec<questions::Model>) -> Self {
        Self {
            project_uuid: project.uuid,
            name: project.name,
            issue_num: project.issue_num,
            start_time: format_wire_datetime(project.start_time),
            deadline: format_wire_datetime(project.deadline),
            status: project.status,
            participant_count: project.participant_count,
            questions: questions.into_iter().map(QuestionDto::from).collect(),
        }
    }
}

/// Member view of a project: detail plus the member's own participation.
#[derive(Debug, Serialize)]
pub struct MemberProjectDetailDto {
    #[serde(flatten)]
    pub project: ProjectDetailDto,
    /// 0 not yet submitted, 1 already submitted.
    pub participate_status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_num: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_used_seconds: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProjectSummaryDto {
    pub project_uuid: String,
    pub name: String,
    pub issue_num: i32,
    pub start_time: String,
    pub deadline: String,
    pub status: i32,
    pub participant_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_username: Option<String>,
}

impl ProjectSummaryDto {
    #[must_use]
    pub fn from_model(project: projects::Model, owner_username: Option<String>) -> Self {
        Self {
            project_uuid: project.uuid,
            name: project.name,
            issue_num: project.issue_num,
            start_time: format_wire_datetime(project.start_time),
            deadline: format_wire_datetime(project.deadline),
            status: project.status,
            participant_count: project.participant_count,
            owner_username,
        }
    }
}

/// One entry of a member's participation history.
#[derive(Debug, Serialize)]
pub struct ParticipatedProjectDto {
    pub project_uuid: String,
    pub name: String,
    pub issue_num: i32,
    pub start_time: String,
    pub deadline: String,
    pub status: i32,
    pub correct_num: i32,
    pub time_used_seconds: f64,
}

// ============================================================================
// Submissions
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i32,
    /// Option letters, e.g. "B" or "ABD".
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub student_id: String,
    pub project_uuid: String,
    pub correct_num: i32,
    pub time_used_seconds: f64,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

// ============================================================================
// Rankings
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CurrentRankingDto {
    pub project_uuid: String,
    pub project_name: String,
    pub issue_num: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_username: Option<String>,
    pub self_ranking: Option<RankedEntry>,
    pub ranking: Vec<RankedEntry>,
}

#[derive(Debug, Serialize)]
pub struct CumulativeRankingDto {
    pub self_ranking: Option<CumulativeEntry>,
    pub ranking: Vec<CumulativeEntry>,
}
