use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use crate::db::{StoreError, is_unique_violation};
use crate::entities::{members, prelude::*, projects, records};
use crate::services::lifecycle::ProjectStatus;

pub struct RecordRepository {
    conn: DatabaseConnection,
}

impl RecordRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find(
        &self,
        student_id: &str,
        project_uuid: &str,
    ) -> Result<Option<records::Model>, StoreError> {
        Ok(Records::find()
            .filter(records::Column::StudentId.eq(student_id))
            .filter(records::Column::ProjectUuid.eq(project_uuid))
            .one(&self.conn)
            .await?)
    }

    /// Persist one submission and bump the participant counter in a single
    /// transaction. The existence check is only the fast path; the unique
    /// index on (student_id, project_uuid) catches the concurrent-duplicate
    /// race and is reported as the same conflict.
    pub async fn submit(
        &self,
        project: &projects::Model,
        student_id: &str,
        answers: String,
        correct_num: i32,
        time_used_seconds: f64,
    ) -> Result<records::Model, StoreError> {
        if self.find(student_id, &project.uuid).await?.is_some() {
            return Err(StoreError::DuplicateSubmission);
        }

        // A submission against an already-ended project is stored but never
        // counts toward either leaderboard.
        let valid = ProjectStatus::from_i32(project.status) != ProjectStatus::Ended;

        let txn = self.conn.begin().await?;

        let active = records::ActiveModel {
            student_id: Set(student_id.to_string()),
            project_uuid: Set(project.uuid.clone()),
            answers: Set(answers),
            correct_num: Set(correct_num),
            time_used_seconds: Set(time_used_seconds),
            valid: Set(valid),
            ..Default::default()
        };

        let inserted = match active.insert(&txn).await {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => {
                return Err(StoreError::DuplicateSubmission);
            }
            Err(err) => return Err(err.into()),
        };

        Projects::update_many()
            .col_expr(
                projects::Column::ParticipantCount,
                Expr::col(projects::Column::ParticipantCount).add(1),
            )
            .filter(projects::Column::Uuid.eq(&project.uuid))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(
            "Recorded submission from '{}' for project {} (valid: {})",
            student_id, project.uuid, valid
        );
        Ok(inserted)
    }

    /// Valid submissions for one project, joined with their members, in
    /// submission order (ascending id).
    pub async fn valid_for_project(
        &self,
        project_uuid: &str,
    ) -> Result<Vec<(records::Model, Option<members::Model>)>, StoreError> {
        Ok(Records::find()
            .filter(records::Column::ProjectUuid.eq(project_uuid))
            .filter(records::Column::Valid.eq(true))
            .order_by_asc(records::Column::Id)
            .find_also_related(Members)
            .all(&self.conn)
            .await?)
    }

    /// Every submission a member has made, with the project it belongs to.
    pub async fn for_member(
        &self,
        student_id: &str,
    ) -> Result<Vec<(records::Model, Option<projects::Model>)>, StoreError> {
        Ok(Records::find()
            .filter(records::Column::StudentId.eq(student_id))
            .order_by_asc(records::Column::Id)
            .find_also_related(Projects)
            .all(&self.conn)
            .await?)
    }

    pub async fn all_valid(&self) -> Result<Vec<records::Model>, StoreError> {
        Ok(Records::find()
            .filter(records::Column::Valid.eq(true))
            .order_by_asc(records::Column::Id)
            .all(&self.conn)
            .await?)
    }
}
