use chrono::{Local, NaiveDateTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::db::{StoreError, is_unique_violation};
use crate::entities::{prelude::*, projects, questions, records};
use crate::services::lifecycle::ProjectStatus;

/// Everything needed to materialize one project and its question set.
#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub name: String,
    pub issue_num: i32,
    pub start_time: NaiveDateTime,
    pub deadline: NaiveDateTime,
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Clone)]
pub struct QuestionInput {
    pub kind: i32,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub answer: String,
}

pub struct ProjectRepository {
    conn: DatabaseConnection,
}

impl ProjectRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Write-through status refresh: recompute the lifecycle status from the
    /// clock and persist it before the row is used to build any response.
    pub async fn refresh_status(
        &self,
        project: projects::Model,
    ) -> Result<projects::Model, StoreError> {
        let now = Local::now().naive_local();
        let truth = ProjectStatus::derive(now, project.start_time, project.deadline);
        if truth.as_i32() == project.status {
            return Ok(project);
        }

        let mut active: projects::ActiveModel = project.into();
        active.status = Set(truth.as_i32());
        Ok(active.update(&self.conn).await?)
    }

    pub async fn create(&self, admin_id: i32, input: ProjectInput) -> Result<String, StoreError> {
        let uuid = Uuid::new_v4().to_string();

        let txn = self.conn.begin().await?;
        insert_project_tree(&txn, &uuid, admin_id, input).await?;
        txn.commit().await?;

        info!("Created project {}", uuid);
        Ok(uuid)
    }

    /// Full replace: drop the whole tree and recreate it under the same
    /// uuid. Rolls back (project intact) when the new issue number collides
    /// with another project.
    pub async fn replace(
        &self,
        uuid: &str,
        admin_id: i32,
        input: ProjectInput,
    ) -> Result<bool, StoreError> {
        let txn = self.conn.begin().await?;

        if Projects::find_by_id(uuid).one(&txn).await?.is_none() {
            return Ok(false);
        }

        Records::delete_many()
            .filter(records::Column::ProjectUuid.eq(uuid))
            .exec(&txn)
            .await?;
        Questions::delete_many()
            .filter(questions::Column::ProjectUuid.eq(uuid))
            .exec(&txn)
            .await?;
        Projects::delete_by_id(uuid).exec(&txn).await?;

        insert_project_tree(&txn, uuid, admin_id, input).await?;
        txn.commit().await?;

        info!("Replaced project {}", uuid);
        Ok(true)
    }

    pub async fn get(&self, uuid: &str) -> Result<Option<projects::Model>, StoreError> {
        match Projects::find_by_id(uuid).one(&self.conn).await? {
            Some(project) => Ok(Some(self.refresh_status(project).await?)),
            None => Ok(None),
        }
    }

    pub async fn latest(&self) -> Result<Option<projects::Model>, StoreError> {
        match Projects::find()
            .order_by_desc(projects::Column::IssueNum)
            .one(&self.conn)
            .await?
        {
            Some(project) => Ok(Some(self.refresh_status(project).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_for_admin(&self, admin_id: i32) -> Result<Vec<projects::Model>, StoreError> {
        let rows = Projects::find()
            .filter(projects::Column::AdminId.eq(admin_id))
            .order_by_asc(projects::Column::IssueNum)
            .all(&self.conn)
            .await?;

        let mut refreshed = Vec::with_capacity(rows.len());
        for project in rows {
            refreshed.push(self.refresh_status(project).await?);
        }
        Ok(refreshed)
    }

    /// All projects whose refreshed status is past not-started, paired with
    /// the owning administrator's username.
    pub async fn list_started(
        &self,
    ) -> Result<Vec<(projects::Model, Option<String>)>, StoreError> {
        let rows = Projects::find()
            .find_also_related(Admins)
            .order_by_asc(projects::Column::IssueNum)
            .all(&self.conn)
            .await?;

        let mut started = Vec::new();
        for (project, admin) in rows {
            let project = self.refresh_status(project).await?;
            if project.status > ProjectStatus::NotStarted.as_i32() {
                started.push((project, admin.map(|a| a.username)));
            }
        }
        Ok(started)
    }

    pub async fn delete(&self, uuid: &str) -> Result<bool, StoreError> {
        let txn = self.conn.begin().await?;

        Records::delete_many()
            .filter(records::Column::ProjectUuid.eq(uuid))
            .exec(&txn)
            .await?;
        Questions::delete_many()
            .filter(questions::Column::ProjectUuid.eq(uuid))
            .exec(&txn)
            .await?;
        let result = Projects::delete_by_id(uuid).exec(&txn).await?;

        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Removed project {}", uuid);
        }
        Ok(removed)
    }

    pub async fn questions(&self, uuid: &str) -> Result<Vec<questions::Model>, StoreError> {
        Ok(Questions::find()
            .filter(questions::Column::ProjectUuid.eq(uuid))
            .order_by_asc(questions::Column::Id)
            .all(&self.conn)
            .await?)
    }
}

async fn insert_project_tree(
    txn: &DatabaseTransaction,
    uuid: &str,
    admin_id: i32,
    input: ProjectInput,
) -> Result<(), StoreError> {
    let now = Local::now().naive_local();
    let status = ProjectStatus::derive(now, input.start_time, input.deadline);
    let issue_num = input.issue_num;

    let project = projects::ActiveModel {
        uuid: Set(uuid.to_string()),
        name: Set(input.name),
        issue_num: Set(issue_num),
        start_time: Set(input.start_time),
        deadline: Set(input.deadline),
        status: Set(status.as_i32()),
        participant_count: Set(0),
        admin_id: Set(admin_id),
    };

    if let Err(err) = Projects::insert(project).exec(txn).await {
        if is_unique_violation(&err) {
            return Err(StoreError::DuplicateIssueNum(issue_num));
        }
        return Err(err.into());
    }

    if !input.questions.is_empty() {
        let question_models = input.questions.into_iter().map(|q| questions::ActiveModel {
            kind: Set(q.kind),
            text: Set(q.text),
            option_a: Set(q.option_a),
            option_b: Set(q.option_b),
            option_c: Set(q.option_c),
            option_d: Set(q.option_d),
            answer: Set(q.answer),
            project_uuid: Set(uuid.to_string()),
            ..Default::default()
        });
        Questions::insert_many(question_models).exec(txn).await?;
    }

    Ok(())
}
