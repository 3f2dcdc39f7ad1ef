use std::path::Path;
use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement};
use thiserror::Error;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{members, projects, questions, records};

pub mod migrator;
pub mod repositories;

pub use repositories::admin::Admin;
pub use repositories::project::{ProjectInput, QuestionInput};

/// Storage-layer failures with the conflict cases carved out so the API
/// boundary can map them onto its error taxonomy.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("issue number {0} already exists")]
    DuplicateIssueNum(i32),

    #[error("duplicate submission")]
    DuplicateSubmission,

    #[error("username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Db(#[from] DbErr),
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self, StoreError> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .map_err(|e| DbErr::Custom(format!("failed to create database file: {e}")))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    fn member_repo(&self) -> repositories::member::MemberRepository {
        repositories::member::MemberRepository::new(self.conn.clone())
    }

    fn project_repo(&self) -> repositories::project::ProjectRepository {
        repositories::project::ProjectRepository::new(self.conn.clone())
    }

    fn record_repo(&self) -> repositories::record::RecordRepository {
        repositories::record::RecordRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Administrators
    // ------------------------------------------------------------------

    pub async fn create_admin(
        &self,
        username: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Admin, StoreError> {
        self.admin_repo().create(username, password, security).await
    }

    /// Returns the admin when the username exists and the password matches.
    pub async fn verify_admin_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Admin>, StoreError> {
        self.admin_repo().verify_credentials(username, password).await
    }

    pub async fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>, StoreError> {
        self.admin_repo().get_by_username(username).await
    }

    pub async fn delete_admin(&self, id: i32) -> Result<bool, StoreError> {
        self.admin_repo().delete(id).await
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    /// Create the member on first contact, update the org-unit label after.
    /// The boolean is true when a new row was created.
    pub async fn upsert_member(
        &self,
        student_id: &str,
        name: &str,
        org_unit: &str,
    ) -> Result<(members::Model, bool), StoreError> {
        self.member_repo().upsert(student_id, name, org_unit).await
    }

    pub async fn get_member(&self, student_id: &str) -> Result<Option<members::Model>, StoreError> {
        self.member_repo().get(student_id).await
    }

    pub async fn list_members(&self) -> Result<Vec<members::Model>, StoreError> {
        self.member_repo().list().await
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub async fn create_project(
        &self,
        admin_id: i32,
        input: ProjectInput,
    ) -> Result<String, StoreError> {
        self.project_repo().create(admin_id, input).await
    }

    /// Full replace under the same uuid, transactionally. Returns false when
    /// the project does not exist.
    pub async fn replace_project(
        &self,
        uuid: &str,
        admin_id: i32,
        input: ProjectInput,
    ) -> Result<bool, StoreError> {
        self.project_repo().replace(uuid, admin_id, input).await
    }

    /// Fetch with the lifecycle status refreshed (write-through).
    pub async fn get_project(&self, uuid: &str) -> Result<Option<projects::Model>, StoreError> {
        self.project_repo().get(uuid).await
    }

    /// The current campaign round: highest issue number, status refreshed.
    pub async fn latest_project(&self) -> Result<Option<projects::Model>, StoreError> {
        self.project_repo().latest().await
    }

    pub async fn list_projects_for_admin(
        &self,
        admin_id: i32,
    ) -> Result<Vec<projects::Model>, StoreError> {
        self.project_repo().list_for_admin(admin_id).await
    }

    /// Projects whose refreshed status is active or ended, with the owning
    /// administrator's username.
    pub async fn list_started_projects(
        &self,
    ) -> Result<Vec<(projects::Model, Option<String>)>, StoreError> {
        self.project_repo().list_started().await
    }

    pub async fn delete_project(&self, uuid: &str) -> Result<bool, StoreError> {
        self.project_repo().delete(uuid).await
    }

    pub async fn questions_for_project(
        &self,
        uuid: &str,
    ) -> Result<Vec<questions::Model>, StoreError> {
        self.project_repo().questions(uuid).await
    }

    pub async fn admin_username(&self, admin_id: i32) -> Result<Option<String>, StoreError> {
        self.admin_repo().get_by_id(admin_id).await.map(|admin| admin.map(|a| a.username))
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    pub async fn find_record(
        &self,
        student_id: &str,
        project_uuid: &str,
    ) -> Result<Option<records::Model>, StoreError> {
        self.record_repo().find(student_id, project_uuid).await
    }

    /// Record one submission and bump the project's participant counter in a
    /// single transaction. Validity comes from the project's (already
    /// refreshed) status at submission time.
    pub async fn submit_record(
        &self,
        project: &projects::Model,
        student_id: &str,
        answers: String,
        correct_num: i32,
        time_used_seconds: f64,
    ) -> Result<records::Model, StoreError> {
        self.record_repo()
            .submit(project, student_id, answers, correct_num, time_used_seconds)
            .await
    }

    pub async fn valid_records_for_project(
        &self,
        project_uuid: &str,
    ) -> Result<Vec<(records::Model, Option<members::Model>)>, StoreError> {
        self.record_repo().valid_for_project(project_uuid).await
    }

    pub async fn records_for_member(
        &self,
        student_id: &str,
    ) -> Result<Vec<(records::Model, Option<projects::Model>)>, StoreError> {
        self.record_repo().for_member(student_id).await
    }

    pub async fn all_valid_records(&self) -> Result<Vec<records::Model>, StoreError> {
        self.record_repo().all_valid().await
    }
}
