use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{StoreError, is_unique_violation};
use crate::entities::{admins, prelude::*, projects, questions, records};

/// Administrator data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: i32,
    pub username: String,
    pub created_at: String,
}

impl From<admins::Model> for Admin {
    fn from(model: admins::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            created_at: model.created_at,
        }
    }
}

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        username: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Admin, StoreError> {
        let password = password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .map_err(|e| StoreError::PasswordHash(e.to_string()))??;

        let active = admins::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = match active.insert(&self.conn).await {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => {
                return Err(StoreError::DuplicateUsername(username.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        info!("Registered administrator '{}'", model.username);
        Ok(Admin::from(model))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Admin>, StoreError> {
        let admin = Admins::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        Ok(admin.map(Admin::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Admin>, StoreError> {
        let admin = Admins::find_by_id(id).one(&self.conn).await?;
        Ok(admin.map(Admin::from))
    }

    /// Verify a password for a username. Argon2 verification is CPU-bound,
    /// so it runs in a blocking task.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Admin>, StoreError> {
        let Some(admin) = Admins::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let password_hash = admin.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let Ok(parsed_hash) = PasswordHash::new(&password_hash) else {
                return false;
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .await
        .map_err(|e| StoreError::PasswordHash(e.to_string()))?;

        Ok(is_valid.then(|| Admin::from(admin)))
    }

    /// Remove an administrator together with every project they own, and the
    /// questions and records under those projects.
    pub async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let txn = self.conn.begin().await?;

        let owned: Vec<String> = Projects::find()
            .filter(projects::Column::AdminId.eq(id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| p.uuid)
            .collect();

        if !owned.is_empty() {
            Records::delete_many()
                .filter(records::Column::ProjectUuid.is_in(owned.clone()))
                .exec(&txn)
                .await?;
            Questions::delete_many()
                .filter(questions::Column::ProjectUuid.is_in(owned.clone()))
                .exec(&txn)
                .await?;
            Projects::delete_many()
                .filter(projects::Column::AdminId.eq(id))
                .exec(&txn)
                .await?;
        }

        let result = Admins::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Removed administrator {} and {} owned projects", id, owned.len());
        }
        Ok(removed)
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, security: &SecurityConfig) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        security.argon2_memory_cost_kib,
        security.argon2_time_cost,
        security.argon2_parallelism,
        None,
    )
    .map_err(|e| StoreError::PasswordHash(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}
