use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::info;

use crate::db::StoreError;
use crate::entities::{members, prelude::*};

pub struct MemberRepository {
    conn: DatabaseConnection,
}

impl MemberRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, student_id: &str) -> Result<Option<members::Model>, StoreError> {
        Ok(Members::find_by_id(student_id).one(&self.conn).await?)
    }

    /// First contact creates the member; later calls only move the
    /// organizational-unit label. The identifying number and display name
    /// are immutable after creation.
    pub async fn upsert(
        &self,
        student_id: &str,
        name: &str,
        org_unit: &str,
    ) -> Result<(members::Model, bool), StoreError> {
        match Members::find_by_id(student_id).one(&self.conn).await? {
            None => {
                let active = members::ActiveModel {
                    student_id: Set(student_id.to_string()),
                    name: Set(name.to_string()),
                    org_unit: Set(org_unit.to_string()),
                };
                let model = active.insert(&self.conn).await?;
                info!("Created member '{}' in unit '{}'", student_id, org_unit);
                Ok((model, true))
            }
            Some(existing) => {
                let mut active: members::ActiveModel = existing.into();
                active.org_unit = Set(org_unit.to_string());
                let model = active.update(&self.conn).await?;
                Ok((model, false))
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<members::Model>, StoreError> {
        Ok(Members::find()
            .order_by_asc(members::Column::StudentId)
            .all(&self.conn)
            .await?)
    }
}
