use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub student_id: String,

    pub project_uuid: String,

    /// Submitted answer set, stored verbatim as serialized JSON.
    pub answers: String,

    /// Client-reported correct-answer count. Not verified server-side.
    pub correct_num: i32,

    pub time_used_seconds: f64,

    /// False iff the project had already ended at submission time.
    /// Invalid records are excluded from both rankings.
    pub valid: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::StudentId",
        to = "super::members::Column::StudentId",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Members,
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectUuid",
        to = "super::projects::Column::Uuid",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Projects,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
