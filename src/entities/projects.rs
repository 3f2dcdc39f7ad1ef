use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: String,

    pub name: String,

    /// Sequential campaign round number. The "current" project is the one
    /// with the highest value.
    #[sea_orm(unique)]
    pub issue_num: i32,

    pub start_time: DateTime,

    pub deadline: DateTime,

    /// Cached lifecycle status (0 not-started, 1 active, 2 ended).
    /// Must equal the derived function of (now, start_time, deadline)
    /// whenever observed; refreshed on every read path.
    pub status: i32,

    pub participant_count: i32,

    pub admin_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::admins::Entity",
        from = "Column::AdminId",
        to = "super::admins::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Admins,
    #[sea_orm(has_many = "super::questions::Entity")]
    Questions,
    #[sea_orm(has_many = "super::records::Entity")]
    Records,
}

impl Related<super::admins::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admins.def()
    }
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
