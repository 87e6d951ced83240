use sea_orm::entity::prelude::*;

/// A map uploaded by a user.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "maps")]
pub struct Model {
    /// The map ID.
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The name of the map.
    pub name: String,
    /// The ID of the user who owns the map.
    pub uploader: i32,
    /// The amount of up-votes of the map.
    pub upvotes: i32,
    /// The amount of down-votes of the map.
    pub downvotes: i32,
    /// The computed score of the map, between 0 and 1.
    #[sea_orm(column_type = "Decimal(Some((6, 4)))")]
    pub score: Decimal,
    /// The duration of the map, in seconds.
    pub duration: i32,
    /// The tempo of the map, in beats per minute.
    pub bpm: f64,
    /// When the map was uploaded.
    pub uploaded_at: DateTime,
    /// When the map was deleted.
    ///
    /// Deleted maps are kept in the database but don't count in the stats of their uploader.
    pub deleted_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::Uploader",
        to = "super::users::Column::Id",
        on_update = "Restrict",
        on_delete = "Restrict"
    )]
    Users,
    #[sea_orm(has_many = "super::difficulties::Entity")]
    Difficulties,
    #[sea_orm(has_many = "super::mod_log::Entity")]
    ModLog,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::difficulties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Difficulties.def()
    }
}

impl Related<super::mod_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ModLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
