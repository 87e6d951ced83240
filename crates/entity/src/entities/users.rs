use sea_orm::entity::prelude::*;

/// A user account in the database.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// The user ID.
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The display name of the user.
    pub name: String,
    /// The external identity hash the account is linked to.
    ///
    /// At most one user holds a given hash. It is only moved from an account to another
    /// by the linking procedure.
    #[sea_orm(unique)]
    pub hash: Option<String>,
    /// The email of the user.
    ///
    /// Accounts with an email are never dispossessed of their hash.
    pub email: Option<String>,
    /// The URL to the avatar of the user.
    pub avatar: Option<String>,
    /// Whether the user has elevated privileges.
    pub admin: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::maps::Entity")]
    Maps,
    #[sea_orm(has_many = "super::mod_log::Entity")]
    ModLog,
}

impl Related<super::maps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Maps.def()
    }
}

impl Related<super::mod_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ModLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
