use sea_orm::entity::prelude::*;

use crate::types::DifficultyTier;

/// A difficulty of a map.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "difficulties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The ID of the map containing this difficulty.
    pub map_id: i32,
    /// The tier of the difficulty.
    ///
    /// Old maps may have untagged difficulties.
    pub difficulty: Option<DifficultyTier>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::maps::Entity",
        from = "Column::MapId",
        to = "super::maps::Column::Id",
        on_update = "Restrict",
        on_delete = "Cascade"
    )]
    Maps,
}

impl Related<super::maps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Maps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
