use sea_orm::entity::prelude::*;

/// The kind of a moderation action made on a map.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    serde::Serialize,
    serde::Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum ModLogKind {
    /// The map was put back to the private state.
    #[sea_orm(num_value = 0)]
    Unpublish,
    /// The map was deleted.
    #[sea_orm(num_value = 1)]
    Delete,
    /// The information of the map (name, description, tags) was edited.
    #[sea_orm(num_value = 2)]
    InfoEdit,
    /// The difficulties of the map were reclassified.
    #[sea_orm(num_value = 3)]
    Reclassify,
    /// A deleted map was restored.
    #[sea_orm(num_value = 4)]
    Revive,
}

impl ModLogKind {
    /// The kinds of actions the uploader of a map is alerted about.
    pub const ALERTS: [Self; 2] = [Self::Unpublish, Self::Delete];
}
